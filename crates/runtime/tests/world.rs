use std::time::Duration;

use creature_content::{ContentBundle, ContentFactory};
use creature_core::{
    ControlError, CreatureEvent, EntityId, Location, MapId, OrderType, PcgRng, Point3D,
    RemovalReason, RngOracle, SandboxEnv, SandboxMobile, ScriptedRng, SpeechOutcome,
};
use creature_runtime::{
    CreatureRepository, FileCreatureRepository, InMemoryCreatureRepo, RuntimeError, World,
    WorldContent,
};
use tempfile::TempDir;

const MASTER: EntityId = EntityId(1);
const BARD: EntityId = EntityId(2);
const FIRST_ID: u32 = 1000;

fn at(x: i32, y: i32) -> Location {
    Location::new(MapId::TRAMMEL, Point3D::new(x, y, 0))
}

fn bundle() -> ContentBundle {
    ContentFactory::bundled().load_all().unwrap()
}

fn env(master_followers: u32) -> SandboxEnv {
    let mut env = SandboxEnv::new();
    env.insert(SandboxMobile::player(MASTER, at(100, 100)).with_followers(master_followers, 5));
    env.insert(SandboxMobile::player(BARD, at(90, 90)));
    env
}

fn world_with(env: SandboxEnv, bundle: ContentBundle, rng: impl RngOracle + 'static) -> World<SandboxEnv> {
    World::new(env, WorldContent::from_bundle(bundle), Box::new(rng), FIRST_ID)
}

fn world(env: SandboxEnv) -> World<SandboxEnv> {
    world_with(env, bundle(), PcgRng::new(7))
}

fn followers(world: &World<SandboxEnv>) -> u32 {
    world.env().get(MASTER).unwrap().followers.current
}

#[test]
fn spawn_rejects_unknown_species() {
    let mut world = world(env(0));
    let err = world.spawn("unicorn", at(0, 0)).unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownSpecies { key } if key == "unicorn"));
    assert!(world.is_empty());
}

#[test]
fn summon_expiry_returns_follower_slots() {
    let mut world = world(env(0));
    let wolf = world
        .summon("grey_wolf", MASTER, true, Duration::from_secs(30), at(101, 100))
        .unwrap();
    assert_eq!(world.get(wolf).unwrap().summon_master(), Some(MASTER));
    assert_eq!(followers(&world), 1);

    let early = world.advance(Duration::from_secs(20));
    assert!(early.removed.is_empty());

    let report = world.advance(Duration::from_secs(11));
    assert_eq!(report.removed, vec![(wolf, RemovalReason::Unsummoned)]);
    assert!(world.get(wolf).is_none());
    assert_eq!(followers(&world), 0);
    assert_eq!(world.pending_tasks(), 0);
}

#[test]
fn failed_summon_leaves_nothing_behind() {
    let mut world = world(env(5));
    let err = world
        .summon("grey_wolf", MASTER, true, Duration::from_secs(30), at(101, 100))
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Control(ControlError::TooManyFollowers { .. })
    ));
    assert!(world.is_empty());
    assert_eq!(followers(&world), 5);
}

#[test]
fn loyalty_decays_on_the_upkeep_interval() {
    let mut bundle = bundle();
    bundle.config.loyalty.decay_interval_ms = 60_000;
    let mut world = world_with(env(0), bundle, PcgRng::new(11));
    let horse = world.spawn("horse", at(101, 100)).unwrap();
    world.tame(horse, MASTER).unwrap();
    assert_eq!(world.get(horse).unwrap().loyalty(), 100);

    let quiet = world.advance(Duration::from_secs(59));
    assert_eq!(world.get(horse).unwrap().loyalty(), 100);
    assert!(!quiet.events.iter().any(|e| matches!(e, CreatureEvent::LoyaltyChanged { .. })));

    let report = world.advance(Duration::from_secs(2));
    assert_eq!(world.get(horse).unwrap().loyalty(), 90);
    assert!(report.events.contains(&CreatureEvent::LoyaltyChanged {
        creature: horse,
        loyalty: 90,
    }));
}

#[test]
fn killing_blow_removes_the_creature() {
    let mut world = world(env(0));
    let bat = world.spawn("mongbat", at(120, 120)).unwrap();

    assert!(world.damage(bat, 1_000, Some(MASTER)).unwrap());
    assert!(!world.get(bat).unwrap().is_alive());

    let report = world.advance(Duration::from_millis(100));
    assert_eq!(report.removed, vec![(bat, RemovalReason::Died)]);
    assert!(world.get(bat).is_none());
    assert!(matches!(
        world.damage(bat, 1, None),
        Err(RuntimeError::UnknownCreature { id }) if id == bat
    ));
}

#[test]
fn provoked_creatures_fight_each_other() {
    let mut world = world(env(0));
    let wolf = world.spawn("grey_wolf", at(50, 50)).unwrap();
    let bat = world.spawn("mongbat", at(51, 50)).unwrap();

    assert!(world.provoke(wolf, bat, BARD, true).unwrap());
    assert_eq!(world.get(wolf).unwrap().combatant(), Some(bat));
    assert_eq!(world.get(bat).unwrap().combatant(), Some(wolf));

    let report = world.advance(Duration::from_secs(10));
    assert!(report.removed.contains(&(bat, RemovalReason::Died)), "{report:?}");
    assert!(world.get(wolf).unwrap().is_alive());
}

#[test]
fn spoken_orders_reach_pets() {
    let mut world = world_with(env(0), bundle(), ScriptedRng::constant(0.0));
    let wolf = world.spawn("grey_wolf", at(101, 100)).unwrap();
    let wild = world.spawn("grey_wolf", at(102, 100)).unwrap();
    world.tame(wolf, MASTER).unwrap();

    let heard = world.speak(MASTER, "all stay");
    assert_eq!(heard, vec![(wolf, SpeechOutcome::Obeyed(OrderType::Stay))]);
    assert_eq!(world.get(wolf).unwrap().control_order(), OrderType::Stay);
    assert_eq!(world.get(wild).unwrap().control_order(), OrderType::None);

    assert!(world.command(wolf, OrderType::Attack, Some(wild), MASTER).unwrap());
    assert_eq!(world.get(wolf).unwrap().control_target(), Some(wild));
    assert!(!world.command(wolf, OrderType::Stop, None, BARD).unwrap());
}

#[test]
fn feeding_uses_the_food_table() {
    let mut world = world_with(env(0), bundle(), ScriptedRng::constant(0.0));
    let horse = world.spawn("horse", at(101, 100)).unwrap();
    world.tame(horse, MASTER).unwrap();

    assert!(!world.feed(horse, MASTER, "raw_ribs", 1).unwrap());
    assert!(world.feed(horse, MASTER, "carrot", 1).unwrap());
    assert!(!world.feed(horse, BARD, "carrot", 1).unwrap());
}

fn save_then_load(repo: &dyn CreatureRepository) {
    let mut world = world(env(0));
    let wolf = world.spawn("grey_wolf", at(101, 100)).unwrap();
    let dragon = world.spawn("dragon", at(200, 200)).unwrap();
    world.tame(wolf, MASTER).unwrap();
    world.advance(Duration::from_secs(5));
    let saved_hits = world.get(dragon).unwrap().hits();
    assert_eq!(world.save_to(repo).unwrap(), 2);

    let mut restored = world_with(env(0), bundle(), PcgRng::new(8));
    let summary = restored.load_from(repo).unwrap();
    assert_eq!(summary.loaded, vec![wolf, dragon]);
    assert!(summary.failed.is_empty());
    assert!(summary.skipped_spells.is_empty());

    let pet = restored.get(wolf).unwrap();
    assert_eq!(pet.control_master(), Some(MASTER));
    assert_eq!(pet.species(), "grey_wolf");
    assert_eq!(restored.get(dragon).unwrap().hits(), saved_hits);
    assert_eq!(followers(&restored), 1, "follower slots are charged again");

    let fresh = restored.spawn("mongbat", at(0, 0)).unwrap();
    assert!(fresh > dragon);
}

#[test]
fn save_and_load_through_memory() {
    save_then_load(&InMemoryCreatureRepo::new());
}

#[test]
fn save_and_load_through_files() {
    let dir = TempDir::new().unwrap();
    let repo = FileCreatureRepository::new(dir.path()).unwrap();
    save_then_load(&repo);
    assert_eq!(repo.list_ids().unwrap().len(), 2);
}

#[test]
fn unreadable_records_are_reported_and_skipped() {
    let repo = InMemoryCreatureRepo::new();
    let mut world = world(env(0));
    let wolf = world.spawn("grey_wolf", at(101, 100)).unwrap();
    world.save_to(&repo).unwrap();
    repo.save(EntityId(5000), &[0xFF, 0x01]).unwrap();

    let mut restored = world_with(env(0), bundle(), PcgRng::new(1));
    let summary = restored.load_from(&repo).unwrap();
    assert_eq!(summary.loaded, vec![wolf]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, EntityId(5000));
    assert!(restored.get(EntityId(5000)).is_none());
}

#[test]
fn saving_drops_records_of_departed_creatures() {
    let repo = InMemoryCreatureRepo::new();
    let mut world = world(env(0));
    let wolf = world.spawn("grey_wolf", at(101, 100)).unwrap();
    let bat = world.spawn("mongbat", at(140, 140)).unwrap();
    world.save_to(&repo).unwrap();

    world.delete(bat).unwrap();
    world.save_to(&repo).unwrap();
    assert_eq!(repo.list_ids().unwrap(), vec![wolf]);
}
