use std::sync::Arc;

use creature_content::ContentFactory;
use creature_core::{CreatureEvent, EntityId, Location, MapId, Point3D, SandboxEnv, SandboxMobile};
use creature_runtime::{
    CreatureRepository, Event, InMemoryCreatureRepo, Runtime, RuntimeConfig, RuntimeError, Topic,
    WorldEvent,
};

const MASTER: EntityId = EntityId(1);

fn at(x: i32, y: i32) -> Location {
    Location::new(MapId::TRAMMEL, Point3D::new(x, y, 0))
}

fn build(repo: Arc<InMemoryCreatureRepo>) -> Runtime {
    let mut env = SandboxEnv::new();
    env.insert(SandboxMobile::player(MASTER, at(10, 10)));
    Runtime::builder()
        .config(RuntimeConfig {
            rng_seed: Some(42),
            ..RuntimeConfig::default()
        })
        .content(ContentFactory::bundled().load_all().unwrap())
        .repository(repo)
        .build(env)
        .unwrap()
}

#[tokio::test]
async fn handle_drives_the_world() {
    let repo = Arc::new(InMemoryCreatureRepo::new());
    let runtime = build(Arc::clone(&repo));
    let handle = runtime.handle();
    let mut creature_events = handle.subscribe(Topic::Creature);
    let mut world_events = handle.subscribe(Topic::World);

    let horse = handle.spawn("horse", at(11, 10)).await.unwrap();
    assert_eq!(
        world_events.recv().await.unwrap(),
        Event::World(WorldEvent::CreatureSpawned {
            creature: horse,
            species: "horse".into(),
        })
    );

    handle.tame(horse, MASTER).await.unwrap();
    let tamed = Event::Creature(CreatureEvent::Tamed {
        creature: horse,
        master: MASTER,
    });
    let mut seen = Vec::new();
    while let Ok(event) = creature_events.try_recv() {
        seen.push(event);
    }
    assert!(seen.contains(&tamed), "{seen:?}");

    let report = runtime.step().await.unwrap();
    assert_eq!(report.now.as_millis(), 250);
    assert!(matches!(
        world_events.recv().await.unwrap(),
        Event::World(WorldEvent::TickCompleted { .. })
    ));

    let snapshot = handle.query_creature(horse).await.unwrap().unwrap();
    assert_eq!(snapshot.control_master(), Some(MASTER));
    assert_eq!(handle.list_creatures().await.unwrap(), vec![horse]);

    assert_eq!(handle.save().await.unwrap(), 1);
    assert_eq!(repo.list_ids().unwrap(), vec![horse]);

    drop(handle);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn errors_travel_back_to_the_caller() {
    let runtime = build(Arc::new(InMemoryCreatureRepo::new()));
    let handle = runtime.handle();

    let err = handle.spawn("basilisk", at(0, 0)).await.unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownSpecies { .. }));

    let err = handle.release(EntityId(9_999)).await.unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownCreature { .. }));

    let reports = runtime.run_for(4).await.unwrap();
    assert_eq!(reports.last().unwrap().now.as_millis(), 1_000);

    drop(handle);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn builder_requires_content() {
    let err = Runtime::builder().build(SandboxEnv::new()).err().unwrap();
    assert!(matches!(err, RuntimeError::MissingContent));
}

#[tokio::test]
async fn saved_creatures_load_into_a_fresh_runtime() {
    let repo = Arc::new(InMemoryCreatureRepo::new());

    let first = build(Arc::clone(&repo));
    let handle = first.handle();
    let wolf = handle.spawn("grey_wolf", at(12, 10)).await.unwrap();
    first.run_for(2).await.unwrap();
    assert_eq!(handle.save().await.unwrap(), 1);
    drop(handle);
    first.shutdown().await.unwrap();

    let second = build(Arc::clone(&repo));
    let handle = second.handle();
    let mut world_events = handle.subscribe(Topic::World);
    let summary = handle.load().await.unwrap();
    assert_eq!(summary.loaded, vec![wolf]);
    assert!(summary.failed.is_empty());
    assert!(matches!(
        world_events.recv().await.unwrap(),
        Event::World(WorldEvent::Loaded { loaded: 1, failed: 0 })
    ));
    assert_eq!(handle.list_creatures().await.unwrap(), vec![wolf]);

    let fresh = handle.spawn("grey_wolf", at(14, 10)).await.unwrap();
    assert!(fresh > wolf);

    drop(handle);
    second.shutdown().await.unwrap();
}
