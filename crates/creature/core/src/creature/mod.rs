//! The creature record.
//!
//! [`Creature`] owns every piece of mutable state the engine tracks for a
//! non-player mobile. Behaviour is spread across the sibling modules as
//! `impl Creature` blocks:
//!
//! - [`crate::control`]: ownership transitions and follower accounting
//! - [`crate::loyalty`]: control chance, loyalty decay, feeding
//! - [`crate::combat`]: aggression, damage log, looting rights, rewards
//! - [`crate::think`]: the per-tick sub-behaviour multiplexer
//! - [`crate::persist`]: versioned save records
//!
//! Masters, targets and spawners are referenced by [`EntityId`] only.
mod food;
mod setup;
mod template;

pub use food::{FoodTable, FoodType};
pub use template::{RollRange, SkillRange, SpeciesOracle, SpeciesTemplate, SpeciesTraits};

use std::sync::Arc;

use arrayvec::ArrayVec;

use crate::ai::AiKind;
use crate::combat::{DamageLog, FightMode};
use crate::config::EngineConfig;
use crate::control::{Allegiance, BardState, ControlState};
use crate::env::{CreatureTraits, MobileInfo};
use crate::events::RemovalReason;
use crate::schedule::TaskId;
use crate::spell::SpellKey;
use crate::state::{EntityId, GameTime, Location, MapId, Point3D};
use crate::stats::{
    CoreStats, DamageRange, ResourceKind, ResourceSeeds, Resources, Skills, StatKind,
    StatModifiers, effective_cap,
};
use crate::think::{BreathSequence, HealSequence};

/// Think cadence in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Speeds {
    pub active: f64,
    pub passive: f64,
    pub current: f64,
}

/// Next time each throttled behaviour may run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Cooldowns {
    pub next_reacquire: GameTime,
    pub next_heal: GameTime,
    pub next_heal_owner: GameTime,
    pub next_breath: GameTime,
    pub next_aura: GameTime,
    pub next_rummage: GameTime,
}

/// Spawner that placed the creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnerLink {
    pub id: EntityId,
    pub map: MapId,
    pub unlink_on_taming: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpellBook {
    pub attack: Vec<SpellKey>,
    pub defense: Vec<SpellKey>,
}

/// Timers that end or reset the creature's life in the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LifetimeTimers {
    pub unsummon: Option<TaskId>,
    pub delete: Option<(TaskId, GameTime)>,
    pub return_home: Option<TaskId>,
}

pub type OwnerList = ArrayVec<EntityId, { EngineConfig::MAX_OWNERS }>;
pub type FriendList = ArrayVec<EntityId, { EngineConfig::MAX_FRIENDS }>;

#[derive(Clone, Debug)]
pub struct Creature {
    pub(crate) id: EntityId,
    pub(crate) species: String,
    pub(crate) template: Arc<SpeciesTemplate>,
    pub name: String,
    pub(crate) location: Location,
    pub(crate) alive: bool,
    pub(crate) deleted: bool,
    pub(crate) removal: Option<RemovalReason>,

    pub(crate) stats: CoreStats,
    pub(crate) modifiers: StatModifiers,
    pub(crate) seeds: ResourceSeeds,
    pub(crate) resources: Resources,
    pub(crate) skills: Skills,
    pub(crate) damage: DamageRange,
    pub(crate) fame: i32,
    pub(crate) karma: i32,
    pub(crate) poison: Option<u8>,

    pub(crate) current_ai: AiKind,
    pub(crate) default_ai: AiKind,
    pub(crate) fight_mode: FightMode,
    pub(crate) range_perception: i32,
    pub(crate) range_fight: i32,
    pub(crate) speeds: Speeds,
    pub(crate) team: i32,

    pub(crate) home: Option<Point3D>,
    pub(crate) range_home: i32,
    pub(crate) seeks_home: bool,
    pub(crate) return_queued: bool,
    pub(crate) homing_failures: u32,

    pub(crate) loyalty: i32,
    pub(crate) allegiance: Allegiance,
    pub(crate) control: ControlState,
    pub(crate) bard: BardState,
    pub(crate) owners: OwnerList,
    pub(crate) friends: FriendList,
    pub(crate) tamable: bool,
    pub(crate) min_tame_skill: f64,
    pub(crate) abandoned: bool,
    pub(crate) stabled: bool,

    pub(crate) generated_loot: bool,
    pub(crate) cooldowns: Cooldowns,
    pub(crate) combatant: Option<EntityId>,
    pub(crate) warmode: bool,
    pub(crate) aggressors: Vec<EntityId>,
    pub(crate) flee_until: Option<GameTime>,
    pub(crate) idle_until: Option<GameTime>,
    pub(crate) stalled_until: GameTime,
    pub(crate) next_swing: GameTime,
    pub(crate) damage_log: DamageLog,

    pub(crate) remove_step: u32,
    pub(crate) remove_if_untamed: bool,
    pub(crate) spawner: Option<SpawnerLink>,
    pub(crate) waypoint: Option<EntityId>,
    pub(crate) corpse_name: Option<String>,
    pub(crate) spells: SpellBook,

    pub(crate) breath: BreathSequence,
    pub(crate) heal: HealSequence,
    pub(crate) timers: LifetimeTimers,
}

impl Creature {
    /// Builds a creature with the template's defaults and minimum stats.
    ///
    /// Nothing is rolled; use [`Creature::spawn`] for a fresh creature or
    /// let the save codec overwrite the fields it restores.
    pub fn from_template(
        id: EntityId,
        species: &str,
        template: Arc<SpeciesTemplate>,
        location: Location,
        now: GameTime,
        config: &EngineConfig,
    ) -> Self {
        let t = &*template;
        let stats = CoreStats::new(t.str.min, t.dex.min, t.int.min);
        let mut creature = Self {
            id,
            species: species.to_owned(),
            name: t.name.clone(),
            location,
            alive: true,
            deleted: false,
            removal: None,
            stats,
            modifiers: StatModifiers::new(),
            seeds: ResourceSeeds::default(),
            resources: Resources::default(),
            skills: Skills::new(),
            damage: DamageRange::new(t.damage.min, t.damage.max),
            fame: t.fame,
            karma: t.karma,
            poison: None,
            current_ai: t.ai,
            default_ai: t.ai,
            fight_mode: t.fight_mode,
            range_perception: t.range_perception,
            range_fight: t.range_fight,
            speeds: Speeds {
                active: t.active_speed,
                passive: t.passive_speed,
                current: t.passive_speed,
            },
            team: t.team,
            home: None,
            range_home: t.range_home,
            seeks_home: t.seeks_home,
            return_queued: false,
            homing_failures: 0,
            loyalty: EngineConfig::MAX_LOYALTY,
            allegiance: Allegiance::Wild,
            control: ControlState::new(t.control_slots),
            bard: BardState::default(),
            owners: OwnerList::new(),
            friends: FriendList::new(),
            tamable: t.tamable,
            min_tame_skill: t.min_tame_skill,
            abandoned: false,
            stabled: false,
            generated_loot: false,
            cooldowns: Cooldowns {
                next_reacquire: now + config.combat.reacquire_delay(),
                next_heal: now,
                next_heal_owner: now,
                ..Cooldowns::default()
            },
            combatant: None,
            warmode: false,
            aggressors: Vec::new(),
            flee_until: None,
            idle_until: None,
            stalled_until: GameTime::ZERO,
            next_swing: GameTime::ZERO,
            damage_log: DamageLog::new(),
            remove_step: 0,
            remove_if_untamed: false,
            spawner: None,
            waypoint: None,
            corpse_name: None,
            spells: SpellBook {
                attack: t.attack_spells.clone(),
                defense: t.defense_spells.clone(),
            },
            breath: BreathSequence::default(),
            heal: HealSequence::default(),
            timers: LifetimeTimers::default(),
            template,
        };
        creature.fill_resources();
        creature
    }

    // ===== identity & placement =====

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn template(&self) -> &SpeciesTemplate {
        &self.template
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Set once the creature asked the world to take it out.
    pub fn removal_requested(&self) -> Option<RemovalReason> {
        self.removal
    }

    pub(crate) fn request_removal(&mut self, reason: RemovalReason) {
        if self.removal.is_none() {
            self.removal = Some(reason);
        }
    }

    // ===== stats & resources =====

    pub fn raw_stat(&self, kind: StatKind) -> i32 {
        self.stats.get(kind)
    }

    /// Base stat plus modifiers, never below one.
    pub fn stat(&self, kind: StatKind) -> i32 {
        (self.stats.get(kind) + self.modifiers.offset(kind)).max(CoreStats::MIN)
    }

    pub fn str(&self) -> i32 {
        self.stat(StatKind::Str)
    }

    pub fn dex(&self) -> i32 {
        self.stat(StatKind::Dex)
    }

    pub fn int(&self) -> i32 {
        self.stat(StatKind::Int)
    }

    pub fn modifiers(&self) -> &StatModifiers {
        &self.modifiers
    }

    pub fn modifiers_mut(&mut self) -> &mut StatModifiers {
        &mut self.modifiers
    }

    pub fn seeds(&self) -> ResourceSeeds {
        self.seeds
    }

    /// Ceiling of a resource, see [`effective_cap`].
    pub fn effective_cap(&self, kind: ResourceKind) -> i32 {
        let stat = kind.governing_stat();
        effective_cap(self.seeds.get(kind), self.modifiers.offset(stat), self.stat(stat))
    }

    pub fn hits_max(&self) -> i32 {
        self.effective_cap(ResourceKind::Hits)
    }

    pub fn stam_max(&self) -> i32 {
        self.effective_cap(ResourceKind::Stam)
    }

    pub fn mana_max(&self) -> i32 {
        self.effective_cap(ResourceKind::Mana)
    }

    /// Current value, capped by the current ceiling.
    pub fn resource(&self, kind: ResourceKind) -> i32 {
        self.resources.get(kind).min(self.effective_cap(kind))
    }

    pub fn hits(&self) -> i32 {
        self.resource(ResourceKind::Hits)
    }

    pub fn stam(&self) -> i32 {
        self.resource(ResourceKind::Stam)
    }

    pub fn mana(&self) -> i32 {
        self.resource(ResourceKind::Mana)
    }

    pub fn set_resource(&mut self, kind: ResourceKind, value: i32) {
        let value = value.clamp(0, self.effective_cap(kind));
        self.resources.set(kind, value);
    }

    pub(crate) fn fill_resources(&mut self) {
        for kind in [ResourceKind::Hits, ResourceKind::Stam, ResourceKind::Mana] {
            self.resources.set(kind, self.effective_cap(kind));
        }
    }

    pub fn is_hurt(&self) -> bool {
        self.hits() < self.hits_max()
    }

    pub fn skills(&self) -> &Skills {
        &self.skills
    }

    pub fn damage_range(&self) -> DamageRange {
        self.damage
    }

    pub fn fame(&self) -> i32 {
        self.fame
    }

    pub fn karma(&self) -> i32 {
        self.karma
    }

    pub fn poison(&self) -> Option<u8> {
        self.poison
    }

    pub fn set_poison(&mut self, level: Option<u8>) {
        self.poison = level;
    }

    // ===== behaviour configuration =====

    pub fn current_ai(&self) -> AiKind {
        self.current_ai
    }

    pub fn default_ai(&self) -> AiKind {
        self.default_ai
    }

    pub fn fight_mode(&self) -> FightMode {
        self.fight_mode
    }

    pub fn set_fight_mode(&mut self, mode: FightMode) {
        self.fight_mode = mode;
    }

    pub fn range_perception(&self) -> i32 {
        self.range_perception
    }

    pub fn range_fight(&self) -> i32 {
        self.range_fight
    }

    pub fn speeds(&self) -> Speeds {
        self.speeds
    }

    /// Seconds until the next think.
    pub fn think_interval(&self) -> f64 {
        if self.warmode || self.combatant.is_some() {
            self.speeds.active
        } else {
            self.speeds.passive
        }
    }

    pub fn team(&self) -> i32 {
        self.team
    }

    pub fn set_team(&mut self, team: i32) {
        self.team = team;
    }

    pub fn home(&self) -> Option<Point3D> {
        self.home
    }

    pub fn set_home(&mut self, home: Option<Point3D>) {
        self.home = home;
    }

    pub fn range_home(&self) -> i32 {
        self.range_home
    }

    pub fn set_range_home(&mut self, range: i32) {
        self.range_home = range;
    }

    pub fn seeks_home(&self) -> bool {
        self.seeks_home
    }

    pub fn set_seeks_home(&mut self, seeks: bool) {
        self.seeks_home = seeks;
    }

    pub fn homing_failures(&self) -> u32 {
        self.homing_failures
    }

    pub fn spawner(&self) -> Option<SpawnerLink> {
        self.spawner
    }

    pub fn set_spawner(&mut self, spawner: Option<SpawnerLink>) {
        self.spawner = spawner;
    }

    pub fn remove_if_untamed(&self) -> bool {
        self.remove_if_untamed
    }

    pub fn set_remove_if_untamed(&mut self, value: bool) {
        self.remove_if_untamed = value;
    }

    pub fn remove_step(&self) -> u32 {
        self.remove_step
    }

    pub fn waypoint(&self) -> Option<EntityId> {
        self.waypoint
    }

    pub fn corpse_name(&self) -> Option<&str> {
        self.corpse_name.as_deref()
    }

    pub fn set_corpse_name(&mut self, name: Option<String>) {
        self.corpse_name = name;
    }

    pub fn spells(&self) -> &SpellBook {
        &self.spells
    }

    pub fn tamable(&self) -> bool {
        self.tamable
    }

    pub fn min_tame_skill(&self) -> f64 {
        self.min_tame_skill
    }

    pub fn has_generated_loot(&self) -> bool {
        self.generated_loot
    }

    pub fn cooldowns(&self) -> &Cooldowns {
        &self.cooldowns
    }

    pub fn timers(&self) -> &LifetimeTimers {
        &self.timers
    }

    // ===== combat state =====

    pub fn combatant(&self) -> Option<EntityId> {
        self.combatant
    }

    pub fn warmode(&self) -> bool {
        self.warmode
    }

    pub(crate) fn set_combatant(&mut self, combatant: Option<EntityId>) -> bool {
        if self.combatant == combatant {
            return false;
        }
        self.combatant = combatant;
        if combatant.is_some() {
            self.warmode = true;
        }
        true
    }

    pub(crate) fn is_stalled(&self, now: GameTime) -> bool {
        now < self.stalled_until
    }

    /// Snapshot for other creatures' perception.
    pub fn as_mobile_info(&self) -> MobileInfo {
        MobileInfo {
            id: self.id,
            location: self.location,
            alive: self.alive,
            deleted: self.deleted,
            player: false,
            access: Default::default(),
            hits: self.hits(),
            hits_max: self.hits_max(),
            str: self.str(),
            karma: self.karma,
            poison: self.poison,
            creature: Some(self.creature_traits()),
        }
    }

    pub fn creature_traits(&self) -> CreatureTraits {
        CreatureTraits {
            team: self.team,
            controlled: self.is_controlled(),
            summoned: self.is_summoned(),
            fight_mode: self.fight_mode,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for unit tests across the crate.
    use super::*;
    use crate::env::{SandboxEnv, SandboxMobile, ScriptedRng};
    use crate::events::CreatureEvent;
    use crate::schedule::TaskQueue;

    pub const MASTER: EntityId = EntityId(1);
    pub const OTHER: EntityId = EntityId(2);
    pub const PET: EntityId = EntityId(100);

    pub fn here() -> Location {
        Location::new(MapId::TRAMMEL, Point3D::new(100, 100, 0))
    }

    pub fn template() -> SpeciesTemplate {
        SpeciesTemplate {
            name: String::from("a wolf"),
            ai: AiKind::Animal,
            str: RollRange::fixed(80),
            dex: RollRange::fixed(60),
            int: RollRange::fixed(30),
            hits: Some(RollRange::fixed(120)),
            tamable: true,
            min_tame_skill: 83.1,
            control_slots: 1,
            ..SpeciesTemplate::default()
        }
    }

    pub fn creature_from(template: SpeciesTemplate) -> Creature {
        let config = EngineConfig::default();
        let mut creature = Creature::from_template(
            PET,
            "wolf",
            Arc::new(template),
            here(),
            GameTime::ZERO,
            &config,
        );
        creature.set_hits(120);
        creature
    }

    pub fn creature() -> Creature {
        creature_from(template())
    }

    pub fn env_with_master(followers: u32, max: u32) -> SandboxEnv {
        let mut env = SandboxEnv::new();
        env.insert(SandboxMobile::player(MASTER, here()).with_followers(followers, max));
        env.insert(SandboxMobile::player(OTHER, here()));
        env
    }

    /// Owns everything a [`crate::context::CreatureContext`] borrows.
    pub struct Harness {
        pub now: GameTime,
        pub env: SandboxEnv,
        pub rng: ScriptedRng,
        pub tasks: TaskQueue,
        pub config: EngineConfig,
        pub events: Vec<CreatureEvent>,
    }

    impl Harness {
        pub fn new(env: SandboxEnv) -> Self {
            Self {
                now: GameTime::from_secs(1_000),
                env,
                rng: ScriptedRng::constant(0.0),
                tasks: TaskQueue::new(),
                config: EngineConfig::default(),
                events: Vec::new(),
            }
        }

        pub fn with_rng(mut self, rng: ScriptedRng) -> Self {
            self.rng = rng;
            self
        }

        pub fn ctx(&mut self) -> crate::context::CreatureContext<'_> {
            crate::context::CreatureContext::new(
                self.now,
                &mut self.env,
                &mut self.rng,
                &mut self.tasks,
                &self.config,
                &mut self.events,
            )
        }

        pub fn advance(&mut self, secs: u64) {
            self.now = self.now + std::time::Duration::from_secs(secs);
        }
    }
}
