//! Deterministic creature logic shared by the runtime and offline tools.
//!
//! `creature-core` holds the rules for AI-driven creatures: stat rolling,
//! target ranking, combat and flee decisions, pet control and loyalty, the
//! timed behaviors (healing, breath, auras, rummaging, homing), and the
//! save-record codec. Everything the rules need from the surrounding world
//! arrives through the [`env::Env`] oracles and the [`CreatureContext`], so
//! the same code runs inside the async runtime and in unit tests.
pub mod ai;
pub mod combat;
pub mod config;
pub mod context;
pub mod control;
pub mod creature;
pub mod env;
pub mod error;
pub mod events;
pub mod loyalty;
pub mod persist;
pub mod schedule;
pub mod spell;
pub mod state;
pub mod stats;
pub mod think;

pub use ai::{
    AiKind, AiRegistry, AnimalAi, ArcherAi, Behavior, BehaviorFactory, BerserkAi, Decision,
    HealerAi, LiveCreature, MageAi, MeleeAi, ParsedOrder, Speech, SpeechOutcome, VendorAi,
    parse_order,
};
pub use combat::{
    Award, DamageEntry, DamageLog, DamageSource, DamageStore, FightMode, UNRANKABLE,
    get_looting_rights, rank_candidate,
};
pub use config::{
    CombatConfig, ControlChanceConfig, EngineConfig, HomingConfig, LootTier, LootTiers,
    LoyaltyConfig, RewardConfig, RummageConfig, UpkeepConfig,
};
pub use context::CreatureContext;
pub use control::{Allegiance, BardState, ControlError, ControlState, OrderType, ProvokeTarget};
pub use creature::{
    Cooldowns, Creature, FoodTable, FoodType, FriendList, LifetimeTimers, OwnerList, RollRange,
    SkillRange, SpawnerLink, SpeciesOracle, SpeciesTemplate, SpeciesTraits, Speeds, SpellBook,
};
pub use env::{
    AccessLevel, CreatureTraits, Effect, Env, FollowerCount, FollowerLedger, MobileInfo,
    MobileOracle, Notice, PcgRng, RngOracle, SandboxEnv, SandboxMobile, ScriptedRng, WorldActions,
};
pub use error::{ErrorSeverity, GameError};
pub use events::{CreatureEvent, RemovalReason};
pub use loyalty::{ControlChance, UpkeepOutcome, control_chance};
pub use persist::{
    CURRENT_VERSION, LoadContext, LoadedCreature, PersistError, PostLoadFixup, SaveFlags,
    SaveReader, SaveWriter,
};
pub use schedule::{CreatureTask, ScheduledTask, TaskId, TaskQueue};
pub use spell::{Spell, SpellFactory, SpellKey, SpellRegistry, SpellRole};
pub use state::{EntityId, GameTime, Location, MapId, Point3D};
pub use stats::{
    CoreStats, DamageRange, ResourceKind, ResourceSeeds, Resources, SkillName, SkillValue, Skills,
    StatKind, StatModifier, StatModifiers, effective_cap,
};
pub use think::{
    AuraProfile, BreathProfile, BreathSequence, BreathStage, HealProfile, HealSequence,
    HomingOutcome, ThinkReport,
};
