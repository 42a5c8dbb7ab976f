//! Traits describing the surrounding world framework.
//!
//! Creatures do not own the world. Everything outside the creature record
//! (other mobiles, line of sight, corpses, follower counters on masters,
//! sounds and messages) is reached through three narrow traits:
//!
//! - [`MobileOracle`]: read-only queries about mobiles and geometry
//! - [`FollowerLedger`]: the follower counters and handles kept on masters
//! - [`WorldActions`]: side effects the framework performs on request
//!
//! [`Env`] bundles them so operations take a single `&mut dyn Env`.
mod rng;
mod sandbox;

pub use rng::{PcgRng, RngOracle, ScriptedRng};
pub use sandbox::{SandboxEnv, SandboxMobile};

use crate::combat::FightMode;
use crate::spell::SpellKey;
use crate::state::{EntityId, Location, Point3D};
use crate::stats::SkillName;

/// Staff rank of a mobile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessLevel {
    #[default]
    Player,
    Counselor,
    GameMaster,
    Administrator,
}

impl AccessLevel {
    /// Staff at this level bypass control-chance checks.
    pub const fn overrides_control(self) -> bool {
        matches!(self, Self::GameMaster | Self::Administrator)
    }
}

/// Creature-specific facts other creatures care about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreatureTraits {
    pub team: i32,
    pub controlled: bool,
    pub summoned: bool,
    pub fight_mode: FightMode,
}

impl CreatureTraits {
    pub const fn is_pet(&self) -> bool {
        self.controlled || self.summoned
    }
}

/// Snapshot of a mobile as seen by a creature.
#[derive(Clone, Debug, PartialEq)]
pub struct MobileInfo {
    pub id: EntityId,
    pub location: Location,
    pub alive: bool,
    pub deleted: bool,
    pub player: bool,
    pub access: AccessLevel,
    pub hits: i32,
    pub hits_max: i32,
    pub str: i32,
    pub karma: i32,
    /// Poison level, if poisoned.
    pub poison: Option<u8>,
    pub creature: Option<CreatureTraits>,
}

impl MobileInfo {
    pub fn is_live(&self) -> bool {
        self.alive && !self.deleted
    }

    pub fn is_live_player(&self) -> bool {
        self.player && self.is_live()
    }
}

/// Follower load of a master.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FollowerCount {
    pub current: u32,
    pub max: u32,
}

impl FollowerCount {
    pub const fn has_room_for(&self, slots: u32) -> bool {
        self.current + slots <= self.max
    }
}

/// Sound, animation and visual cues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    AngerSound,
    AngerAnimation,
    IdleSound,
    IdleAnimation,
    DistressSound,
    BreathAnger,
    BreathVisual { target: EntityId },
    HealSound { patient: EntityId },
    AuraHit { target: EntityId },
}

/// Messages shown to a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    TooManyFollowers,
    AttemptingToHeal { healer: EntityId },
    CuredOfPoison,
    PetLooksUnhappy { pet: EntityId },
    PetAbandoned { pet: EntityId },
    FoodAccepted { pet: EntityId },
    FoodRefused { pet: EntityId },
    VendorGreeting { vendor: EntityId },
}

/// Read-only queries about the world.
pub trait MobileOracle {
    fn mobile(&self, id: EntityId) -> Option<MobileInfo>;

    /// Skill value in tenths of a point; `base` skips item and spell bonuses.
    fn skill(&self, id: EntityId, skill: SkillName, base: bool) -> u32;

    fn in_line_of_sight(&self, from: &Location, to: &Location) -> bool;

    /// Every mobile within `range` tiles of `at`, on the same map.
    fn mobiles_in_range(&self, at: &Location, range: i32) -> Vec<MobileInfo>;

    fn can_be_harmful(&self, from: EntityId, to: EntityId) -> bool;

    fn can_be_beneficial(&self, from: EntityId, to: EntityId) -> bool;

    /// Party members including `id`; empty when not in a party.
    fn party_members(&self, id: EntityId) -> Vec<EntityId>;

    fn in_house_region(&self, at: &Location) -> bool;

    /// Whether any player is near enough to keep the sector simulated.
    fn sector_active(&self, at: &Location) -> bool;
}

/// Follower counters kept on masters.
///
/// Creatures only ever touch these through the paired add/remove routines in
/// [`crate::control`].
pub trait FollowerLedger {
    fn followers(&self, master: EntityId) -> Option<FollowerCount>;

    fn set_followers(&mut self, master: EntityId, current: u32);

    fn link_follower(&mut self, master: EntityId, follower: EntityId);

    fn unlink_follower(&mut self, master: EntityId, follower: EntityId);
}

/// Side effects carried out by the framework.
pub trait WorldActions {
    /// Tries one step toward `to`; returns the new point or `None` if blocked.
    fn step_toward(&mut self, mover: EntityId, from: &Location, to: &Point3D) -> Option<Point3D>;

    fn apply_damage(&mut self, target: EntityId, amount: i32, source: EntityId);

    fn heal(&mut self, target: EntityId, amount: i32);

    fn cure_poison(&mut self, target: EntityId, healer: EntityId) -> bool;

    /// Moves a random item from a nearby corpse into the looter's pack.
    fn rummage_corpse(&mut self, looter: EntityId, at: &Location, range: i32) -> bool;

    fn drop_backpack(&mut self, owner: EntityId, at: &Location);

    fn clear_backpack(&mut self, owner: EntityId);

    fn generate_loot(&mut self, creature: EntityId, species: &str);

    fn award(&mut self, to: EntityId, fame: i32, karma: i32);

    fn detach_from_spawner(&mut self, spawner: EntityId, creature: EntityId);

    fn cast_spell(&mut self, caster: EntityId, spell: &SpellKey, target: Option<EntityId>) -> bool;

    fn emit(&mut self, source: EntityId, effect: Effect);

    fn notify(&mut self, to: EntityId, notice: Notice);
}

/// Aggregate of every framework-facing trait.
pub trait Env: MobileOracle + FollowerLedger + WorldActions {}

impl<T: MobileOracle + FollowerLedger + WorldActions + ?Sized> Env for T {}
