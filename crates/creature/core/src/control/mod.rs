//! Ownership and control state machine.
//!
//! ```text
//!            set_control_master(Some(m))
//!   ┌──────┐ ───────────────────────────► ┌────────────────┐
//!   │ Wild │                              │ Controlled(m)  │
//!   └──────┘ ◄─────────────────────────── └────────────────┘
//!      │  ▲      release / set_control_master(None)
//!      │  │
//!      │  └── release (creature is removed) ──┐
//!      ▼ summon(caster)                       │
//!   ┌────────────────────┐                    │
//!   │ Summoned(caster)   │ ───────────────────┘
//!   └────────────────────┘   unsummon timer fires
//! ```
//!
//! Bard effects ([`bard`]) are an overlay on top of any of these states.
//!
//! Follower slots on masters change only through `add_followers` and
//! `remove_followers`, invoked exactly once per master change, removal first.
mod bard;

pub use bard::{BardState, ProvokeTarget, provoke};

use std::time::Duration;

use crate::config::EngineConfig;
use crate::context::CreatureContext;
use crate::creature::Creature;
use crate::env::{Effect, Notice};
use crate::error::{ErrorSeverity, GameError};
use crate::events::{CreatureEvent, RemovalReason};
use crate::schedule::CreatureTask;
use crate::state::{EntityId, GameTime, Location, Point3D};

/// Who, if anyone, the creature answers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Allegiance {
    #[default]
    Wild,
    Controlled {
        master: EntityId,
    },
    Summoned {
        master: EntityId,
        expires_at: GameTime,
    },
}

/// Standing instruction from a master. Discriminants are persisted.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::FromRepr, strum::EnumIter,
)]
#[repr(u8)]
pub enum OrderType {
    #[default]
    None = 0,
    Come = 1,
    Drop = 2,
    Follow = 3,
    Friend = 4,
    Unfriend = 5,
    Guard = 6,
    Attack = 7,
    Patrol = 8,
    Release = 9,
    Stay = 10,
    Stop = 11,
    Transfer = 12,
}

impl OrderType {
    /// Orders under which a pet turns on whoever attacks it.
    pub const fn yields_to_aggression(self) -> bool {
        matches!(
            self,
            Self::Come | Self::Stay | Self::Stop | Self::None | Self::Follow
        )
    }

    /// Orders a pet friend (not the master) may give.
    pub const fn allowed_for_friends(self) -> bool {
        matches!(self, Self::Come | Self::Follow | Self::Stay | Self::Stop)
    }

    /// Orders that need a mobile to act on.
    pub const fn needs_target(self) -> bool {
        matches!(
            self,
            Self::Attack | Self::Friend | Self::Unfriend | Self::Transfer
        )
    }
}

/// Orders and slot cost while under control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlState {
    pub order: OrderType,
    pub target: Option<EntityId>,
    pub destination: Option<Point3D>,
    pub slots: u32,
}

impl ControlState {
    pub fn new(slots: u32) -> Self {
        Self {
            order: OrderType::None,
            target: None,
            destination: None,
            slots,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("{master} has too many followers ({current} + {slots} > {max})")]
    TooManyFollowers {
        master: EntityId,
        current: u32,
        slots: u32,
        max: u32,
    },

    #[error("{creature} cannot be its own master")]
    SelfControl { creature: EntityId },

    #[error("{master} has no follower ledger")]
    UnknownMaster { master: EntityId },

    #[error("{creature} already answers to {master}")]
    NotWild {
        creature: EntityId,
        master: EntityId,
    },

    #[error("{creature} has been deleted")]
    Deleted { creature: EntityId },
}

impl GameError for ControlError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TooManyFollowers { .. } => ErrorSeverity::Recoverable,
            Self::SelfControl { .. } | Self::NotWild { .. } | Self::Deleted { .. } => {
                ErrorSeverity::Validation
            }
            Self::UnknownMaster { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TooManyFollowers { .. } => "CONTROL_TOO_MANY_FOLLOWERS",
            Self::SelfControl { .. } => "CONTROL_SELF",
            Self::UnknownMaster { .. } => "CONTROL_UNKNOWN_MASTER",
            Self::NotWild { .. } => "CONTROL_NOT_WILD",
            Self::Deleted { .. } => "CONTROL_DELETED",
        }
    }
}

impl Creature {
    // ===== queries =====

    pub fn allegiance(&self) -> Allegiance {
        self.allegiance
    }

    pub fn is_wild(&self) -> bool {
        matches!(self.allegiance, Allegiance::Wild)
    }

    pub fn is_controlled(&self) -> bool {
        matches!(self.allegiance, Allegiance::Controlled { .. })
    }

    pub fn is_summoned(&self) -> bool {
        matches!(self.allegiance, Allegiance::Summoned { .. })
    }

    pub fn control_master(&self) -> Option<EntityId> {
        match self.allegiance {
            Allegiance::Controlled { master } => Some(master),
            _ => None,
        }
    }

    pub fn summon_master(&self) -> Option<EntityId> {
        match self.allegiance {
            Allegiance::Summoned { master, .. } => Some(master),
            _ => None,
        }
    }

    pub fn summon_expires_at(&self) -> Option<GameTime> {
        match self.allegiance {
            Allegiance::Summoned { expires_at, .. } => Some(expires_at),
            _ => None,
        }
    }

    /// Control master, else summon master. Follower slots are charged here.
    pub fn master(&self) -> Option<EntityId> {
        match self.allegiance {
            Allegiance::Wild => None,
            Allegiance::Controlled { master } | Allegiance::Summoned { master, .. } => Some(master),
        }
    }

    pub fn control_order(&self) -> OrderType {
        self.control.order
    }

    pub fn control_target(&self) -> Option<EntityId> {
        self.control.target
    }

    pub fn control_slots(&self) -> u32 {
        self.control.slots
    }

    pub fn is_commandable(&self) -> bool {
        self.template.traits.commandable && self.alive && !self.deleted
    }

    pub fn loyalty(&self) -> i32 {
        self.loyalty
    }

    pub fn set_loyalty(&mut self, loyalty: i32) {
        self.loyalty = loyalty.clamp(0, EngineConfig::MAX_LOYALTY);
    }

    pub fn owners(&self) -> &[EntityId] {
        &self.owners
    }

    pub fn last_owner(&self) -> Option<EntityId> {
        self.owners.last().copied()
    }

    pub fn friends(&self) -> &[EntityId] {
        &self.friends
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    pub fn is_stabled(&self) -> bool {
        self.stabled
    }

    pub fn delete_time_left(&self, now: GameTime) -> Option<Duration> {
        self.timers.delete.map(|(_, at)| at.remaining_from(now))
    }

    // ===== transitions =====

    /// Hands the creature to `master`, or releases it with `None`.
    ///
    /// Taming fails without touching any field when the master cannot take
    /// on this creature's control slots. Releasing restores full loyalty,
    /// clears order and target, and then goes on as [`Creature::release`]
    /// does, minus the anger sound.
    pub fn set_control_master(
        &mut self,
        master: Option<EntityId>,
        ctx: &mut CreatureContext<'_>,
    ) -> Result<(), ControlError> {
        if self.deleted {
            return Err(ControlError::Deleted { creature: self.id });
        }
        match master {
            Some(master) => self.assign_control_master(master, ctx),
            None if self.master().is_some() => {
                self.let_go(ctx);
                Ok(())
            }
            None => {
                self.clear_control(ctx);
                Ok(())
            }
        }
    }

    fn assign_control_master(
        &mut self,
        master: EntityId,
        ctx: &mut CreatureContext<'_>,
    ) -> Result<(), ControlError> {
        if master == self.id {
            return Err(ControlError::SelfControl { creature: self.id });
        }
        if let Allegiance::Summoned { master: summoner, .. } = self.allegiance {
            return Err(ControlError::NotWild {
                creature: self.id,
                master: summoner,
            });
        }
        if self.control_master() == Some(master) {
            return Ok(());
        }
        self.check_capacity(master, ctx)?;

        if let Some(spawner) = self.spawner.filter(|s| s.unlink_on_taming) {
            ctx.env.detach_from_spawner(spawner.id, self.id);
            self.spawner = None;
        }
        self.waypoint = None;
        self.home = None;
        self.return_queued = false;
        self.homing_failures = 0;

        self.remove_followers(ctx);
        self.allegiance = Allegiance::Controlled { master };
        self.add_followers(ctx);

        self.control.target = None;
        self.control.order = OrderType::Come;
        self.control.destination = None;
        self.combatant = None;
        self.warmode = false;
        self.abandoned = false;
        self.remove_step = 0;
        self.stop_delete_timer(ctx);
        self.record_owner(master);

        ctx.emit(CreatureEvent::Tamed {
            creature: self.id,
            master,
        });
        Ok(())
    }

    fn check_capacity(
        &self,
        master: EntityId,
        ctx: &mut CreatureContext<'_>,
    ) -> Result<(), ControlError> {
        let count = ctx
            .env
            .followers(master)
            .ok_or(ControlError::UnknownMaster { master })?;
        if count.has_room_for(self.control.slots) {
            return Ok(());
        }
        ctx.env.notify(master, Notice::TooManyFollowers);
        ctx.emit(CreatureEvent::ControlRefused {
            creature: self.id,
            master,
        });
        Err(ControlError::TooManyFollowers {
            master,
            current: count.current,
            slots: self.control.slots,
            max: count.max,
        })
    }

    fn clear_control(&mut self, ctx: &mut CreatureContext<'_>) {
        self.remove_followers(ctx);
        self.allegiance = Allegiance::Wild;
        self.control.target = None;
        self.control.order = OrderType::None;
        self.control.destination = None;
        self.loyalty = EngineConfig::MAX_LOYALTY;
        if let Some(id) = self.timers.unsummon.take() {
            ctx.tasks.cancel(id);
        }
    }

    /// Conjures the creature for `caster`.
    ///
    /// `obey` decides whether the summon takes orders (it starts on "come").
    /// The creature's pack is emptied and an unsummon timer is armed.
    pub fn summon(
        &mut self,
        caster: EntityId,
        obey: bool,
        duration: Duration,
        location: Location,
        ctx: &mut CreatureContext<'_>,
    ) -> Result<(), ControlError> {
        if self.deleted {
            return Err(ControlError::Deleted { creature: self.id });
        }
        if let Some(master) = self.master() {
            return Err(ControlError::NotWild {
                creature: self.id,
                master,
            });
        }
        self.check_capacity(caster, ctx)?;

        let expires_at = ctx.now + duration;
        self.location = location;
        self.allegiance = Allegiance::Summoned {
            master: caster,
            expires_at,
        };
        self.add_followers(ctx);

        self.control.target = None;
        self.control.order = if obey { OrderType::Come } else { OrderType::None };
        self.range_home = ctx.config.homing.summon_home_range;
        self.cooldowns.next_reacquire = ctx.now;
        ctx.env.clear_backpack(self.id);
        self.timers.unsummon = Some(ctx.tasks.schedule(self.id, expires_at, CreatureTask::Unsummon));

        ctx.emit(CreatureEvent::Summoned {
            creature: self.id,
            master: caster,
            expires_at,
        });
        Ok(())
    }

    /// A master lets the creature go.
    ///
    /// Summons vanish; pets go wild, drop their pack, and start the
    /// unclaimed-creature countdown.
    pub fn release(&mut self, ctx: &mut CreatureContext<'_>) {
        ctx.env.emit(self.id, Effect::AngerSound);
        self.let_go(ctx);
    }

    fn let_go(&mut self, ctx: &mut CreatureContext<'_>) {
        let master = self.master();
        let was_summoned = self.is_summoned();
        self.clear_control(ctx);
        ctx.env.drop_backpack(self.id, &self.location);
        if was_summoned {
            self.request_removal(RemovalReason::ReleasedSummon);
            ctx.emit(CreatureEvent::RemovalRequested {
                creature: self.id,
                reason: RemovalReason::ReleasedSummon,
            });
        } else {
            self.begin_delete_timer(ctx);
        }
        ctx.emit(CreatureEvent::Released {
            creature: self.id,
            master,
        });
    }

    pub fn set_control_order(&mut self, order: OrderType, ctx: &mut CreatureContext<'_>) {
        self.control.order = order;
        ctx.emit(CreatureEvent::OrderChanged {
            creature: self.id,
            order,
            target: self.control.target,
        });
    }

    pub fn set_control_target(&mut self, target: Option<EntityId>) {
        self.control.target = target;
    }

    pub fn set_control_destination(&mut self, destination: Option<Point3D>) {
        self.control.destination = destination;
    }

    // ===== follower accounting =====

    fn add_followers(&mut self, ctx: &mut CreatureContext<'_>) {
        let Some(master) = self.master() else {
            return;
        };
        if let Some(count) = ctx.env.followers(master) {
            ctx.env.set_followers(master, count.current + self.control.slots);
        }
        ctx.env.link_follower(master, self.id);
    }

    fn remove_followers(&mut self, ctx: &mut CreatureContext<'_>) {
        let Some(master) = self.master() else {
            return;
        };
        if let Some(count) = ctx.env.followers(master) {
            ctx.env
                .set_followers(master, count.current.saturating_sub(self.control.slots));
        }
        ctx.env.unlink_follower(master, self.id);
    }

    /// Re-charges the master after a load; the master may load after us.
    pub fn restore_followers(&mut self, ctx: &mut CreatureContext<'_>) {
        self.add_followers(ctx);
    }

    // ===== unclaimed-creature timer =====

    /// Arms the unclaimed-creature countdown unless the creature is exempt.
    pub fn begin_delete_timer(&mut self, ctx: &mut CreatureContext<'_>) {
        if self.template.traits.escort || self.is_summoned() || self.deleted || self.stabled {
            return;
        }
        let after = ctx.config.upkeep.unclaimed_delete();
        self.arm_delete_timer(after, ctx);
    }

    pub(crate) fn arm_delete_timer(&mut self, after: Duration, ctx: &mut CreatureContext<'_>) {
        self.stop_delete_timer(ctx);
        let at = ctx.now + after;
        let id = ctx.tasks.schedule(self.id, at, CreatureTask::DeleteUnclaimed);
        self.timers.delete = Some((id, at));
        ctx.emit(CreatureEvent::DeletionScheduled {
            creature: self.id,
            at,
        });
    }

    pub fn stop_delete_timer(&mut self, ctx: &mut CreatureContext<'_>) {
        if let Some((id, _)) = self.timers.delete.take() {
            ctx.tasks.cancel(id);
        }
    }

    pub fn set_stabled(&mut self, stabled: bool, ctx: &mut CreatureContext<'_>) {
        self.stabled = stabled;
        if stabled {
            self.stop_delete_timer(ctx);
        }
    }

    // ===== owners & friends =====

    /// Appends a new owner; once the history is full it stops growing.
    pub(crate) fn record_owner(&mut self, owner: EntityId) {
        if !self.owners.contains(&owner) {
            let _ = self.owners.try_push(owner);
        }
    }

    pub fn allows_new_pet_friend(&self) -> bool {
        !self.friends.is_full()
    }

    pub fn is_pet_friend(&self, mobile: EntityId) -> bool {
        self.friends.contains(&mobile)
    }

    /// Returns false when the friend list is full or `mobile` is the master.
    pub fn add_pet_friend(&mut self, mobile: EntityId) -> bool {
        if self.master() == Some(mobile) {
            return false;
        }
        if self.friends.contains(&mobile) {
            return true;
        }
        self.friends.try_push(mobile).is_ok()
    }

    pub fn remove_pet_friend(&mut self, mobile: EntityId) -> bool {
        match self.friends.iter().position(|f| *f == mobile) {
            Some(index) => {
                self.friends.remove(index);
                true
            }
            None => false,
        }
    }

    // ===== deletion =====

    /// Detaches the creature from every master and cancels its tasks.
    pub fn on_delete(&mut self, ctx: &mut CreatureContext<'_>) {
        if self.deleted {
            return;
        }
        self.remove_followers(ctx);
        self.allegiance = Allegiance::Wild;
        self.control.target = None;
        self.control.order = OrderType::None;
        self.combatant = None;
        self.warmode = false;
        ctx.tasks.cancel_owned_by(self.id);
        self.timers = Default::default();
        self.breath = Default::default();
        self.heal = Default::default();
        self.deleted = true;
    }
}
