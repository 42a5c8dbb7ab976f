//! Observable outcomes of creature operations.
//!
//! The core never logs. Operations push [`CreatureEvent`]s into the context
//! and the runtime decides how to trace or broadcast them.

use crate::control::OrderType;
use crate::state::{EntityId, GameTime, Point3D};

/// Why a creature asked to be taken out of the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    Died,
    Unsummoned,
    /// A summoned creature that was released.
    ReleasedSummon,
    /// Released pet nobody reclaimed in time.
    Unclaimed,
    /// Wild creature idling in a house or without its spawner for too long.
    Untamed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CreatureEvent {
    Tamed {
        creature: EntityId,
        master: EntityId,
    },
    ControlRefused {
        creature: EntityId,
        master: EntityId,
    },
    Released {
        creature: EntityId,
        master: Option<EntityId>,
    },
    Abandoned {
        creature: EntityId,
        master: Option<EntityId>,
    },
    Summoned {
        creature: EntityId,
        master: EntityId,
        expires_at: GameTime,
    },
    OrderChanged {
        creature: EntityId,
        order: OrderType,
        target: Option<EntityId>,
    },
    LoyaltyChanged {
        creature: EntityId,
        loyalty: i32,
    },
    LoyaltyDistress {
        creature: EntityId,
    },
    CombatantChanged {
        creature: EntityId,
        combatant: Option<EntityId>,
    },
    Provoked {
        creature: EntityId,
        target: EntityId,
    },
    Pacified {
        creature: EntityId,
        until: GameTime,
    },
    Unpacified {
        creature: EntityId,
    },
    BreathStarted {
        creature: EntityId,
        target: EntityId,
    },
    BreathLanded {
        creature: EntityId,
        target: EntityId,
        damage: i32,
    },
    BreathAborted {
        creature: EntityId,
    },
    HealStarted {
        creature: EntityId,
        patient: EntityId,
    },
    Healed {
        creature: EntityId,
        patient: EntityId,
        amount: i32,
    },
    Cured {
        creature: EntityId,
        patient: EntityId,
    },
    HealAborted {
        creature: EntityId,
    },
    Rummaged {
        creature: EntityId,
    },
    TeleportedHome {
        creature: EntityId,
        home: Point3D,
    },
    AuraPulse {
        creature: EntityId,
        targets: usize,
    },
    Fed {
        creature: EntityId,
        by: EntityId,
    },
    DeletionScheduled {
        creature: EntityId,
        at: GameTime,
    },
    RemovalRequested {
        creature: EntityId,
        reason: RemovalReason,
    },
    Rewarded {
        creature: EntityId,
        recipient: EntityId,
        fame: i32,
        karma: i32,
    },
}
