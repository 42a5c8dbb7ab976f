use creature_core::{EntityId, GameTime, RemovalReason};

/// Bookkeeping published by the simulation worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    TickCompleted {
        now: GameTime,
        thinks: usize,
        tasks_fired: usize,
    },
    CreatureSpawned {
        creature: EntityId,
        species: String,
    },
    CreatureRemoved {
        creature: EntityId,
        reason: RemovalReason,
    },
    Saved {
        creatures: usize,
    },
    Loaded {
        loaded: usize,
        failed: usize,
    },
}
