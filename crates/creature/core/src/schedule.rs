//! Delayed creature actions.
//!
//! Multi-step sequences (breath, healing) and lifetime timers (unsummon,
//! unclaimed-pet deletion, return home) are queued as [`ScheduledTask`]s with
//! an absolute fire time. Every task is owned by one creature and can be
//! cancelled through its [`TaskId`], individually or all at once when the
//! creature goes away.
//!
//! Ordering is `(due, id)`: earlier first, then insertion order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use std::fmt;

use crate::state::{EntityId, GameTime};

/// Cancellation handle returned by [`TaskQueue::schedule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// What a fired task asks its owner to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreatureTask {
    /// Play the breath visual at the target.
    BreathEffect { target: EntityId },
    /// Land breath damage on the target.
    BreathDamage { target: EntityId },
    HealComplete { patient: EntityId },
    Unsummon,
    DeleteUnclaimed,
    /// Put a creature back home while its sector sleeps.
    ReturnHome,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub owner: EntityId,
    pub due: GameTime,
    pub task: CreatureTask,
}

// Min-heap on (due, id).
impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Debug, Default)]
pub struct TaskQueue {
    heap: BinaryHeap<ScheduledTask>,
    /// Tasks that have not fired or been cancelled.
    live: BTreeMap<TaskId, (EntityId, GameTime)>,
    next_id: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, owner: EntityId, due: GameTime, task: CreatureTask) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.live.insert(id, (owner, due));
        self.heap.push(ScheduledTask {
            id,
            owner,
            due,
            task,
        });
        id
    }

    /// Returns false if the task already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.live.remove(&id).is_some()
    }

    /// Cancels every pending task of `owner`, returning how many were dropped.
    pub fn cancel_owned_by(&mut self, owner: EntityId) -> usize {
        let before = self.live.len();
        self.live.retain(|_, (task_owner, _)| *task_owner != owner);
        before - self.live.len()
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn due_time(&self, id: TaskId) -> Option<GameTime> {
        self.live.get(&id).map(|(_, due)| *due)
    }

    pub fn pending_for(&self, owner: EntityId) -> usize {
        self.live.values().filter(|(o, _)| *o == owner).count()
    }

    /// Pops the next live task due at or before `now`.
    pub fn pop_due(&mut self, now: GameTime) -> Option<ScheduledTask> {
        while let Some(next) = self.heap.peek() {
            if !self.live.contains_key(&next.id) {
                self.heap.pop();
                continue;
            }
            if next.due > now {
                return None;
            }
            let task = self.heap.pop()?;
            self.live.remove(&task.id);
            return Some(task);
        }
        None
    }

    pub fn next_due(&self) -> Option<GameTime> {
        self.live.values().map(|(_, due)| *due).min()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
