//! The per-tick sub-behaviour multiplexer.
//!
//! [`Creature::on_think`] runs, in this order and each under its own cooldown:
//!
//! 1. [`rummage`]: loot a nearby corpse
//! 2. [`breath`]: start a breath attack sequence
//! 3. [`heal`]: start healing the owner or itself
//! 4. [`homing`]: drift back toward the spawn point
//! 5. [`aura`]: damage everything hostile nearby
//!
//! Multi-step actions are small state machines advanced by scheduled
//! [`CreatureTask`]s. Each firing rechecks its target before acting and
//! aborts quietly if the target is gone.
mod aura;
mod breath;
mod heal;
mod homing;
mod rummage;

pub use aura::AuraProfile;
pub use breath::{BreathProfile, BreathSequence, BreathStage};
pub use heal::{HealProfile, HealSequence};
pub use homing::HomingOutcome;

use crate::context::CreatureContext;
use crate::creature::Creature;
use crate::events::{CreatureEvent, RemovalReason};
use crate::schedule::{CreatureTask, TaskId};

/// What a single think pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThinkReport {
    pub rummaged: bool,
    pub breath_started: bool,
    pub heal_started: bool,
    pub homing: HomingOutcome,
    pub aura_targets: usize,
}

impl Creature {
    /// One think tick. Sub-behaviours are independent and may all fire.
    pub fn on_think(&mut self, ctx: &mut CreatureContext<'_>) -> ThinkReport {
        if !self.alive || self.deleted || self.removal.is_some() {
            return ThinkReport::default();
        }
        let report = ThinkReport {
            rummaged: self.think_rummage(ctx),
            breath_started: self.think_breath(ctx),
            heal_started: self.think_heal(ctx),
            homing: self.think_homing(ctx),
            aura_targets: self.think_aura(ctx),
        };
        self.refresh_speed();
        report
    }

    /// Active speed while fighting, passive otherwise.
    pub fn refresh_speed(&mut self) {
        self.speeds.current = self.think_interval();
    }

    /// Runs a task popped from the queue. Stale handles are ignored.
    pub fn fire_task(&mut self, id: TaskId, task: CreatureTask, ctx: &mut CreatureContext<'_>) {
        if self.deleted {
            return;
        }
        match task {
            CreatureTask::BreathEffect { target } => self.breath_effect(id, target, ctx),
            CreatureTask::BreathDamage { target } => self.breath_damage(id, target, ctx),
            CreatureTask::HealComplete { patient } => self.heal_complete(id, patient, ctx),
            CreatureTask::Unsummon => self.unsummon(id, ctx),
            CreatureTask::DeleteUnclaimed => self.delete_unclaimed(id, ctx),
            CreatureTask::ReturnHome => self.return_home(id, ctx),
        }
    }

    fn unsummon(&mut self, id: TaskId, ctx: &mut CreatureContext<'_>) {
        if self.timers.unsummon != Some(id) {
            return;
        }
        self.timers.unsummon = None;
        self.request_removal(RemovalReason::Unsummoned);
        ctx.emit(CreatureEvent::RemovalRequested {
            creature: self.id,
            reason: RemovalReason::Unsummoned,
        });
    }

    fn delete_unclaimed(&mut self, id: TaskId, ctx: &mut CreatureContext<'_>) {
        if self.timers.delete.map(|(task, _)| task) != Some(id) {
            return;
        }
        self.timers.delete = None;
        if self.master().is_some() || self.stabled {
            return;
        }
        self.request_removal(RemovalReason::Unclaimed);
        ctx.emit(CreatureEvent::RemovalRequested {
            creature: self.id,
            reason: RemovalReason::Unclaimed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::testing::*;

    #[test]
    fn unclaimed_pet_is_removed_when_timer_fires() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut pet = creature();
        pet.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();
        pet.release(&mut h.ctx());

        h.advance(3 * 24 * 3600);
        let task = h.tasks.pop_due(h.now).unwrap();
        pet.fire_task(task.id, task.task, &mut h.ctx());
        assert_eq!(pet.removal_requested(), Some(RemovalReason::Unclaimed));
    }

    #[test]
    fn stale_task_handles_are_ignored() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut pet = creature();
        pet.begin_delete_timer(&mut h.ctx());
        let stale = pet.timers().delete.unwrap().0;
        pet.begin_delete_timer(&mut h.ctx());

        pet.fire_task(stale, CreatureTask::DeleteUnclaimed, &mut h.ctx());
        assert_eq!(pet.removal_requested(), None);
        assert!(pet.timers().delete.is_some());
    }

    #[test]
    fn think_speed_follows_combat() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut wolf = creature();
        wolf.on_think(&mut h.ctx());
        assert_eq!(wolf.speeds().current, wolf.speeds().passive);
        wolf.combatant = Some(OTHER);
        wolf.on_think(&mut h.ctx());
        assert_eq!(wolf.speeds().current, wolf.speeds().active);
    }

    #[test]
    fn dead_creatures_do_not_think() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut wolf = creature();
        wolf.alive = false;
        assert_eq!(wolf.on_think(&mut h.ctx()), ThinkReport::default());
    }
}
