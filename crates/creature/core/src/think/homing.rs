//! Drifting back to the spawn point, and the idle pauses wanderers take.

use crate::combat::FightMode;
use crate::context::CreatureContext;
use crate::creature::Creature;
use crate::env::Effect;
use crate::events::CreatureEvent;
use crate::schedule::{CreatureTask, TaskId};
use crate::state::GameTime;

/// Result of one homing check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HomingOutcome {
    /// Not bound to a home, or already inside the home range.
    #[default]
    NotApplicable,
    /// Busy fighting, or the step roll failed.
    Skipped,
    Stepped,
    Blocked { failures: u32 },
    Teleported,
}

impl Creature {
    /// Wild creatures that seek home and have one, unless a return is queued.
    pub fn returns_to_home(&self) -> bool {
        self.seeks_home && self.home.is_some() && !self.return_queued && self.is_wild()
    }

    /// Still tied to a live spawner on the creature's own map.
    pub fn is_spawner_bound(&self) -> bool {
        let Some(spawner) = self.spawner else {
            return false;
        };
        spawner.map == self.location.map
            && !self.location.map.is_internal()
            && self.fight_mode != FightMode::None
            && self.range_home >= 0
            && self.is_wild()
    }

    pub fn is_return_queued(&self) -> bool {
        self.return_queued
    }

    fn away_from_home(&self, slack: i32) -> bool {
        self.home
            .is_some_and(|home| !self.location.point.in_range(&home, self.range_home + slack))
    }

    pub(super) fn think_homing(&mut self, ctx: &mut CreatureContext<'_>) -> HomingOutcome {
        let Some(home) = self.home else {
            self.homing_failures = 0;
            return HomingOutcome::NotApplicable;
        };
        if !(self.returns_to_home() && self.is_spawner_bound() && self.away_from_home(0)) {
            self.homing_failures = 0;
            return HomingOutcome::NotApplicable;
        }
        if self.combatant.is_some() || self.warmode || !ctx.rng.chance(ctx.config.homing.step_chance) {
            return HomingOutcome::Skipped;
        }

        match ctx.env.step_toward(self.id, &self.location, &home) {
            Some(point) => {
                self.location.point = point;
                self.homing_failures = 0;
                HomingOutcome::Stepped
            }
            None => {
                self.homing_failures += 1;
                if self.homing_failures < ctx.config.homing.max_failures {
                    return HomingOutcome::Blocked {
                        failures: self.homing_failures,
                    };
                }
                self.homing_failures = 0;
                self.location.point = home;
                ctx.emit(CreatureEvent::TeleportedHome {
                    creature: self.id,
                    home,
                });
                HomingOutcome::Teleported
            }
        }
    }

    /// Called when the creature's sector stops being simulated.
    ///
    /// A spawner-bound creature that wandered past its home range is queued
    /// to be put back once the sector has stayed asleep for a while.
    pub fn on_sector_deactivate(&mut self, ctx: &mut CreatureContext<'_>) -> bool {
        let homing = &ctx.config.homing;
        if !(self.returns_to_home() && self.is_spawner_bound() && self.away_from_home(homing.sector_slack)) {
            return false;
        }
        let (min, max) = homing.sector_return_delay_ms;
        let due = ctx.now + ctx.rng.duration_between(min, max);
        self.timers.return_home = Some(ctx.tasks.schedule(self.id, due, CreatureTask::ReturnHome));
        self.return_queued = true;
        true
    }

    pub(super) fn return_home(&mut self, id: TaskId, ctx: &mut CreatureContext<'_>) {
        if self.timers.return_home != Some(id) {
            return;
        }
        self.timers.return_home = None;
        let queued = std::mem::take(&mut self.return_queued);
        let Some(home) = self.home else {
            return;
        };
        if queued && self.is_spawner_bound() && !ctx.env.sector_active(&self.location) {
            self.location.point = home;
            ctx.emit(CreatureEvent::TeleportedHome {
                creature: self.id,
                home,
            });
        }
    }

    pub fn is_idle(&self, now: GameTime) -> bool {
        self.idle_until.is_some_and(|until| now < until)
    }

    /// Occasionally pauses a wandering creature; true while it stands still.
    pub(crate) fn check_idle(&mut self, ctx: &mut CreatureContext<'_>) -> bool {
        if self.is_idle(ctx.now) {
            return true;
        }
        self.idle_until = None;
        if !ctx.rng.chance(ctx.config.combat.idle_chance) {
            return false;
        }
        let (min, max) = ctx.config.combat.idle_ms;
        self.idle_until = Some(ctx.now + ctx.rng.duration_between(min, max));
        ctx.env.emit(self.id, Effect::IdleAnimation);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::SpawnerLink;
    use crate::creature::testing::*;
    use crate::env::{SandboxEnv, ScriptedRng};
    use crate::state::{EntityId, MapId, Point3D};

    const SPAWNER: EntityId = EntityId(900);
    const HOME: Point3D = Point3D::new(130, 100, 0);

    fn homebody() -> Creature {
        let mut c = creature();
        c.set_seeks_home(true);
        c.set_home(Some(HOME));
        c.set_spawner(Some(SpawnerLink {
            id: SPAWNER,
            map: MapId::TRAMMEL,
            unlink_on_taming: false,
        }));
        c
    }

    #[test]
    fn steps_toward_home_when_far() {
        let mut h = Harness::new(SandboxEnv::new());
        let mut c = homebody();
        assert_eq!(c.think_homing(&mut h.ctx()), HomingOutcome::Stepped);
        assert_eq!(c.location().point, Point3D::new(101, 100, 0));
    }

    #[test]
    fn fighting_or_unlucky_creatures_stay_put() {
        let mut h = Harness::new(SandboxEnv::new()).with_rng(ScriptedRng::constant(0.5));
        let mut c = homebody();
        assert_eq!(c.think_homing(&mut h.ctx()), HomingOutcome::Skipped);

        let mut h = Harness::new(SandboxEnv::new());
        c.warmode = true;
        assert_eq!(c.think_homing(&mut h.ctx()), HomingOutcome::Skipped);
    }

    #[test]
    fn repeated_blocks_teleport_home() {
        let mut h = Harness::new(SandboxEnv::new());
        h.env.wall_in(&here());
        let mut c = homebody();
        for failures in 1..5 {
            assert_eq!(c.think_homing(&mut h.ctx()), HomingOutcome::Blocked { failures });
        }
        assert_eq!(c.think_homing(&mut h.ctx()), HomingOutcome::Teleported);
        assert_eq!(c.location().point, HOME);
        assert_eq!(c.homing_failures(), 0);
        assert_eq!(c.think_homing(&mut h.ctx()), HomingOutcome::NotApplicable);
    }

    #[test]
    fn pets_and_unbound_creatures_do_not_home() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut c = homebody();
        c.set_spawner(None);
        assert_eq!(c.think_homing(&mut h.ctx()), HomingOutcome::NotApplicable);

        let mut pet = homebody();
        pet.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();
        assert!(!pet.returns_to_home());
    }

    #[test]
    fn sleeping_sector_sends_wanderer_home() {
        let mut h = Harness::new(SandboxEnv::new());
        let mut c = homebody();
        assert!(c.on_sector_deactivate(&mut h.ctx()));
        assert!(c.is_return_queued());
        assert!(!c.on_sector_deactivate(&mut h.ctx()), "already queued");

        h.env.set_sector_active(MapId::TRAMMEL, false);
        h.advance(15);
        let task = h.tasks.pop_due(h.now).unwrap();
        c.fire_task(task.id, task.task, &mut h.ctx());
        assert_eq!(c.location().point, HOME);
        assert!(!c.is_return_queued());
    }

    #[test]
    fn woken_sector_cancels_the_return() {
        let mut h = Harness::new(SandboxEnv::new());
        let mut c = homebody();
        c.on_sector_deactivate(&mut h.ctx());
        h.advance(60);
        let task = h.tasks.pop_due(h.now).unwrap();
        c.fire_task(task.id, task.task, &mut h.ctx());
        assert_eq!(c.location(), here());
        assert!(!c.is_return_queued());
    }

    #[test]
    fn within_slack_no_return_is_queued() {
        let mut h = Harness::new(SandboxEnv::new());
        let mut c = homebody();
        c.set_home(Some(Point3D::new(114, 100, 0)));
        assert!(!c.on_sector_deactivate(&mut h.ctx()));
    }

    #[test]
    fn idling_lasts_its_duration() {
        let mut h = Harness::new(SandboxEnv::new());
        let mut c = creature();
        assert!(c.check_idle(&mut h.ctx()));
        assert!(c.is_idle(h.now));
        assert!(h.env.log.effects_of(PET).any(|e| *e == Effect::IdleAnimation));

        h.advance(15);
        h.rng = ScriptedRng::constant(0.9);
        assert!(!c.check_idle(&mut h.ctx()));
    }
}
