//! Breath weapon.
//!
//! ```text
//! Idle ──start──► AngerPlayed ──BreathEffect──► EffectPlayed ──BreathDamage──► DamageApplied
//!                     │                              │
//!                     └──── target invalid ──────────┴──► Idle (aborted)
//! ```

use std::time::Duration;

use crate::context::CreatureContext;
use crate::creature::Creature;
use crate::env::{Effect, MobileInfo};
use crate::events::CreatureEvent;
use crate::schedule::{CreatureTask, TaskId};
use crate::state::EntityId;

/// Breath tuning carried by a species template.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BreathProfile {
    /// Fraction of the breather's current hits dealt as damage.
    pub damage_scalar: f64,
    pub max_damage: i32,
    /// Reach in tiles; `None` uses the perception range.
    pub range: Option<i32>,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// How long the breather stands still while inhaling.
    pub stall_ms: u64,
    pub effect_delay_ms: u64,
    pub damage_delay_ms: u64,
    /// A breath may only start this soon after the creature became eligible.
    pub window_ms: u64,
}

impl Default for BreathProfile {
    fn default() -> Self {
        Self {
            damage_scalar: 0.05,
            max_damage: 200,
            range: None,
            min_delay_ms: 30_000,
            max_delay_ms: 45_000,
            stall_ms: 1_000,
            effect_delay_ms: 1_300,
            damage_delay_ms: 1_000,
            window_ms: 30_000,
        }
    }
}

impl BreathProfile {
    pub fn damage_for(&self, hits: i32) -> i32 {
        ((f64::from(hits) * self.damage_scalar) as i32).min(self.max_damage)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BreathStage {
    #[default]
    Idle,
    AngerPlayed,
    EffectPlayed,
    DamageApplied,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BreathSequence {
    pub stage: BreathStage,
    pub target: Option<EntityId>,
    pub task: Option<TaskId>,
}

impl BreathSequence {
    pub fn in_progress(&self) -> bool {
        matches!(self.stage, BreathStage::AngerPlayed | BreathStage::EffectPlayed)
    }
}

impl Creature {
    pub fn breath_sequence(&self) -> &BreathSequence {
        &self.breath
    }

    fn breath_range(&self, profile: &BreathProfile) -> i32 {
        profile.range.unwrap_or(self.range_perception)
    }

    fn breath_target_valid(&self, target: &MobileInfo, ctx: &CreatureContext<'_>) -> bool {
        target.is_live()
            && target.location.map == self.location.map
            && ctx.env.can_be_harmful(self.id, target.id)
    }

    /// Rolls for a breath against the combatant and pushes the next window.
    pub(super) fn think_breath(&mut self, ctx: &mut CreatureContext<'_>) -> bool {
        let Some(profile) = self.template.breath.clone() else {
            return false;
        };
        if ctx.now < self.cooldowns.next_breath || self.breath.in_progress() {
            return false;
        }
        let Some(target) = self.combatant.and_then(|id| ctx.env.mobile(id)) else {
            return false;
        };
        let in_reach = self
            .location
            .in_range(&target.location, self.breath_range(&profile))
            && ctx.env.in_line_of_sight(&self.location, &target.location);
        if !self.breath_target_valid(&target, ctx) || !in_reach || self.bard.pacified {
            return false;
        }

        let within_window =
            ctx.now.since(self.cooldowns.next_breath) < Duration::from_millis(profile.window_ms);
        let started = within_window && ctx.rng.coin_flip();
        if started {
            self.breath_start(target.id, &profile, ctx);
        }
        self.cooldowns.next_breath =
            ctx.now + ctx.rng.duration_between(profile.min_delay_ms, profile.max_delay_ms);
        started
    }

    fn breath_start(&mut self, target: EntityId, profile: &BreathProfile, ctx: &mut CreatureContext<'_>) {
        self.stalled_until = ctx.now + Duration::from_millis(profile.stall_ms);
        ctx.env.emit(self.id, Effect::BreathAnger);
        let due = ctx.now + Duration::from_millis(profile.effect_delay_ms);
        self.breath = BreathSequence {
            stage: BreathStage::AngerPlayed,
            target: Some(target),
            task: Some(ctx.tasks.schedule(self.id, due, CreatureTask::BreathEffect { target })),
        };
        ctx.emit(CreatureEvent::BreathStarted {
            creature: self.id,
            target,
        });
    }

    fn breath_step_target(
        &mut self,
        id: TaskId,
        expected: BreathStage,
        target: EntityId,
        ctx: &mut CreatureContext<'_>,
    ) -> Option<BreathProfile> {
        if self.breath.task != Some(id) || self.breath.stage != expected {
            return None;
        }
        let profile = self.template.breath.clone();
        let valid = self.alive
            && match ctx.env.mobile(target) {
                Some(info) => self.breath_target_valid(&info, ctx),
                None => false,
            };
        if profile.is_none() || !valid {
            self.breath = BreathSequence::default();
            ctx.emit(CreatureEvent::BreathAborted { creature: self.id });
            return None;
        }
        profile
    }

    pub(super) fn breath_effect(&mut self, id: TaskId, target: EntityId, ctx: &mut CreatureContext<'_>) {
        let Some(profile) = self.breath_step_target(id, BreathStage::AngerPlayed, target, ctx) else {
            return;
        };
        ctx.env.emit(self.id, Effect::BreathVisual { target });
        let due = ctx.now + Duration::from_millis(profile.damage_delay_ms);
        self.breath.stage = BreathStage::EffectPlayed;
        self.breath.task = Some(ctx.tasks.schedule(self.id, due, CreatureTask::BreathDamage { target }));
    }

    pub(super) fn breath_damage(&mut self, id: TaskId, target: EntityId, ctx: &mut CreatureContext<'_>) {
        let Some(profile) = self.breath_step_target(id, BreathStage::EffectPlayed, target, ctx) else {
            return;
        };
        let damage = profile.damage_for(self.hits());
        ctx.env.apply_damage(target, damage, self.id);
        self.breath.stage = BreathStage::DamageApplied;
        self.breath.task = None;
        ctx.emit(CreatureEvent::BreathLanded {
            creature: self.id,
            target,
            damage,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::testing::*;
    use crate::env::{SandboxEnv, SandboxMobile, ScriptedRng};
    use crate::state::{Location, MapId, Point3D};

    fn dragon() -> Creature {
        let mut t = template();
        t.breath = Some(BreathProfile::default());
        let mut c = creature_from(t);
        c.set_hits(1000);
        c.combatant = Some(OTHER);
        c
    }

    fn lair() -> SandboxEnv {
        let mut env = SandboxEnv::new();
        let spot = Location::new(MapId::TRAMMEL, Point3D::new(105, 100, 0));
        env.insert(SandboxMobile::player(OTHER, spot).with_hits(500, 500));
        env
    }

    fn eligible(c: &mut Creature, h: &Harness) {
        c.cooldowns.next_breath = h.now;
    }

    fn run_due(c: &mut Creature, h: &mut Harness) {
        while let Some(task) = h.tasks.pop_due(h.now) {
            c.fire_task(task.id, task.task, &mut h.ctx());
        }
    }

    #[test]
    fn full_breath_sequence() {
        let mut h = Harness::new(lair()).with_rng(ScriptedRng::constant(0.6));
        let mut c = dragon();
        eligible(&mut c, &h);

        assert!(c.think_breath(&mut h.ctx()));
        assert_eq!(c.breath_sequence().stage, BreathStage::AngerPlayed);
        assert!(c.is_stalled(h.now));
        // 30s + 0.6 * 15s
        assert_eq!(c.cooldowns().next_breath, h.now + Duration::from_secs(39));

        h.now = h.now + Duration::from_millis(1_300);
        run_due(&mut c, &mut h);
        assert_eq!(c.breath_sequence().stage, BreathStage::EffectPlayed);
        assert!(h.env.log.effects.contains(&(PET, Effect::BreathVisual { target: OTHER })));

        h.now = h.now + Duration::from_millis(1_000);
        run_due(&mut c, &mut h);
        assert_eq!(c.breath_sequence().stage, BreathStage::DamageApplied);
        assert_eq!(h.env.log.damage, vec![(OTHER, 50, PET)]);
    }

    #[test]
    fn damage_is_capped() {
        let profile = BreathProfile::default();
        assert_eq!(profile.damage_for(1000), 50);
        assert_eq!(profile.damage_for(10_000), 200);
        assert_eq!(profile.damage_for(0), 0);
    }

    #[test]
    fn target_leaving_aborts_the_sequence() {
        let mut h = Harness::new(lair()).with_rng(ScriptedRng::constant(0.6));
        let mut c = dragon();
        eligible(&mut c, &h);
        c.think_breath(&mut h.ctx());

        h.env.get_mut(OTHER).unwrap().info.alive = false;
        h.now = h.now + Duration::from_secs(2);
        run_due(&mut c, &mut h);

        assert_eq!(c.breath_sequence().stage, BreathStage::Idle);
        assert!(h.env.log.damage.is_empty());
        assert!(h.events.contains(&CreatureEvent::BreathAborted { creature: PET }));
    }

    #[test]
    fn stale_eligibility_only_reschedules() {
        let mut h = Harness::new(lair()).with_rng(ScriptedRng::constant(0.6));
        let mut c = dragon();
        // eligible since the creature was built, long ago
        assert!(!c.think_breath(&mut h.ctx()));
        assert!(c.cooldowns().next_breath > h.now);
        assert!(h.tasks.is_empty());
    }

    #[test]
    fn losing_the_coin_flip_waits_for_next_window() {
        let mut h = Harness::new(lair()).with_rng(ScriptedRng::constant(0.2));
        let mut c = dragon();
        eligible(&mut c, &h);
        assert!(!c.think_breath(&mut h.ctx()));
        assert_eq!(c.cooldowns().next_breath, h.now + Duration::from_secs(33));
    }

    #[test]
    fn out_of_reach_or_pacified_does_nothing() {
        let mut h = Harness::new(lair()).with_rng(ScriptedRng::constant(0.6));
        let mut c = dragon();
        eligible(&mut c, &h);
        h.env.get_mut(OTHER).unwrap().info.location.point = Point3D::new(130, 100, 0);
        assert!(!c.think_breath(&mut h.ctx()));
        assert_eq!(c.cooldowns().next_breath, h.now);

        h.env.get_mut(OTHER).unwrap().info.location.point = Point3D::new(105, 100, 0);
        h.env.hide(OTHER);
        assert!(!c.think_breath(&mut h.ctx()));

        let mut h = Harness::new(lair()).with_rng(ScriptedRng::constant(0.6));
        c.pacify(EntityId(50), h.now + Duration::from_secs(30), &mut h.ctx());
        c.combatant = Some(OTHER);
        eligible(&mut c, &h);
        assert!(!c.think_breath(&mut h.ctx()));
    }

    #[test]
    fn species_without_breath_never_breathe() {
        let mut h = Harness::new(lair()).with_rng(ScriptedRng::constant(0.6));
        let mut c = creature();
        c.combatant = Some(OTHER);
        assert!(!c.think_breath(&mut h.ctx()));
    }
}
