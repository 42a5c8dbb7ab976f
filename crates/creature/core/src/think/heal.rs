//! Healing the owner or itself with bandages.
//!
//! A heal takes a few seconds. When the timer fires the patient must still be
//! reachable, otherwise the attempt is dropped. Poison is cured before hits
//! are restored.

use std::time::Duration;

use crate::context::CreatureContext;
use crate::creature::Creature;
use crate::env::{Effect, Notice};
use crate::events::CreatureEvent;
use crate::schedule::{CreatureTask, TaskId};
use crate::state::EntityId;
use crate::stats::{ResourceKind, SkillName};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HealProfile {
    pub heals_self: bool,
    pub heals_owner: bool,
    /// Owner must be this close for a heal to start.
    pub start_range: i32,
    /// Patient must still be this close when it completes; `None` uses the
    /// perception range.
    pub end_range: Option<i32>,
    pub scalar: f64,

    pub trigger: f64,
    pub delay_ms: u64,
    pub interval_ms: u64,
    /// Keep bandaging while above the trigger but not yet at full hits.
    pub heal_fully: bool,

    pub owner_trigger: f64,
    pub owner_delay_ms: u64,
    pub owner_interval_ms: u64,
    pub owner_heal_fully: bool,

    /// Extra time when the patient is dead.
    pub dead_patient_ms: u64,
}

impl Default for HealProfile {
    fn default() -> Self {
        Self {
            heals_self: true,
            heals_owner: false,
            start_range: 2,
            end_range: None,
            scalar: 1.0,
            trigger: 0.78,
            delay_ms: 6_500,
            interval_ms: 0,
            heal_fully: true,
            owner_trigger: 0.78,
            owner_delay_ms: 6_500,
            owner_interval_ms: 30_000,
            owner_heal_fully: false,
            dead_patient_ms: 5_000,
        }
    }
}

/// A heal in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HealSequence {
    pub patient: Option<EntityId>,
    pub task: Option<TaskId>,
    pub owner: bool,
}

/// What the healer sees of the patient when the bandage lands.
struct Patient {
    alive: bool,
    poison: Option<u8>,
}

impl Creature {
    pub fn is_healing(&self) -> bool {
        self.heal.task.is_some()
    }

    pub fn heal_sequence(&self) -> &HealSequence {
        &self.heal
    }

    pub(super) fn think_heal(&mut self, ctx: &mut CreatureContext<'_>) -> bool {
        let Some(profile) = self.template.heal.clone() else {
            return false;
        };
        if !self.alive || self.is_healing() || self.bard.pacified {
            return false;
        }

        if let Some(owner) = self.control_master().filter(|_| profile.heals_owner) {
            if ctx.now >= self.cooldowns.next_heal_owner && self.owner_needs_heal(owner, &profile, ctx) {
                self.heal_start(owner, &profile, ctx);
                self.cooldowns.next_heal_owner =
                    ctx.now + Duration::from_millis(profile.owner_interval_ms);
                return true;
            }
        }

        let hurt = f64::from(self.hits()) < profile.trigger * f64::from(self.hits_max());
        if profile.heals_self && ctx.now >= self.cooldowns.next_heal && (hurt || self.poison.is_some()) {
            self.heal_start(self.id, &profile, ctx);
            self.cooldowns.next_heal = ctx.now + Duration::from_millis(profile.interval_ms);
            return true;
        }
        false
    }

    fn owner_needs_heal(&self, owner: EntityId, profile: &HealProfile, ctx: &CreatureContext<'_>) -> bool {
        let Some(info) = ctx.env.mobile(owner) else {
            return false;
        };
        info.is_live()
            && ctx.env.can_be_beneficial(self.id, owner)
            && info.location.map == self.location.map
            && self.location.in_range(&info.location, profile.start_range)
            && ctx.env.in_line_of_sight(&self.location, &info.location)
            && f64::from(info.hits) < profile.owner_trigger * f64::from(info.hits_max)
    }

    fn heal_start(&mut self, patient: EntityId, profile: &HealProfile, ctx: &mut CreatureContext<'_>) {
        let on_self = patient == self.id;
        let patient_alive = on_self || ctx.env.mobile(patient).is_some_and(|m| m.is_live());
        if !on_self {
            ctx.env.notify(patient, Notice::AttemptingToHeal { healer: self.id });
        }
        let mut delay = if on_self {
            profile.delay_ms
        } else {
            profile.owner_delay_ms
        };
        if !patient_alive {
            delay += profile.dead_patient_ms;
        }
        let due = ctx.now + Duration::from_millis(delay);
        self.heal = HealSequence {
            patient: Some(patient),
            task: Some(ctx.tasks.schedule(self.id, due, CreatureTask::HealComplete { patient })),
            owner: !on_self,
        };
        ctx.emit(CreatureEvent::HealStarted {
            creature: self.id,
            patient,
        });
    }

    fn patient(&self, patient: EntityId, profile: &HealProfile, ctx: &CreatureContext<'_>) -> Option<Patient> {
        if patient == self.id {
            return Some(Patient {
                alive: self.alive,
                poison: self.poison,
            });
        }
        let info = ctx.env.mobile(patient)?;
        let end_range = profile.end_range.unwrap_or(self.range_perception);
        let reachable = !info.deleted
            && ctx.env.can_be_beneficial(self.id, patient)
            && info.location.map == self.location.map
            && self.location.in_range(&info.location, end_range);
        reachable.then_some(Patient {
            alive: info.alive,
            poison: info.poison,
        })
    }

    fn abort_heal(&mut self, ctx: &mut CreatureContext<'_>) {
        self.heal = HealSequence::default();
        ctx.emit(CreatureEvent::HealAborted { creature: self.id });
    }

    pub(super) fn heal_complete(&mut self, id: TaskId, patient: EntityId, ctx: &mut CreatureContext<'_>) {
        if self.heal.task != Some(id) {
            return;
        }
        let Some(profile) = self.template.heal.clone() else {
            self.abort_heal(ctx);
            return;
        };
        if !self.alive || self.location.map.is_internal() {
            self.abort_heal(ctx);
            return;
        }
        let Some(state) = self.patient(patient, &profile, ctx) else {
            self.abort_heal(ctx);
            return;
        };

        let on_self = patient == self.id;
        let healing = self.skills.points(SkillName::Healing);
        let anatomy = self.skills.points(SkillName::Anatomy);

        if !state.alive {
            // nothing to bandage
        } else if let Some(level) = state.poison {
            let chance = (healing - 30.0) / 50.0 - f64::from(level) * 0.1;
            if healing >= 60.0 && anatomy >= 60.0 && ctx.rng.chance(chance) {
                let cured = if on_self {
                    self.poison.take().is_some()
                } else {
                    ctx.env.cure_poison(patient, self.id)
                };
                if cured {
                    if !on_self {
                        ctx.env.notify(patient, Notice::CuredOfPoison);
                    }
                    ctx.emit(CreatureEvent::Cured {
                        creature: self.id,
                        patient,
                    });
                }
            }
        } else if ctx.rng.chance((healing + 10.0) / 100.0) {
            let min = anatomy / 10.0 + healing / 6.0 + 4.0;
            let mut max = anatomy / 8.0 + healing / 3.0 + 4.0;
            if on_self {
                max += 10.0;
            }
            let amount = ((min + ctx.rng.next_f64() * (max - min)) * profile.scalar) as i32;
            if on_self {
                self.set_resource(ResourceKind::Hits, self.hits() + amount);
            } else {
                ctx.env.heal(patient, amount);
            }
            ctx.emit(CreatureEvent::Healed {
                creature: self.id,
                patient,
                amount,
            });
        }

        ctx.env.emit(self.id, Effect::HealSound { patient });
        self.heal = HealSequence::default();

        let (trigger, fully) = if on_self {
            (profile.trigger, profile.heal_fully)
        } else {
            (profile.owner_trigger, profile.owner_heal_fully)
        };
        let after = if on_self {
            Some((self.hits(), self.hits_max()))
        } else {
            ctx.env.mobile(patient).map(|m| (m.hits, m.hits_max))
        };
        if let Some((hits, max)) = after {
            if fully && f64::from(hits) >= trigger * f64::from(max) && hits < max {
                self.heal_start(patient, &profile, ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::testing::*;
    use crate::env::{SandboxEnv, SandboxMobile};
    use crate::state::{Location, MapId, Point3D};

    fn medic(profile: HealProfile) -> Creature {
        let mut t = template();
        t.heal = Some(profile);
        let mut c = creature_from(t);
        c.skills.set_fixed(SkillName::Healing, 1000);
        c.skills.set_fixed(SkillName::Anatomy, 1000);
        c
    }

    fn run_due(c: &mut Creature, h: &mut Harness) {
        while let Some(task) = h.tasks.pop_due(h.now) {
            c.fire_task(task.id, task.task, &mut h.ctx());
        }
    }

    #[test]
    fn self_heal_below_trigger() {
        let mut h = Harness::new(SandboxEnv::new());
        let mut c = medic(HealProfile::default());
        c.set_resource(ResourceKind::Hits, 50);

        assert!(c.think_heal(&mut h.ctx()));
        assert!(c.is_healing());
        assert!(!c.think_heal(&mut h.ctx()), "already bandaging");

        h.now = h.now + Duration::from_millis(6_500);
        run_due(&mut c, &mut h);
        // 100 anatomy, 100 healing: at least 10 + 16.6 + 4
        assert_eq!(c.hits(), 80);
        assert!(!c.is_healing());
        assert!(c.think_heal(&mut h.ctx()), "still under the trigger");
    }

    #[test]
    fn healthy_creature_does_not_heal() {
        let mut h = Harness::new(SandboxEnv::new());
        let mut c = medic(HealProfile::default());
        assert!(!c.think_heal(&mut h.ctx()));
    }

    #[test]
    fn heal_fully_keeps_going_above_trigger() {
        let mut h = Harness::new(SandboxEnv::new());
        let mut c = medic(HealProfile::default());
        c.set_resource(ResourceKind::Hits, 70);
        c.think_heal(&mut h.ctx());
        h.now = h.now + Duration::from_millis(6_500);
        run_due(&mut c, &mut h);
        assert_eq!(c.hits(), 100);
        assert!(c.is_healing(), "restarted toward full");
    }

    #[test]
    fn poisoned_self_is_cured_first() {
        let mut h = Harness::new(SandboxEnv::new());
        let mut c = medic(HealProfile::default());
        c.set_poison(Some(2));
        assert!(c.think_heal(&mut h.ctx()));
        h.now = h.now + Duration::from_millis(6_500);
        run_due(&mut c, &mut h);
        assert_eq!(c.poison(), None);
        assert_eq!(c.hits(), 120);
        assert!(h.events.contains(&CreatureEvent::Cured { creature: PET, patient: PET }));
    }

    #[test]
    fn unskilled_healers_cannot_cure() {
        let mut h = Harness::new(SandboxEnv::new());
        let mut c = medic(HealProfile::default());
        c.skills.set_fixed(SkillName::Anatomy, 500);
        c.set_poison(Some(1));
        c.think_heal(&mut h.ctx());
        h.now = h.now + Duration::from_millis(6_500);
        run_due(&mut c, &mut h);
        assert_eq!(c.poison(), Some(1));
    }

    fn owner_profile() -> HealProfile {
        HealProfile {
            heals_self: false,
            heals_owner: true,
            ..HealProfile::default()
        }
    }

    fn owner_env(hits: i32) -> SandboxEnv {
        let mut env = SandboxEnv::new();
        env.insert(SandboxMobile::player(MASTER, here()).with_hits(hits, 100));
        env
    }

    #[test]
    fn owner_heal_lands_on_master() {
        let mut h = Harness::new(owner_env(50));
        let mut c = medic(owner_profile());
        c.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();

        assert!(c.think_heal(&mut h.ctx()));
        assert!(h.env.log.notices.contains(&(MASTER, Notice::AttemptingToHeal { healer: PET })));
        assert_eq!(c.cooldowns().next_heal_owner, h.now + Duration::from_secs(30));

        h.now = h.now + Duration::from_millis(6_500);
        run_due(&mut c, &mut h);
        assert_eq!(h.env.log.heals, vec![(MASTER, 30)]);
        assert!(!c.is_healing(), "owner heals do not chain");
    }

    #[test]
    fn owner_walking_away_aborts() {
        let mut h = Harness::new(owner_env(50));
        let mut c = medic(owner_profile());
        c.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();
        c.think_heal(&mut h.ctx());

        h.env.get_mut(MASTER).unwrap().info.location =
            Location::new(MapId::TRAMMEL, Point3D::new(200, 100, 0));
        h.now = h.now + Duration::from_millis(6_500);
        run_due(&mut c, &mut h);
        assert!(h.env.log.heals.is_empty());
        assert!(h.events.contains(&CreatureEvent::HealAborted { creature: PET }));
    }

    #[test]
    fn distant_or_healthy_owner_is_ignored() {
        let mut h = Harness::new(owner_env(90));
        let mut c = medic(owner_profile());
        c.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();
        assert!(!c.think_heal(&mut h.ctx()));

        h.env.get_mut(MASTER).unwrap().info.hits = 10;
        h.env.get_mut(MASTER).unwrap().info.location =
            Location::new(MapId::TRAMMEL, Point3D::new(105, 100, 0));
        assert!(!c.think_heal(&mut h.ctx()));
    }
}
