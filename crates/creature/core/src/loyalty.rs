//! Loyalty and control chance.
//!
//! Loyalty is a 0..=100 happiness counter. It drops every hour, rises with
//! successful commands and feeding, and reduces the chance that a pet obeys.
//! A pet whose loyalty reaches zero abandons its master.

use crate::config::{ControlChanceConfig, EngineConfig};
use crate::context::CreatureContext;
use crate::creature::{Creature, FoodType};
use crate::env::{Effect, MobileOracle, Notice};
use crate::events::{CreatureEvent, RemovalReason};
use crate::state::EntityId;
use crate::stats::{ResourceKind, SkillName};

/// Chance to obey in thousandths. May be negative for very unhappy pets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ControlChance(i32);

impl ControlChance {
    pub const CERTAIN: Self = Self(1000);

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Sampling probability in `[0, 1]`.
    pub fn probability(self) -> f64 {
        (f64::from(self.0) / 1000.0).clamp(0.0, 1.0)
    }
}

/// The control-chance curve for given skills (tenths of a point).
pub fn control_chance(
    taming: u32,
    lore: u32,
    min_tame_skill: f64,
    loyalty: i32,
    config: &ControlChanceConfig,
) -> ControlChance {
    if min_tame_skill <= config.certain_tame_floor {
        return ControlChance::CERTAIN;
    }
    let difficulty = (min_tame_skill * 10.0) as i32;
    let weighted = ((taming as i32) * 4 + lore as i32) / 5;
    let bonus = weighted - difficulty;
    let bonus = if bonus <= 0 {
        bonus * config.under_skilled_scale
    } else {
        bonus * config.over_skilled_scale
    };
    let chance = (config.base + bonus).clamp(config.floor, config.ceiling);
    let missing = EngineConfig::MAX_LOYALTY - loyalty.clamp(0, EngineConfig::MAX_LOYALTY);
    ControlChance(chance - missing * config.loyalty_penalty)
}

/// Result of one hourly upkeep pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpkeepOutcome {
    Unchanged,
    Decayed { loyalty: i32 },
    Distressed { loyalty: i32 },
    Abandoned,
    RemovalStep { step: u32 },
    Removed,
}

impl Creature {
    /// How likely `mobile` is to get this creature to obey.
    pub fn control_chance<O: MobileOracle + ?Sized>(
        &self,
        mobile: EntityId,
        use_base_skill: bool,
        oracle: &O,
        config: &ControlChanceConfig,
    ) -> ControlChance {
        if self.is_summoned() {
            return ControlChance::CERTAIN;
        }
        if oracle
            .mobile(mobile)
            .is_some_and(|m| m.access.overrides_control())
        {
            return ControlChance::CERTAIN;
        }
        let taming = oracle.skill(mobile, SkillName::AnimalTaming, use_base_skill);
        let lore = oracle.skill(mobile, SkillName::AnimalLore, use_base_skill);
        control_chance(taming, lore, self.min_tame_skill, self.loyalty, config)
    }

    /// Rolls whether the creature obeys `mobile`, adjusting loyalty either way.
    pub fn check_control_chance(&mut self, mobile: EntityId, ctx: &mut CreatureContext<'_>) -> bool {
        let chance = self.control_chance(mobile, false, &*ctx.env, &ctx.config.control);
        let loyalty = &ctx.config.loyalty;
        let obeyed = ctx.rng.chance(chance.probability());
        if obeyed {
            self.set_loyalty(self.loyalty + loyalty.command_success_gain);
        } else {
            ctx.env.emit(self.id, Effect::AngerSound);
            ctx.env.emit(self.id, Effect::AngerAnimation);
            self.set_loyalty(self.loyalty - loyalty.command_failure_loss);
        }
        ctx.emit(CreatureEvent::LoyaltyChanged {
            creature: self.id,
            loyalty: self.loyalty,
        });
        obeyed
    }

    /// Hourly pass: loyalty decay for pets, removal counting for strays.
    pub fn loyalty_upkeep(&mut self, ctx: &mut CreatureContext<'_>) -> UpkeepOutcome {
        if self.deleted || self.removal.is_some() {
            return UpkeepOutcome::Unchanged;
        }
        if self.is_controlled() {
            self.remove_step = 0;
            if !self.is_commandable() || self.stabled {
                return UpkeepOutcome::Unchanged;
            }
            return self.decay_loyalty(ctx);
        }
        if self.is_wild() && self.counts_toward_removal(ctx) {
            self.remove_step += 1;
            if self.remove_step >= ctx.config.upkeep.untamed_removal_steps {
                self.request_removal(RemovalReason::Untamed);
                ctx.emit(CreatureEvent::RemovalRequested {
                    creature: self.id,
                    reason: RemovalReason::Untamed,
                });
                return UpkeepOutcome::Removed;
            }
            return UpkeepOutcome::RemovalStep {
                step: self.remove_step,
            };
        }
        self.remove_step = 0;
        UpkeepOutcome::Unchanged
    }

    fn decay_loyalty(&mut self, ctx: &mut CreatureContext<'_>) -> UpkeepOutcome {
        self.set_loyalty(self.loyalty - ctx.config.loyalty.decay_step);
        ctx.emit(CreatureEvent::LoyaltyChanged {
            creature: self.id,
            loyalty: self.loyalty,
        });
        if self.loyalty <= 0 {
            self.abandon(ctx);
            return UpkeepOutcome::Abandoned;
        }
        if self.loyalty < ctx.config.loyalty.distress_threshold {
            ctx.env.emit(self.id, Effect::DistressSound);
            if let Some(master) = self.control_master() {
                ctx.env.notify(master, Notice::PetLooksUnhappy { pet: self.id });
            }
            ctx.emit(CreatureEvent::LoyaltyDistress { creature: self.id });
            return UpkeepOutcome::Distressed {
                loyalty: self.loyalty,
            };
        }
        UpkeepOutcome::Decayed {
            loyalty: self.loyalty,
        }
    }

    fn abandon(&mut self, ctx: &mut CreatureContext<'_>) {
        let master = self.control_master();
        if let Some(master) = master {
            ctx.env.notify(master, Notice::PetAbandoned { pet: self.id });
        }
        self.control.target = None;
        self.release(ctx);
        self.abandoned = true;
        ctx.emit(CreatureEvent::Abandoned {
            creature: self.id,
            master,
        });
    }

    fn counts_toward_removal(&self, ctx: &CreatureContext<'_>) -> bool {
        let housed = ctx.env.in_house_region(&self.location) && !self.template.traits.invulnerable;
        housed || (self.remove_if_untamed && self.spawner.is_none())
    }

    /// Offers `amount` units of `food` from `from`.
    ///
    /// Only the master or a pet friend may feed a pet, and only with food the
    /// species eats. Returns whether the food was accepted.
    pub fn feed(
        &mut self,
        from: EntityId,
        food: FoodType,
        amount: u32,
        ctx: &mut CreatureContext<'_>,
    ) -> bool {
        let trusted = self.control_master() == Some(from) || self.is_pet_friend(from);
        if !self.alive || !self.is_controlled() || !trusted {
            return false;
        }
        if amount == 0 || food.is_empty() || !self.template.food.intersects(food) {
            ctx.env.notify(from, Notice::FoodRefused { pet: self.id });
            return false;
        }

        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        let stam_gain = if food.contains(FoodType::GOLD) {
            amount.saturating_sub(50)
        } else {
            amount.saturating_mul(15).saturating_sub(50)
        };
        if stam_gain > 0 {
            let stam = self.stam().saturating_add(stam_gain);
            self.set_resource(ResourceKind::Stam, stam);
        }

        let gain = ctx.config.loyalty.feed_gain;
        let chance = ctx.config.loyalty.feed_chance;
        let mut happier = false;
        for _ in 0..amount {
            if self.loyalty >= EngineConfig::MAX_LOYALTY {
                break;
            }
            if ctx.rng.chance(chance) {
                self.set_loyalty(self.loyalty + gain);
                happier = true;
            }
        }

        ctx.env.notify(from, Notice::FoodAccepted { pet: self.id });
        ctx.emit(CreatureEvent::Fed {
            creature: self.id,
            by: from,
        });
        if happier {
            ctx.emit(CreatureEvent::LoyaltyChanged {
                creature: self.id,
                loyalty: self.loyalty,
            });
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::testing::*;
    use crate::env::{AccessLevel, FollowerLedger, SandboxMobile, ScriptedRng};
    use crate::state::{MapId, Point3D};
    use std::time::Duration;

    fn cfg() -> ControlChanceConfig {
        ControlChanceConfig::default()
    }

    #[test]
    fn easy_species_always_obey() {
        for taming in [0, 300, 1000] {
            for loyalty in [0, 50, 100] {
                let chance = control_chance(taming, 0, 0.0, loyalty, &cfg());
                assert_eq!(chance.probability(), 1.0);
            }
        }
        assert_eq!(control_chance(0, 0, 29.1, 0, &cfg()), ControlChance::CERTAIN);
    }

    #[test]
    fn curve_values() {
        // weighted 1000 vs difficulty 831: capped at 990
        assert_eq!(control_chance(1000, 1000, 83.1, 100, &cfg()).raw(), 990);
        assert_eq!(control_chance(1000, 1000, 83.1, 50, &cfg()).raw(), 490);
        // far under-skilled: floored at 200
        assert_eq!(control_chance(500, 500, 83.1, 100, &cfg()).raw(), 200);
        assert_eq!(control_chance(500, 500, 83.1, 0, &cfg()).probability(), 0.0);
        // weighted 840, difficulty 800: 700 + 40 * 6
        assert_eq!(control_chance(850, 800, 80.0, 100, &cfg()).raw(), 940);
        // weighted 780, difficulty 800: 700 - 20 * 14
        assert_eq!(control_chance(775, 800, 80.0, 100, &cfg()).raw(), 420);
        assert_eq!(control_chance(775, 800, 80.0, 90, &cfg()).raw(), 320);
    }

    #[test]
    fn curve_is_monotone_and_bounded() {
        let difficulties = [35.1, 59.1, 83.1, 95.1, 110.0];
        for difficulty in difficulties {
            for loyalty in (0..=100).step_by(10) {
                let mut last = f64::MIN;
                for taming in (0..=1200).step_by(50) {
                    let p = control_chance(taming, 600, difficulty, loyalty, &cfg()).probability();
                    assert!((0.0..=1.0).contains(&p));
                    assert!(p >= last, "taming {taming} at {difficulty}");
                    last = p;
                }
            }
            for taming in (0..=1200).step_by(100) {
                let mut last = f64::MIN;
                for loyalty in (0..=100).step_by(5) {
                    let p = control_chance(taming, taming, difficulty, loyalty, &cfg()).probability();
                    assert!(p >= last);
                    last = p;
                }
            }
        }
    }

    #[test]
    fn staff_and_summons_are_certain() {
        let mut env = env_with_master(0, 5);
        env.insert(SandboxMobile::player(OTHER, here()).with_access(AccessLevel::GameMaster));
        let pet = creature();
        assert_eq!(
            pet.control_chance(OTHER, false, &env, &cfg()),
            ControlChance::CERTAIN
        );
        assert!(pet.control_chance(MASTER, false, &env, &cfg()).raw() < 1000);

        let mut h = Harness::new(env);
        let mut summon = creature();
        summon
            .summon(MASTER, true, Duration::from_secs(60), here(), &mut h.ctx())
            .unwrap();
        assert_eq!(
            summon.control_chance(MASTER, false, &h.env, &cfg()),
            ControlChance::CERTAIN
        );
    }

    fn skilled_env() -> crate::env::SandboxEnv {
        let mut env = crate::env::SandboxEnv::new();
        env.insert(
            SandboxMobile::player(MASTER, here())
                .with_followers(0, 5)
                .with_skill(SkillName::AnimalTaming, 1000)
                .with_skill(SkillName::AnimalLore, 1000),
        );
        env
    }

    #[test]
    fn obeying_raises_loyalty() {
        let mut h = Harness::new(skilled_env());
        let mut pet = creature();
        pet.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();
        pet.set_loyalty(60);
        assert!(pet.check_control_chance(MASTER, &mut h.ctx()));
        assert_eq!(pet.loyalty(), 61);
    }

    #[test]
    fn refusing_costs_loyalty_and_growls() {
        let mut h = Harness::new(skilled_env()).with_rng(ScriptedRng::constant(0.999));
        let mut pet = creature();
        pet.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();
        pet.set_loyalty(50);
        assert!(!pet.check_control_chance(MASTER, &mut h.ctx()));
        assert_eq!(pet.loyalty(), 47);
        assert!(h.env.log.effects.contains(&(PET, Effect::AngerSound)));

        pet.set_loyalty(1);
        pet.check_control_chance(MASTER, &mut h.ctx());
        assert_eq!(pet.loyalty(), 0);
    }

    fn tamed(h: &mut Harness) -> Creature {
        let mut pet = creature();
        pet.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();
        pet
    }

    #[test]
    fn hourly_decay_and_distress() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut pet = tamed(&mut h);
        assert_eq!(pet.loyalty_upkeep(&mut h.ctx()), UpkeepOutcome::Decayed { loyalty: 90 });

        pet.set_loyalty(15);
        assert_eq!(pet.loyalty_upkeep(&mut h.ctx()), UpkeepOutcome::Distressed { loyalty: 5 });
        assert!(h.env.log.notices.contains(&(MASTER, Notice::PetLooksUnhappy { pet: PET })));
    }

    #[test]
    fn zero_loyalty_abandons_master() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut pet = tamed(&mut h);
        pet.set_loyalty(10);

        assert_eq!(pet.loyalty_upkeep(&mut h.ctx()), UpkeepOutcome::Abandoned);

        assert!(pet.is_wild());
        assert!(pet.is_abandoned());
        assert_eq!(pet.loyalty(), 100);
        assert!(pet.timers().delete.is_some());
        assert_eq!(h.env.followers(MASTER).unwrap().current, 0);
        assert!(h.events.contains(&CreatureEvent::Abandoned {
            creature: PET,
            master: Some(MASTER)
        }));
    }

    #[test]
    fn stabled_and_uncommandable_pets_keep_loyalty() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut pet = tamed(&mut h);
        pet.set_stabled(true, &mut h.ctx());
        assert_eq!(pet.loyalty_upkeep(&mut h.ctx()), UpkeepOutcome::Unchanged);

        let mut t = template();
        t.traits.commandable = false;
        let mut stubborn = creature_from(t);
        stubborn.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();
        assert_eq!(stubborn.loyalty_upkeep(&mut h.ctx()), UpkeepOutcome::Unchanged);
        assert_eq!(stubborn.loyalty(), 100);
    }

    #[test]
    fn strays_in_houses_are_removed_after_twenty_hours() {
        let mut env = env_with_master(0, 5);
        env.add_house(MapId::TRAMMEL, Point3D::new(90, 90, 0), Point3D::new(110, 110, 0));
        let mut h = Harness::new(env);
        let mut stray = creature();
        for step in 1..20 {
            assert_eq!(stray.loyalty_upkeep(&mut h.ctx()), UpkeepOutcome::RemovalStep { step });
        }
        assert_eq!(stray.loyalty_upkeep(&mut h.ctx()), UpkeepOutcome::Removed);
        assert_eq!(stray.removal_requested(), Some(RemovalReason::Untamed));
    }

    #[test]
    fn removal_counter_resets_outside() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut stray = creature();
        stray.set_remove_if_untamed(true);
        stray.loyalty_upkeep(&mut h.ctx());
        stray.loyalty_upkeep(&mut h.ctx());
        assert_eq!(stray.remove_step(), 2);

        stray.set_remove_if_untamed(false);
        assert_eq!(stray.loyalty_upkeep(&mut h.ctx()), UpkeepOutcome::Unchanged);
        assert_eq!(stray.remove_step(), 0);
    }

    #[test]
    fn feeding_restores_stamina_and_loyalty() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut pet = tamed(&mut h);
        pet.set_loyalty(70);
        pet.set_resource(ResourceKind::Stam, 10);

        assert!(pet.feed(MASTER, FoodType::MEAT, 5, &mut h.ctx()));
        assert_eq!(pet.loyalty(), 100);
        assert_eq!(pet.stam(), 35);
        assert!(h.env.log.notices.contains(&(MASTER, Notice::FoodAccepted { pet: PET })));
    }

    #[test]
    fn feeding_is_picky() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut pet = tamed(&mut h);
        pet.set_loyalty(50);

        assert!(!pet.feed(MASTER, FoodType::FISH, 3, &mut h.ctx()));
        assert!(!pet.feed(OTHER, FoodType::MEAT, 3, &mut h.ctx()));
        assert_eq!(pet.loyalty(), 50);

        pet.add_pet_friend(OTHER);
        assert!(pet.feed(OTHER, FoodType::MEAT, 1, &mut h.ctx()));
        assert_eq!(pet.loyalty(), 60);
    }
}
