use crate::context::CreatureContext;
use crate::creature::Creature;
use crate::events::CreatureEvent;

impl Creature {
    pub(crate) fn can_rummage(&self) -> bool {
        self.template.traits.can_rummage && self.is_wild()
    }

    /// Tries to pick a corpse clean. Success waits longer before the next try.
    pub(super) fn think_rummage(&mut self, ctx: &mut CreatureContext<'_>) -> bool {
        let config = &ctx.config.rummage;
        if !config.enabled || !self.can_rummage() || ctx.now < self.cooldowns.next_rummage {
            return false;
        }
        let rummaged = ctx.rng.chance(config.chance)
            && ctx.env.rummage_corpse(self.id, &self.location, config.range);
        let (min, max) = if rummaged {
            config.success_delay_ms
        } else {
            config.retry_delay_ms
        };
        self.cooldowns.next_rummage = ctx.now + ctx.rng.duration_between(min, max);
        if rummaged {
            ctx.emit(CreatureEvent::Rummaged { creature: self.id });
        }
        rummaged
    }
}

#[cfg(test)]
mod tests {
    use crate::creature::testing::*;
    use crate::env::{SandboxEnv, ScriptedRng};
    use crate::state::GameTime;
    use std::time::Duration;

    fn scavenger() -> crate::creature::Creature {
        let mut t = template();
        t.traits.can_rummage = true;
        creature_from(t)
    }

    fn graveyard() -> SandboxEnv {
        let mut env = SandboxEnv::new();
        env.add_corpse(here(), 1);
        env
    }

    #[test]
    fn successful_rummage_waits_minutes() {
        let mut h = Harness::new(graveyard());
        let mut c = scavenger();
        assert!(c.think_rummage(&mut h.ctx()));
        assert_eq!(h.env.pack_items(PET), 1);
        assert_eq!(c.cooldowns().next_rummage, h.now + Duration::from_secs(60));
        assert!(!c.think_rummage(&mut h.ctx()), "on cooldown");
    }

    #[test]
    fn failed_rummage_retries_sooner() {
        let mut h = Harness::new(SandboxEnv::new());
        let mut c = scavenger();
        assert!(!c.think_rummage(&mut h.ctx()));
        assert_eq!(c.cooldowns().next_rummage, h.now + Duration::from_secs(15));

        let mut h = Harness::new(graveyard()).with_rng(ScriptedRng::constant(0.9));
        let mut c = scavenger();
        assert!(!c.think_rummage(&mut h.ctx()), "lost the coin toss");
        let wait = c.cooldowns().next_rummage.since(h.now);
        assert!(wait >= Duration::from_secs(15) && wait <= Duration::from_secs(45));
    }

    #[test]
    fn pets_and_ordinary_species_never_rummage() {
        let mut h = Harness::new(graveyard());
        let mut plain = creature();
        assert!(!plain.think_rummage(&mut h.ctx()));

        let mut h = Harness::new(graveyard());
        h.env.insert(crate::env::SandboxMobile::player(MASTER, here()));
        let mut pet = scavenger();
        pet.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();
        assert!(!pet.think_rummage(&mut h.ctx()));
        assert_eq!(pet.cooldowns().next_rummage, GameTime::ZERO);
    }
}
