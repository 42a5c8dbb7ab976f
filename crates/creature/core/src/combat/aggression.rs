//! Reactions to being attacked, the reacquire throttle and fleeing.

use std::time::Duration;

use crate::config::EngineConfig;
use crate::context::CreatureContext;
use crate::control::OrderType;
use crate::creature::Creature;
use crate::events::CreatureEvent;
use crate::state::{EntityId, GameTime, Location};

/// Who dealt a hit, and who answers for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageSource {
    pub damager: EntityId,
    /// The damager's master, bard or summoner, if any.
    pub responsible: Option<EntityId>,
}

impl DamageSource {
    pub const fn mobile(damager: EntityId) -> Self {
        Self {
            damager,
            responsible: None,
        }
    }

    pub const fn on_behalf_of(mut self, responsible: EntityId) -> Self {
        self.responsible = Some(responsible);
        self
    }
}

impl Creature {
    // ===== reacquire throttle =====

    pub fn should_reacquire(&self, now: GameTime) -> bool {
        now >= self.cooldowns.next_reacquire
    }

    /// Lets the next think rescan for targets.
    pub fn force_reacquire(&mut self) {
        self.cooldowns.next_reacquire = GameTime::ZERO;
    }

    pub(crate) fn mark_reacquired(&mut self, now: GameTime, config: &EngineConfig) {
        self.cooldowns.next_reacquire = now + config.combat.reacquire_delay();
    }

    /// Called after the framework moved the creature without walking.
    pub fn teleport(&mut self, location: Location) {
        self.location = location;
        self.force_reacquire();
    }

    /// Another mobile moved within perception range.
    pub fn on_nearby_movement(&mut self, mover: EntityId) {
        if mover != self.id && self.template.traits.reacquire_on_movement {
            self.force_reacquire();
        }
    }

    // ===== aggression =====

    pub fn aggressors(&self) -> &[EntityId] {
        &self.aggressors
    }

    /// `aggressor` just acted harmfully toward this creature.
    ///
    /// Idle or following pets are ordered to attack; anything else without a
    /// combatant turns on the aggressor unless pacified.
    pub fn on_aggressive_action(&mut self, aggressor: EntityId, ctx: &mut CreatureContext<'_>) {
        if aggressor == self.id || self.deleted {
            return;
        }
        if !self.aggressors.contains(&aggressor) {
            self.aggressors.push(aggressor);
        }
        self.stop_flee();
        self.force_reacquire();

        let is_pet = self.is_controlled() || self.is_summoned();
        if is_pet && self.control.order.yields_to_aggression() && self.master() != Some(aggressor) {
            self.control.target = Some(aggressor);
            self.set_control_order(OrderType::Attack, ctx);
        } else if self.combatant.is_none() && !self.bard.pacified {
            self.warmode = true;
            self.set_combatant(Some(aggressor));
            ctx.emit(CreatureEvent::CombatantChanged {
                creature: self.id,
                combatant: Some(aggressor),
            });
        }
    }

    /// Hook run before `amount` damage lands.
    ///
    /// Records the hit for looting rights. Pain may break pacification, and a
    /// following pet may get distracted into fighting back.
    pub fn on_damage(
        &mut self,
        amount: i32,
        from: Option<DamageSource>,
        will_kill: bool,
        ctx: &mut CreatureContext<'_>,
    ) {
        if let Some(source) = from {
            self.damage_log
                .record(source.damager, amount, source.responsible, ctx.now);
        }

        if self.bard.pacified {
            let missing = f64::from(self.hits_max() - self.hits());
            if ctx.rng.chance(missing * 0.001) {
                self.unpacify(ctx);
            }
        }

        let Some(source) = from else {
            return;
        };
        if will_kill || source.damager == self.id || self.master() == Some(source.damager) {
            return;
        }
        if self.control.order == OrderType::Follow
            && self.template.traits.can_be_distracted
            && ctx.rng.chance(ctx.config.combat.distract_chance)
        {
            self.control.target = Some(source.damager);
            self.set_control_order(OrderType::Attack, ctx);
        }
    }

    /// Applies damage to this creature. Returns true if it died.
    pub fn take_damage(
        &mut self,
        amount: i32,
        from: Option<DamageSource>,
        ctx: &mut CreatureContext<'_>,
    ) -> bool {
        if !self.alive || self.deleted || amount <= 0 || self.template.traits.invulnerable {
            return false;
        }
        let will_kill = amount >= self.hits();
        self.on_damage(amount, from, will_kill, ctx);
        let hits = self.hits() - amount;
        self.set_resource(crate::stats::ResourceKind::Hits, hits);
        if hits <= 0 {
            self.kill(ctx);
            return true;
        }
        if self.template.traits.flees_when_hurt && self.should_flee(ctx.config) {
            let duration = Duration::from_millis(ctx.config.combat.flee_duration_ms);
            self.begin_flee(duration, ctx.now);
        }
        false
    }

    /// Swings at the combatant if it is in reach and the swing timer allows.
    ///
    /// Returns the damage dealt.
    pub fn swing_at_combatant(&mut self, ctx: &mut CreatureContext<'_>) -> Option<i32> {
        let target = self.combatant?;
        if ctx.now < self.next_swing || self.bard.pacified || self.is_stalled(ctx.now) {
            return None;
        }
        let info = ctx.env.mobile(target).filter(|m| m.is_live())?;
        if info.location.map != self.location.map
            || !self.location.in_range(&info.location, self.range_fight)
            || !ctx.env.in_line_of_sight(&self.location, &info.location)
        {
            return None;
        }
        let damage = ctx.rng.range_i32(self.damage.min, self.damage.max);
        ctx.env.apply_damage(target, damage, self.id);
        self.next_swing = ctx.now + ctx.config.combat.swing_delay();
        Some(damage)
    }

    // ===== fleeing =====

    pub fn is_fleeing(&self) -> bool {
        self.flee_until.is_some()
    }

    pub fn begin_flee(&mut self, duration: Duration, now: GameTime) {
        self.flee_until = Some(now + duration);
    }

    pub fn stop_flee(&mut self) {
        self.flee_until = None;
    }

    /// Returns whether the creature is still fleeing, ending the flight once
    /// its time is up.
    pub fn check_flee(&mut self, now: GameTime) -> bool {
        match self.flee_until {
            Some(until) if now >= until => {
                self.flee_until = None;
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub(crate) fn should_flee(&self, config: &EngineConfig) -> bool {
        f64::from(self.hits()) < f64::from(self.hits_max()) * config.combat.flee_hits_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::testing::*;
    use crate::env::{SandboxEnv, ScriptedRng};
    use crate::state::{MapId, Point3D};

    #[test]
    fn wild_creature_turns_on_aggressor() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut wolf = creature();
        wolf.begin_flee(Duration::from_secs(10), h.now);
        wolf.mark_reacquired(h.now, &h.config);

        wolf.on_aggressive_action(OTHER, &mut h.ctx());

        assert_eq!(wolf.combatant(), Some(OTHER));
        assert!(wolf.warmode());
        assert!(!wolf.is_fleeing());
        assert!(wolf.should_reacquire(h.now));
        assert_eq!(wolf.aggressors(), &[OTHER]);
    }

    #[test]
    fn busy_or_pacified_creature_keeps_its_target() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut wolf = creature();
        wolf.combatant = Some(MASTER);
        wolf.on_aggressive_action(OTHER, &mut h.ctx());
        assert_eq!(wolf.combatant(), Some(MASTER));

        let mut calm = creature();
        let until = h.now + Duration::from_secs(30);
        calm.pacify(EntityId(50), until, &mut h.ctx());
        calm.on_aggressive_action(OTHER, &mut h.ctx());
        assert_eq!(calm.combatant(), None);
    }

    #[test]
    fn following_pet_is_ordered_to_attack() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut pet = creature();
        pet.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();
        pet.set_control_order(OrderType::Follow, &mut h.ctx());

        pet.on_aggressive_action(OTHER, &mut h.ctx());

        assert_eq!(pet.control_order(), OrderType::Attack);
        assert_eq!(pet.control_target(), Some(OTHER));
    }

    #[test]
    fn guarding_pet_keeps_its_orders() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut pet = creature();
        pet.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();
        pet.set_control_order(OrderType::Guard, &mut h.ctx());
        pet.combatant = Some(EntityId(9));
        pet.on_aggressive_action(OTHER, &mut h.ctx());
        assert_eq!(pet.control_order(), OrderType::Guard);
    }

    #[test]
    fn damage_is_logged_with_responsible_party() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut wolf = creature();
        let source = DamageSource::mobile(EntityId(40)).on_behalf_of(MASTER);
        assert!(!wolf.take_damage(30, Some(source), &mut h.ctx()));
        assert_eq!(wolf.hits(), 90);

        let entry = &wolf.damage_log().entries()[0];
        assert_eq!(entry.damager, EntityId(40));
        assert_eq!(entry.amount, 30);
        assert_eq!(entry.responsible[0].damager, MASTER);
    }

    #[test]
    fn pain_can_break_pacification() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut wolf = creature();
        wolf.pacify(EntityId(50), h.now + Duration::from_secs(30), &mut h.ctx());
        // at full health the snap-out chance is zero
        wolf.on_damage(1, Some(DamageSource::mobile(OTHER)), false, &mut h.ctx());
        assert!(wolf.is_pacified());

        wolf.set_hits(120);
        wolf.set_resource(crate::stats::ResourceKind::Hits, 20);
        wolf.on_damage(1, Some(DamageSource::mobile(OTHER)), false, &mut h.ctx());
        assert!(!wolf.is_pacified());
    }

    #[test]
    fn following_pet_gets_distracted() {
        let mut h = Harness::new(env_with_master(0, 5)).with_rng(ScriptedRng::constant(0.05));
        let mut pet = creature();
        pet.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();
        pet.set_control_order(OrderType::Follow, &mut h.ctx());

        pet.on_damage(5, Some(DamageSource::mobile(OTHER)), false, &mut h.ctx());
        assert_eq!(pet.control_order(), OrderType::Attack);

        let mut calm = creature();
        calm.set_control_master(Some(MASTER), &mut h.ctx()).unwrap();
        calm.set_control_order(OrderType::Follow, &mut h.ctx());
        h.rng = ScriptedRng::constant(0.5);
        calm.on_damage(5, Some(DamageSource::mobile(OTHER)), false, &mut h.ctx());
        assert_eq!(calm.control_order(), OrderType::Follow);
    }

    #[test]
    fn lethal_damage_kills() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut wolf = creature();
        assert!(wolf.take_damage(500, Some(DamageSource::mobile(OTHER)), &mut h.ctx()));
        assert!(!wolf.is_alive());
        assert!(!wolf.take_damage(5, None, &mut h.ctx()));
    }

    #[test]
    fn hurt_fleers_run() {
        let mut h = Harness::new(env_with_master(0, 5));
        let mut t = template();
        t.traits.flees_when_hurt = true;
        let mut deer = creature_from(t);
        deer.take_damage(50, None, &mut h.ctx());
        assert!(!deer.is_fleeing());
        deer.take_damage(50, None, &mut h.ctx());
        assert!(deer.is_fleeing());

        h.advance(9);
        assert!(deer.check_flee(h.now));
        h.advance(1);
        assert!(!deer.check_flee(h.now));
        assert!(!deer.is_fleeing());
    }

    #[test]
    fn swings_respect_reach_and_timer() {
        let mut env = SandboxEnv::new();
        let near = Location::new(MapId::TRAMMEL, Point3D::new(101, 100, 0));
        env.insert(crate::env::SandboxMobile::player(OTHER, near));
        let mut h = Harness::new(env);
        let mut wolf = creature();
        wolf.combatant = Some(OTHER);

        let dealt = wolf.swing_at_combatant(&mut h.ctx()).unwrap();
        assert_eq!(h.env.log.damage, vec![(OTHER, dealt, PET)]);
        assert_eq!(wolf.swing_at_combatant(&mut h.ctx()), None);

        h.advance(3);
        h.env.get_mut(OTHER).unwrap().info.location.point = Point3D::new(110, 100, 0);
        assert_eq!(wolf.swing_at_combatant(&mut h.ctx()), None);
    }

    #[test]
    fn teleport_and_movement_force_reacquire() {
        let now = GameTime::from_secs(5);
        let config = EngineConfig::default();
        let mut t = template();
        t.traits.reacquire_on_movement = true;
        let mut wolf = creature_from(t);
        wolf.mark_reacquired(now, &config);
        assert!(!wolf.should_reacquire(now));
        wolf.on_nearby_movement(OTHER);
        assert!(wolf.should_reacquire(now));

        let mut plain = creature();
        plain.mark_reacquired(now, &config);
        plain.on_nearby_movement(OTHER);
        assert!(!plain.should_reacquire(now));
        plain.teleport(here());
        assert!(plain.should_reacquire(now));
    }
}
