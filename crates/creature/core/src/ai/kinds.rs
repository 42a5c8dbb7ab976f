//! Built-in behaviours.

use std::sync::Arc;
use std::time::Duration;

use super::base::{self, live_mobile};
use super::{AiKind, Behavior, Decision, Speech, SpeechOutcome};
use crate::combat::FightMode;
use crate::context::CreatureContext;
use crate::creature::Creature;
use crate::env::Notice;
use crate::spell::{SpellKey, SpellRegistry};
use crate::state::{EntityId, GameTime};
use crate::stats::ResourceKind;

/// Plain melee fighter.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeleeAi;

impl Behavior for MeleeAi {
    fn kind(&self) -> AiKind {
        AiKind::Melee
    }
}

/// Fights like melee but runs once badly hurt.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnimalAi;

impl Behavior for AnimalAi {
    fn kind(&self) -> AiKind {
        AiKind::Animal
    }

    fn fight(&mut self, creature: &mut Creature, target: EntityId, ctx: &mut CreatureContext<'_>) -> Decision {
        if creature.is_wild() && creature.should_flee(ctx.config) {
            return base::start_fleeing(creature, target, ctx);
        }
        base::melee(creature, target, ctx)
    }
}

/// Shoots from range and backs off when the target closes in.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArcherAi;

impl Behavior for ArcherAi {
    fn kind(&self) -> AiKind {
        AiKind::Archer
    }

    fn fight(&mut self, creature: &mut Creature, target: EntityId, ctx: &mut CreatureContext<'_>) -> Decision {
        let Some(info) = live_mobile(ctx, target) else {
            return Decision::Idle;
        };
        if creature.range_fight > 1 && creature.location.in_range(&info.location, 1) {
            let away = creature.location.point.away_from(&info.location.point);
            if let moved @ Decision::Moved { .. } = base::step(creature, away, ctx) {
                return moved;
            }
        }
        base::melee(creature, target, ctx)
    }
}

/// Attacks whatever is closest, friend or foe.
#[derive(Clone, Copy, Debug, Default)]
pub struct BerserkAi;

impl BerserkAi {
    fn closest(creature: &Creature, ctx: &CreatureContext<'_>) -> Option<EntityId> {
        ctx.env
            .mobiles_in_range(&creature.location, creature.range_perception)
            .into_iter()
            .filter(|m| m.id != creature.id && m.is_live())
            .filter(|m| ctx.env.can_be_harmful(creature.id, m.id))
            .filter(|m| ctx.env.in_line_of_sight(&creature.location, &m.location))
            .min_by_key(|m| creature.location.point.tiles_to(&m.location.point))
            .map(|m| m.id)
    }
}

impl Behavior for BerserkAi {
    fn kind(&self) -> AiKind {
        AiKind::Berserk
    }

    fn think(&mut self, creature: &mut Creature, ctx: &mut CreatureContext<'_>) -> Decision {
        if creature.follows_orders() || creature.bard.is_active() {
            return base::think(self, creature, ctx);
        }
        if !creature.alive || creature.deleted || creature.removal.is_some() {
            return Decision::Idle;
        }
        let current = creature.combatant.filter(|t| live_mobile(ctx, *t).is_some());
        match current.or_else(|| Self::closest(creature, ctx)) {
            Some(target) => {
                creature.focus(Some(target), ctx);
                self.fight(creature, target, ctx)
            }
            None => {
                creature.disengage(ctx);
                self.wander(creature, ctx)
            }
        }
    }
}

/// Minimum time between spells from creatures that cast.
const CAST_RECOVERY_MS: u64 = 1_000;
const CAST_MS_PER_CIRCLE: u64 = 500;

/// Casts from its spell lists, falling back to melee.
#[derive(Debug)]
pub struct MageAi {
    spells: Arc<SpellRegistry>,
    next_cast: GameTime,
}

impl MageAi {
    pub fn new(spells: Arc<SpellRegistry>) -> Self {
        Self {
            spells,
            next_cast: GameTime::ZERO,
        }
    }

    fn try_cast(
        &mut self,
        creature: &mut Creature,
        target: EntityId,
        ctx: &mut CreatureContext<'_>,
    ) -> Option<Decision> {
        if ctx.now < self.next_cast {
            return None;
        }
        let hurt = creature.hits() * 2 < creature.hits_max();
        let (list, on) = if hurt && !creature.spells.defense.is_empty() {
            (&creature.spells.defense, creature.id)
        } else {
            (&creature.spells.attack, target)
        };
        if list.is_empty() {
            return None;
        }
        let key: SpellKey = list[ctx.rng.below(list.len())].clone();
        let spell = self.spells.create(&key)?;
        if creature.mana() < spell.mana || !ctx.env.cast_spell(creature.id, &key, Some(on)) {
            return None;
        }
        creature.set_resource(ResourceKind::Mana, creature.mana() - spell.mana);
        let recovery = CAST_RECOVERY_MS + CAST_MS_PER_CIRCLE * u64::from(spell.circle);
        self.next_cast = ctx.now + Duration::from_millis(recovery);
        Some(Decision::Cast {
            spell: key,
            target: Some(on),
        })
    }
}

impl Behavior for MageAi {
    fn kind(&self) -> AiKind {
        AiKind::Mage
    }

    fn fight(&mut self, creature: &mut Creature, target: EntityId, ctx: &mut CreatureContext<'_>) -> Decision {
        if let Some(cast) = self.try_cast(creature, target, ctx) {
            return cast;
        }
        base::melee(creature, target, ctx)
    }
}

/// Never fights. Runs from attackers and patches up whoever it can.
#[derive(Clone, Copy, Debug, Default)]
pub struct HealerAi {
    next_cast: GameTime,
}

impl HealerAi {
    fn is_ally(creature: &Creature, patient: &crate::env::MobileInfo) -> bool {
        creature.master() == Some(patient.id)
            || creature.is_friend(patient)
            || (patient.player && creature.fight_mode == FightMode::None)
    }

    fn patient(creature: &Creature, ctx: &CreatureContext<'_>) -> Option<EntityId> {
        if creature.is_hurt() {
            return Some(creature.id);
        }
        ctx.env
            .mobiles_in_range(&creature.location, creature.range_perception)
            .into_iter()
            .filter(|m| m.id != creature.id && m.is_live() && m.hits < m.hits_max)
            .filter(|m| Self::is_ally(creature, m))
            .filter(|m| ctx.env.can_be_beneficial(creature.id, m.id))
            .filter(|m| ctx.env.in_line_of_sight(&creature.location, &m.location))
            .min_by_key(|m| m.hits * 100 / m.hits_max.max(1))
            .map(|m| m.id)
    }
}

impl Behavior for HealerAi {
    fn kind(&self) -> AiKind {
        AiKind::Healer
    }

    fn fight(&mut self, creature: &mut Creature, target: EntityId, ctx: &mut CreatureContext<'_>) -> Decision {
        base::start_fleeing(creature, target, ctx)
    }

    fn wander(&mut self, creature: &mut Creature, ctx: &mut CreatureContext<'_>) -> Decision {
        if ctx.now >= self.next_cast {
            if let (Some(patient), Some(spell)) = (Self::patient(creature, ctx), creature.spells.defense.first()) {
                let spell = spell.clone();
                if ctx.env.cast_spell(creature.id, &spell, Some(patient)) {
                    self.next_cast = ctx.now + Duration::from_millis(CAST_RECOVERY_MS * 2);
                    return Decision::Tending { patient };
                }
            }
        }
        base::wander(creature, ctx)
    }
}

/// Shopkeeper: ignores fights and greets customers.
#[derive(Clone, Copy, Debug, Default)]
pub struct VendorAi;

const VENDOR_HEARING: i32 = 4;
const VENDOR_WORDS: [&str; 3] = ["vendor", "buy", "sell"];

impl Behavior for VendorAi {
    fn kind(&self) -> AiKind {
        AiKind::Vendor
    }

    fn fight(&mut self, creature: &mut Creature, _target: EntityId, ctx: &mut CreatureContext<'_>) -> Decision {
        creature.disengage(ctx);
        Decision::Idle
    }

    fn handle_speech(
        &mut self,
        creature: &mut Creature,
        speech: &Speech<'_>,
        ctx: &mut CreatureContext<'_>,
    ) -> SpeechOutcome {
        let near = ctx
            .env
            .mobile(speech.speaker)
            .is_some_and(|m| creature.location.in_range(&m.location, VENDOR_HEARING));
        let name = creature.name.to_lowercase();
        let addressed = speech
            .text
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
            .any(|word| word == name || VENDOR_WORDS.contains(&word.as_str()));
        if !near || !addressed {
            return SpeechOutcome::Ignored;
        }
        ctx.env.notify(speech.speaker, Notice::VendorGreeting { vendor: creature.id });
        SpeechOutcome::Answered
    }

    fn on_aggressive_action(
        &mut self,
        creature: &mut Creature,
        aggressor: EntityId,
        _ctx: &mut CreatureContext<'_>,
    ) {
        if !creature.aggressors.contains(&aggressor) {
            creature.aggressors.push(aggressor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::testing::*;
    use crate::env::{SandboxEnv, SandboxMobile};
    use crate::state::{Location, MapId, Point3D};

    fn at(x: i32, y: i32) -> Location {
        Location::new(MapId::TRAMMEL, Point3D::new(x, y, 0))
    }

    fn beside() -> SandboxEnv {
        let mut env = SandboxEnv::new();
        env.insert(SandboxMobile::player(OTHER, at(101, 100)));
        env
    }

    #[test]
    fn animals_flee_when_badly_hurt() {
        let mut h = Harness::new(beside());
        let mut c = creature();
        c.set_resource(ResourceKind::Hits, 20);
        assert_eq!(AnimalAi.think(&mut c, &mut h.ctx()), Decision::Fled { from: OTHER });
        assert!(c.is_fleeing());
    }

    #[test]
    fn archers_back_off_then_shoot() {
        let mut h = Harness::new(beside());
        let mut c = creature();
        c.range_fight = 6;
        assert_eq!(ArcherAi.think(&mut c, &mut h.ctx()), Decision::Moved { to: Point3D::new(99, 100, 0) });
        assert_eq!(ArcherAi.think(&mut c, &mut h.ctx()), Decision::Swung { target: OTHER, damage: 1 });
    }

    #[test]
    fn berserkers_attack_their_own_kind() {
        let mut env = SandboxEnv::new();
        let mut kin = SandboxMobile::player(EntityId(7), at(101, 100));
        kin.info.player = false;
        kin.info.creature = Some(creature().creature_traits());
        env.insert(kin);
        env.insert(SandboxMobile::player(OTHER, at(105, 100)));
        let mut h = Harness::new(env);
        let mut c = creature();
        assert_eq!(BerserkAi.think(&mut c, &mut h.ctx()), Decision::Swung { target: EntityId(7), damage: 1 });
    }

    fn mage_template(spells: &[&str]) -> crate::creature::SpeciesTemplate {
        let mut t = template();
        t.ai = AiKind::Mage;
        t.attack_spells = spells.iter().map(|s| SpellKey::new(*s)).collect();
        t
    }

    #[test]
    fn mages_cast_then_recover() {
        let mut h = Harness::new(beside());
        let mut c = creature_from(mage_template(&["magery.fireball"]));
        let mut ai = MageAi::new(Arc::new(SpellRegistry::with_magery()));

        let fireball = SpellKey::new("magery.fireball");
        assert_eq!(
            ai.think(&mut c, &mut h.ctx()),
            Decision::Cast { spell: fireball.clone(), target: Some(OTHER) }
        );
        assert_eq!(c.mana(), 21);
        assert_eq!(h.env.log.spells, vec![(PET, fireball, Some(OTHER))]);
        assert_eq!(ai.think(&mut c, &mut h.ctx()), Decision::Swung { target: OTHER, damage: 1 });
    }

    #[test]
    fn unknown_spell_keys_fall_back_to_melee() {
        let mut h = Harness::new(beside());
        let mut c = creature_from(mage_template(&["Server.Spells.Sixth.EnergyBoltSpell"]));
        let mut ai = MageAi::new(Arc::new(SpellRegistry::with_magery()));
        assert_eq!(ai.think(&mut c, &mut h.ctx()), Decision::Swung { target: OTHER, damage: 1 });
        assert!(h.env.log.spells.is_empty());
    }

    #[test]
    fn healers_tend_the_wounded() {
        let mut env = SandboxEnv::new();
        env.insert(SandboxMobile::player(OTHER, at(103, 100)).with_hits(40, 100));
        let mut h = Harness::new(env);
        let mut t = template();
        t.fight_mode = FightMode::None;
        t.defense_spells = vec![SpellKey::new("magery.heal")];
        let mut c = creature_from(t);
        let mut ai = HealerAi::default();

        assert_eq!(ai.think(&mut c, &mut h.ctx()), Decision::Tending { patient: OTHER });
        assert_eq!(ai.think(&mut c, &mut h.ctx()), Decision::Resting, "recovering from the cast");
    }

    #[test]
    fn healers_run_from_attackers() {
        let mut h = Harness::new(beside());
        let mut c = creature();
        c.set_fight_mode(FightMode::None);
        c.on_aggressive_action(OTHER, &mut h.ctx());
        assert_eq!(HealerAi::default().think(&mut c, &mut h.ctx()), Decision::Fled { from: OTHER });
    }

    #[test]
    fn vendors_greet_and_never_fight() {
        let mut h = Harness::new(beside());
        let mut c = creature();
        c.name = String::from("Lorna");
        let mut ai = VendorAi;

        ai.on_aggressive_action(&mut c, OTHER, &mut h.ctx());
        assert_eq!(c.combatant(), None);
        assert_eq!(c.aggressors(), &[OTHER]);

        let greet = Speech { speaker: OTHER, text: "Lorna, what do you sell?" };
        assert_eq!(ai.handle_speech(&mut c, &greet, &mut h.ctx()), SpeechOutcome::Answered);
        h.env.get_mut(OTHER).unwrap().info.location = at(110, 100);
        assert_eq!(ai.handle_speech(&mut c, &greet, &mut h.ctx()), SpeechOutcome::Ignored, "out of earshot");
        assert_eq!(h.env.log.notices, vec![(OTHER, Notice::VendorGreeting { vendor: PET })]);
    }
}
