//! Passive damage aura pulsing around a creature.

use std::time::Duration;

use crate::context::CreatureContext;
use crate::creature::Creature;
use crate::env::{Effect, MobileInfo};
use crate::events::CreatureEvent;
use crate::state::EntityId;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AuraProfile {
    pub interval_ms: u64,
    pub range: i32,
    pub damage: i32,
}

impl Default for AuraProfile {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            range: 4,
            damage: 5,
        }
    }
}

impl Creature {
    fn is_aura_target(&self, m: &MobileInfo, ctx: &CreatureContext<'_>) -> bool {
        if m.id == self.id || !m.is_live() {
            return false;
        }
        let hostile = match m.creature {
            Some(traits) => traits.is_pet() || traits.team != self.team,
            None => m.player,
        };
        hostile
            && ctx.env.can_be_harmful(self.id, m.id)
            && ctx.env.in_line_of_sight(&self.location, &m.location)
    }

    /// Damages every hostile mobile in range; returns how many were hit.
    pub(super) fn think_aura(&mut self, ctx: &mut CreatureContext<'_>) -> usize {
        let Some(aura) = self.template.aura.clone() else {
            return 0;
        };
        if !self.alive || ctx.now < self.cooldowns.next_aura {
            return 0;
        }
        self.cooldowns.next_aura = ctx.now + Duration::from_millis(aura.interval_ms);

        let targets: Vec<EntityId> = ctx
            .env
            .mobiles_in_range(&self.location, aura.range)
            .iter()
            .filter(|m| self.is_aura_target(m, &*ctx))
            .map(|m| m.id)
            .collect();
        for target in &targets {
            ctx.env.apply_damage(*target, aura.damage, self.id);
            ctx.env.emit(self.id, Effect::AuraHit { target: *target });
        }
        if !targets.is_empty() {
            ctx.emit(CreatureEvent::AuraPulse {
                creature: self.id,
                targets: targets.len(),
            });
        }
        targets.len()
    }
}
