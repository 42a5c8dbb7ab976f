//! Bard effects: provocation and pacification.
//!
//! Both expire at `ends_at`. A provoked creature fights `target` on behalf
//! of `master`, and a pacified creature refuses to fight at all.

use std::time::Duration;

use crate::context::CreatureContext;
use crate::creature::Creature;
use crate::env::Effect;
use crate::events::CreatureEvent;
use crate::state::{EntityId, GameTime};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BardState {
    pub provoked: bool,
    pub pacified: bool,
    pub master: Option<EntityId>,
    pub target: Option<EntityId>,
    pub ends_at: GameTime,
}

impl BardState {
    pub fn is_active(&self) -> bool {
        self.provoked || self.pacified
    }
}

/// The other side of a provocation.
pub enum ProvokeTarget<'a> {
    /// Another creature; it is provoked back at the caller.
    Creature(&'a mut Creature),
    /// Any other mobile.
    Mobile(EntityId),
}

impl ProvokeTarget<'_> {
    fn id(&self) -> EntityId {
        match self {
            Self::Creature(creature) => creature.id(),
            Self::Mobile(id) => *id,
        }
    }
}

/// Turns `creature` on `target` for `master`.
///
/// On success both sides fight each other until the effect ends. A failed
/// attempt only records who tried. Returns false for unprovokable species.
pub fn provoke(
    creature: &mut Creature,
    target: ProvokeTarget<'_>,
    master: EntityId,
    success: bool,
    ctx: &mut CreatureContext<'_>,
) -> bool {
    if creature.template.traits.unprovokable {
        return false;
    }
    let target_id = target.id();
    creature.bard.master = Some(master);
    creature.bard.target = Some(target_id);

    if !success {
        ctx.env.emit(creature.id, Effect::AngerSound);
        return true;
    }

    let ends_at = ctx.now + Duration::from_millis(ctx.config.combat.bard_effect_ms);
    ctx.env.emit(creature.id, Effect::IdleSound);
    creature.bard.provoked = true;
    creature.bard.ends_at = ends_at;
    creature.set_combatant(Some(target_id));
    ctx.emit(CreatureEvent::Provoked {
        creature: creature.id,
        target: target_id,
    });

    if let ProvokeTarget::Creature(other) = target {
        other.bard = BardState {
            provoked: true,
            pacified: other.bard.pacified,
            master: Some(master),
            target: Some(creature.id),
            ends_at,
        };
        other.set_combatant(Some(creature.id));
        ctx.emit(CreatureEvent::Provoked {
            creature: other.id,
            target: creature.id,
        });
    }
    true
}

impl Creature {
    pub fn bard_state(&self) -> &BardState {
        &self.bard
    }

    pub fn is_provoked(&self) -> bool {
        self.bard.provoked
    }

    pub fn is_pacified(&self) -> bool {
        self.bard.pacified
    }

    pub fn pacify(&mut self, master: EntityId, until: GameTime, ctx: &mut CreatureContext<'_>) {
        self.bard.pacified = true;
        self.bard.master = Some(master);
        self.bard.ends_at = until;
        self.set_combatant(None);
        self.warmode = false;
        ctx.emit(CreatureEvent::Pacified {
            creature: self.id,
            until,
        });
    }

    pub fn unpacify(&mut self, ctx: &mut CreatureContext<'_>) {
        if !self.bard.pacified {
            return;
        }
        self.bard.pacified = false;
        self.bard.ends_at = ctx.now;
        ctx.emit(CreatureEvent::Unpacified { creature: self.id });
    }

    /// Drops bard effects that ran out or whose target is gone.
    ///
    /// Returns true if anything was cleared.
    pub(crate) fn clear_expired_bard(&mut self, ctx: &mut CreatureContext<'_>) -> bool {
        if !self.bard.is_active() {
            return false;
        }
        let expired = ctx.now >= self.bard.ends_at;
        let target_gone = self.bard.provoked
            && !self
                .bard
                .target
                .and_then(|t| ctx.env.mobile(t))
                .is_some_and(|m| m.is_live());

        let mut cleared = false;
        if self.bard.provoked && (expired || target_gone) {
            self.bard.provoked = false;
            self.bard.target = None;
            if self.combatant.is_some() {
                self.set_combatant(None);
                ctx.emit(CreatureEvent::CombatantChanged {
                    creature: self.id,
                    combatant: None,
                });
            }
            cleared = true;
        }
        if self.bard.pacified && expired {
            self.bard.pacified = false;
            ctx.emit(CreatureEvent::Unpacified { creature: self.id });
            cleared = true;
        }
        if !self.bard.is_active() {
            self.bard.master = None;
        }
        cleared
    }

    /// The mobile credited with damage this creature deals to `damagee`.
    pub fn damage_master(&self, damagee: EntityId) -> Option<EntityId> {
        if self.bard.provoked && self.bard.target == Some(damagee) {
            return self.bard.master;
        }
        self.master()
    }
}
