//! Decision step shared by every behaviour.

use std::time::Duration;

use super::{Behavior, Decision};
use crate::context::CreatureContext;
use crate::control::OrderType;
use crate::creature::Creature;
use crate::env::MobileInfo;
use crate::events::CreatureEvent;
use crate::state::{EntityId, Point3D};

impl Creature {
    /// Pets, and summons that were given an order, act on their orders.
    pub fn follows_orders(&self) -> bool {
        self.is_controlled() || (self.is_summoned() && self.control.order != OrderType::None)
    }

    pub(crate) fn disengage(&mut self, ctx: &mut CreatureContext<'_>) {
        self.warmode = false;
        if self.set_combatant(None) {
            ctx.emit(CreatureEvent::CombatantChanged {
                creature: self.id,
                combatant: None,
            });
        }
    }
}

pub(super) fn live_mobile(ctx: &CreatureContext<'_>, id: EntityId) -> Option<MobileInfo> {
    ctx.env.mobile(id).filter(|m| m.is_live())
}

pub(super) fn think<B: Behavior + ?Sized>(
    brain: &mut B,
    creature: &mut Creature,
    ctx: &mut CreatureContext<'_>,
) -> Decision {
    if !creature.alive || creature.deleted || creature.removal.is_some() {
        return Decision::Idle;
    }
    creature.clear_expired_bard(ctx);

    if creature.check_flee(ctx.now) {
        if let Some(threat) = creature.combatant {
            return flee(creature, threat, ctx);
        }
        creature.stop_flee();
    }

    if !creature.bard.provoked && creature.follows_orders() {
        if let Some(decision) = obey(brain, creature, ctx) {
            return decision;
        }
    }

    creature.acquire_target(ctx);
    match creature.combatant {
        Some(target) if live_mobile(ctx, target).is_some() => brain.fight(creature, target, ctx),
        Some(_) => {
            creature.disengage(ctx);
            brain.wander(creature, ctx)
        }
        None => brain.wander(creature, ctx),
    }
}

/// Carries out the standing order. `None` hands control back to the
/// autonomous step.
fn obey<B: Behavior + ?Sized>(
    brain: &mut B,
    creature: &mut Creature,
    ctx: &mut CreatureContext<'_>,
) -> Option<Decision> {
    let master = creature.master();
    let decision = match creature.control.order {
        OrderType::None => return None,
        OrderType::Come => approach(creature, master, 1, ctx),
        OrderType::Follow => approach(creature, creature.control.target.or(master), 1, ctx),
        OrderType::Guard => match creature.combatant {
            Some(target) if live_mobile(ctx, target).is_some() => brain.fight(creature, target, ctx),
            _ => approach(creature, master, 2, ctx),
        },
        OrderType::Attack => match creature.acquire_target(ctx) {
            Some(target) => brain.fight(creature, target, ctx),
            None => {
                creature.control.target = None;
                creature.disengage(ctx);
                creature.set_control_order(OrderType::Follow, ctx);
                Decision::Idle
            }
        },
        OrderType::Stop => {
            creature.disengage(ctx);
            Decision::Idle
        }
        OrderType::Stay
        | OrderType::Patrol
        | OrderType::Drop
        | OrderType::Friend
        | OrderType::Unfriend
        | OrderType::Release
        | OrderType::Transfer => Decision::Idle,
    };
    Some(decision)
}

/// One step toward `to`. A creature inhaling for a breath stands still.
pub(super) fn step(creature: &mut Creature, to: Point3D, ctx: &mut CreatureContext<'_>) -> Decision {
    if creature.is_stalled(ctx.now) {
        return Decision::Idle;
    }
    match ctx.env.step_toward(creature.id, &creature.location, &to) {
        Some(point) => {
            creature.location.point = point;
            Decision::Moved { to: point }
        }
        None => Decision::Idle,
    }
}

/// Walks until within `range` tiles of `target`.
pub(super) fn approach(
    creature: &mut Creature,
    target: Option<EntityId>,
    range: i32,
    ctx: &mut CreatureContext<'_>,
) -> Decision {
    let Some(info) = target
        .and_then(|t| live_mobile(ctx, t))
        .filter(|m| m.location.map == creature.location.map)
    else {
        return Decision::Idle;
    };
    if creature.location.in_range(&info.location, range) {
        return Decision::Idle;
    }
    step(creature, info.location.point, ctx)
}

pub(super) fn melee(creature: &mut Creature, target: EntityId, ctx: &mut CreatureContext<'_>) -> Decision {
    if let Some(damage) = creature.swing_at_combatant(ctx) {
        return Decision::Swung { target, damage };
    }
    let range = creature.range_fight;
    approach(creature, Some(target), range, ctx)
}

pub(super) fn flee(creature: &mut Creature, threat: EntityId, ctx: &mut CreatureContext<'_>) -> Decision {
    let Some(info) = live_mobile(ctx, threat) else {
        creature.stop_flee();
        return Decision::Idle;
    };
    let away = creature.location.point.away_from(&info.location.point);
    match step(creature, away, ctx) {
        Decision::Moved { .. } => Decision::Fled { from: threat },
        other => other,
    }
}

/// Starts running from `threat` for the configured flee time.
pub(super) fn start_fleeing(
    creature: &mut Creature,
    threat: EntityId,
    ctx: &mut CreatureContext<'_>,
) -> Decision {
    let duration = Duration::from_millis(ctx.config.combat.flee_duration_ms);
    creature.begin_flee(duration, ctx.now);
    flee(creature, threat, ctx)
}

/// Idles now and then; wild creatures otherwise drift around their home.
pub(super) fn wander(creature: &mut Creature, ctx: &mut CreatureContext<'_>) -> Decision {
    if creature.check_idle(ctx) {
        return Decision::Resting;
    }
    if !creature.is_wild() {
        return Decision::Idle;
    }
    let dx = ctx.rng.range_i32(-1, 1);
    let dy = ctx.rng.range_i32(-1, 1);
    if dx == 0 && dy == 0 {
        return Decision::Idle;
    }
    let here = creature.location.point;
    let to = Point3D::new(here.x + dx, here.y + dy, here.z);
    let home = creature.home.unwrap_or(here);
    if !to.in_range(&home, creature.range_home.max(1)) {
        return step(creature, home, ctx);
    }
    step(creature, to, ctx)
}
