//! Spoken pet commands.
//!
//! A pet hears `<name> <command>` or `all <command>` from anyone within its
//! perception range. Only its master may give every order; pet friends are
//! limited to come, follow, stay and stop. Each accepted order is rolled
//! against the control chance first.

use crate::context::CreatureContext;
use crate::control::OrderType;
use crate::creature::Creature;
use crate::state::EntityId;

/// A line of speech heard by a creature.
#[derive(Clone, Copy, Debug)]
pub struct Speech<'a> {
    pub speaker: EntityId,
    pub text: &'a str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeechOutcome {
    Ignored,
    /// The creature refused to obey.
    Refused,
    Obeyed(OrderType),
    /// The order needs a target; complete it with [`Creature::command`].
    NeedsTarget(OrderType),
    /// A non-order line that the creature answered.
    Answered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParsedOrder {
    pub order: OrderType,
    /// `follow me`, `guard me`: the speaker is the target.
    pub at_speaker: bool,
}

const KEYWORDS: [(&str, OrderType); 13] = [
    ("come", OrderType::Come),
    ("drop", OrderType::Drop),
    ("follow", OrderType::Follow),
    ("friend", OrderType::Friend),
    ("unfriend", OrderType::Unfriend),
    ("guard", OrderType::Guard),
    ("kill", OrderType::Attack),
    ("attack", OrderType::Attack),
    ("patrol", OrderType::Patrol),
    ("release", OrderType::Release),
    ("stay", OrderType::Stay),
    ("stop", OrderType::Stop),
    ("transfer", OrderType::Transfer),
];

/// Parses an order addressed to `name` or to all pets.
pub fn parse_order(text: &str, name: &str) -> Option<ParsedOrder> {
    let text = text.trim().to_lowercase();
    let name = name.trim().to_lowercase();
    let rest = text
        .strip_prefix("all ")
        .or_else(|| text.strip_prefix(&name).and_then(|r| r.strip_prefix(' ')))?;

    let mut words = rest.split_whitespace();
    let command = words.next()?;
    let order = KEYWORDS
        .iter()
        .find(|(keyword, _)| *keyword == command)
        .map(|(_, order)| *order)?;
    let at_speaker = match words.next() {
        None => false,
        Some("me") if words.next().is_none() => true,
        Some(_) => return None,
    };
    Some(ParsedOrder { order, at_speaker })
}

pub(super) fn handle_orders(
    creature: &mut Creature,
    speech: &Speech<'_>,
    ctx: &mut CreatureContext<'_>,
) -> SpeechOutcome {
    if !creature.is_commandable() || creature.is_wild() {
        return SpeechOutcome::Ignored;
    }
    let Some(parsed) = parse_order(speech.text, &creature.name) else {
        return SpeechOutcome::Ignored;
    };
    let heard = ctx
        .env
        .mobile(speech.speaker)
        .is_some_and(|m| creature.location.in_range(&m.location, creature.range_perception));
    if !heard || !creature.may_order(speech.speaker, parsed.order) {
        return SpeechOutcome::Ignored;
    }
    if parsed.order.needs_target() && !parsed.at_speaker {
        return SpeechOutcome::NeedsTarget(parsed.order);
    }
    let target = parsed.at_speaker.then_some(speech.speaker);
    if creature.command(parsed.order, target, speech.speaker, ctx) {
        SpeechOutcome::Obeyed(parsed.order)
    } else {
        SpeechOutcome::Refused
    }
}

impl Creature {
    /// Masters may give any order, pet friends only the harmless ones.
    pub fn may_order(&self, from: EntityId, order: OrderType) -> bool {
        self.master() == Some(from) || (self.is_pet_friend(from) && order.allowed_for_friends())
    }

    /// Issues `order` from `from`, rolling control chance first.
    ///
    /// Returns false if `from` may not give the order or the creature
    /// refused it.
    pub fn command(
        &mut self,
        order: OrderType,
        target: Option<EntityId>,
        from: EntityId,
        ctx: &mut CreatureContext<'_>,
    ) -> bool {
        if !self.is_commandable() || !self.may_order(from, order) {
            return false;
        }
        if order.needs_target() && target.is_none() {
            return false;
        }
        if !self.check_control_chance(from, ctx) {
            return false;
        }
        self.apply_order(order, target, from, ctx);
        true
    }

    fn apply_order(
        &mut self,
        order: OrderType,
        target: Option<EntityId>,
        from: EntityId,
        ctx: &mut CreatureContext<'_>,
    ) {
        match order {
            OrderType::Release => self.release(ctx),
            OrderType::Drop => ctx.env.drop_backpack(self.id, &self.location),
            OrderType::Friend => {
                if let Some(friend) = target.filter(|t| Some(*t) != self.master()) {
                    self.add_pet_friend(friend);
                }
            }
            OrderType::Unfriend => {
                if let Some(friend) = target {
                    self.remove_pet_friend(friend);
                }
            }
            OrderType::Transfer => {
                // A refused transfer has already told the would-be master why.
                if let Some(to) = target {
                    let _ = self.set_control_master(Some(to), ctx);
                }
            }
            OrderType::Follow => {
                self.control.target = target.or(Some(from));
                self.set_control_order(order, ctx);
            }
            OrderType::Attack => {
                self.control.target = target;
                self.force_reacquire();
                self.set_control_order(order, ctx);
            }
            OrderType::Stop => {
                self.control.target = None;
                self.disengage(ctx);
                self.set_control_order(order, ctx);
            }
            OrderType::None
            | OrderType::Come
            | OrderType::Guard
            | OrderType::Patrol
            | OrderType::Stay => {
                self.control.target = None;
                self.set_control_order(order, ctx);
            }
        }
    }
}
