use crate::context::CreatureContext;
use crate::control::OrderType;
use crate::creature::Creature;
use crate::env::{AccessLevel, MobileInfo, MobileOracle};
use crate::events::CreatureEvent;
use crate::state::{EntityId, Point3D};
use crate::stats::SkillName;

/// Score of a candidate that must never be picked.
pub const UNRANKABLE: f64 = f64::MIN;

/// How a creature chooses whom to fight. Discriminants are persisted.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::FromRepr, strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FightMode {
    /// Never picks a fight.
    None = 0,
    /// Only fights mobiles that attacked it.
    Aggressor = 1,
    Strongest = 2,
    Weakest = 3,
    #[default]
    Closest = 4,
    /// Fights anyone with negative karma.
    Evil = 5,
}

/// Scores `candidate` for a creature standing at `from`; higher wins.
///
/// `tactics` is the candidate's tactics skill in tenths of a point.
pub fn rank_candidate(
    from: &Point3D,
    candidate: &MobileInfo,
    tactics: u32,
    mode: FightMode,
    player_only: bool,
) -> f64 {
    if player_only && !candidate.player {
        return UNRANKABLE;
    }
    match mode {
        FightMode::Strongest => f64::from(tactics) / 10.0 + f64::from(candidate.str),
        FightMode::Weakest => -f64::from(candidate.hits),
        _ => -from.distance(&candidate.location.point),
    }
}

impl Creature {
    pub fn fight_ranking<O: MobileOracle + ?Sized>(
        &self,
        candidate: &MobileInfo,
        mode: FightMode,
        player_only: bool,
        oracle: &O,
    ) -> f64 {
        let tactics = if mode == FightMode::Strongest {
            oracle.skill(candidate.id, SkillName::Tactics, false)
        } else {
            0
        };
        rank_candidate(&self.location.point, candidate, tactics, mode, player_only)
    }

    /// Different team, or exactly one side is someone's pet. Non-creatures
    /// are always enemies.
    pub fn is_enemy(&self, other: &MobileInfo) -> bool {
        match other.creature {
            None => true,
            Some(traits) => {
                traits.team != self.team
                    || traits.is_pet() != (self.is_controlled() || self.is_summoned())
            }
        }
    }

    pub fn is_friend(&self, other: &MobileInfo) -> bool {
        match other.creature {
            None => false,
            Some(traits) => {
                traits.team == self.team
                    && traits.is_pet() == (self.is_controlled() || self.is_summoned())
            }
        }
    }

    fn is_hostile_to(&self, other: &MobileInfo) -> bool {
        self.aggressors.contains(&other.id)
    }

    /// Whether the acquisition scan may consider `candidate` at all.
    fn is_acquirable<O: MobileOracle + ?Sized>(
        &self,
        candidate: &MobileInfo,
        mode: FightMode,
        oracle: &O,
    ) -> bool {
        if candidate.id == self.id || !candidate.is_live() {
            return false;
        }
        if candidate.access > AccessLevel::Player {
            return false;
        }
        if let Some(master) = self.summon_master() {
            if candidate.id == master || !oracle.can_be_harmful(master, candidate.id) {
                return false;
            }
        }
        match mode {
            FightMode::Aggressor => self.is_hostile_to(candidate),
            FightMode::Evil => self.is_hostile_to(candidate) || candidate.karma < 0,
            _ => self.is_enemy(candidate) && oracle.can_be_harmful(self.id, candidate.id),
        }
    }

    /// Picks the best-ranked visible enemy within perception range.
    ///
    /// Provoked creatures stick to the bard's target and pets to their
    /// control target. Everyone else scans at most once per reacquire delay.
    pub fn acquire_target(&mut self, ctx: &mut CreatureContext<'_>) -> Option<EntityId> {
        if self.deleted || !self.alive {
            return None;
        }
        if self.bard.provoked {
            let target = self
                .bard
                .target
                .filter(|t| ctx.env.mobile(*t).is_some_and(|m| m.is_live()));
            return self.focus(target, ctx);
        }
        if self.is_controlled() || (self.is_summoned() && self.control.order != OrderType::None) {
            let target = self
                .control
                .target
                .filter(|t| ctx.env.mobile(*t).is_some_and(|m| m.is_live()));
            return self.focus(target, ctx);
        }
        let mode = self.fight_mode;
        if mode == FightMode::None {
            return None;
        }
        if mode == FightMode::Aggressor && self.aggressors.is_empty() {
            return None;
        }
        if !self.should_reacquire(ctx.now) {
            return None;
        }
        self.mark_reacquired(ctx.now, ctx.config);

        let mut best = None;
        let mut best_rank = UNRANKABLE;
        for candidate in ctx.env.mobiles_in_range(&self.location, self.range_perception) {
            if !self.is_acquirable(&candidate, mode, &*ctx.env) {
                continue;
            }
            let rank = self.fight_ranking(&candidate, mode, false, &*ctx.env);
            if rank > best_rank && ctx.env.in_line_of_sight(&self.location, &candidate.location) {
                best = Some(candidate.id);
                best_rank = rank;
            }
        }
        self.focus(best, ctx)
    }

    pub(crate) fn focus(&mut self, target: Option<EntityId>, ctx: &mut CreatureContext<'_>) -> Option<EntityId> {
        if target.is_some() && self.set_combatant(target) {
            ctx.emit(CreatureEvent::CombatantChanged {
                creature: self.id,
                combatant: target,
            });
        }
        target
    }
}
