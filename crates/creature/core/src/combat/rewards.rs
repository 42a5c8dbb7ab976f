//! Death: loot generation and fame/karma payouts.

use crate::context::CreatureContext;
use crate::creature::Creature;
use crate::events::{CreatureEvent, RemovalReason};
use crate::state::EntityId;
use crate::stats::ResourceKind;

/// Fame and karma paid to one mobile for a kill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Award {
    pub recipient: EntityId,
    pub fame: i32,
    pub karma: i32,
}

impl Creature {
    fn pays_kill_awards(&self) -> bool {
        !self.is_summoned() && !self.template.traits.no_kill_awards
    }

    /// Fills the corpse-to-be with loot, once per creature lifetime.
    ///
    /// Returns false to veto the death; creatures never do.
    pub fn on_before_death(&mut self, ctx: &mut CreatureContext<'_>) -> bool {
        if self.pays_kill_awards() && !self.generated_loot {
            self.generated_loot = true;
            ctx.env.generate_loot(self.id, &self.species);
        }
        true
    }

    /// Pays out the kill and marks the creature for removal.
    pub fn on_death(&mut self, ctx: &mut CreatureContext<'_>) -> Vec<Award> {
        let awards = if self.pays_kill_awards() {
            self.kill_awards(ctx)
        } else {
            Vec::new()
        };
        for award in &awards {
            ctx.env.award(award.recipient, award.fame, award.karma);
            ctx.emit(CreatureEvent::Rewarded {
                creature: self.id,
                recipient: award.recipient,
                fame: award.fame,
                karma: award.karma,
            });
        }

        self.alive = false;
        self.set_resource(ResourceKind::Hits, 0);
        self.combatant = None;
        self.warmode = false;
        self.flee_until = None;
        self.breath = Default::default();
        self.heal = Default::default();
        self.request_removal(RemovalReason::Died);
        ctx.emit(CreatureEvent::RemovalRequested {
            creature: self.id,
            reason: RemovalReason::Died,
        });
        awards
    }

    pub(crate) fn kill(&mut self, ctx: &mut CreatureContext<'_>) {
        if !self.alive {
            return;
        }
        if self.on_before_death(ctx) {
            self.on_death(ctx);
        }
    }

    /// Splits the kill's fame and karma among qualifying contributors in
    /// proportion to their credited damage. A contributor in a party shares
    /// their cut evenly with every member.
    fn kill_awards(&mut self, ctx: &mut CreatureContext<'_>) -> Vec<Award> {
        let rewards = &ctx.config.rewards;
        let mut total_fame = i64::from(self.fame / 100);
        let mut total_karma = i64::from(-self.karma / 100);
        if rewards.bonus_maps.contains(&self.location.map) {
            let percent = i64::from(rewards.bonus_percent);
            total_fame += total_fame * percent / 100;
            total_karma += total_karma * percent / 100;
        }

        let rights = self.looting_rights(ctx.now, ctx.config, |id| {
            ctx.env.mobile(id).is_some_and(|m| m.is_live_player())
        });
        let qualifiers: Vec<_> = rights.into_iter().filter(|s| s.has_right).collect();
        let pool: i64 = qualifiers.iter().map(|s| i64::from(s.damage)).sum();
        if pool <= 0 {
            return Vec::new();
        }

        let mut awards: Vec<Award> = Vec::new();
        let mut credit = |recipient: EntityId, fame: i64, karma: i64| {
            let (fame, karma) = (fame as i32, karma as i32);
            match awards.iter_mut().find(|a| a.recipient == recipient) {
                Some(award) => {
                    award.fame += fame;
                    award.karma += karma;
                }
                None => awards.push(Award {
                    recipient,
                    fame,
                    karma,
                }),
            }
        };
        for store in &qualifiers {
            let fame = total_fame * i64::from(store.damage) / pool;
            let karma = total_karma * i64::from(store.damage) / pool;
            let party = ctx.env.party_members(store.mobile);
            if party.is_empty() {
                credit(store.mobile, fame, karma);
                continue;
            }
            let members = party.len() as i64;
            for member in party {
                credit(member, fame / members, karma / members);
            }
        }
        awards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::DamageSource;
    use crate::creature::testing::*;
    use crate::env::{SandboxEnv, SandboxMobile};
    use crate::state::{Location, MapId};
    use std::time::Duration;

    const A: EntityId = EntityId(10);
    const B: EntityId = EntityId(11);
    const FRIEND: EntityId = EntityId(12);

    fn arena() -> SandboxEnv {
        let mut env = env_with_master(0, 5);
        env.insert(SandboxMobile::player(A, here()));
        env.insert(SandboxMobile::player(B, here()));
        env
    }

    fn dragon() -> Creature {
        let mut c = creature();
        c.set_fame(6000);
        c.set_karma(-6000);
        c
    }

    #[test]
    fn rewards_split_by_damage() {
        let mut h = Harness::new(arena());
        let mut c = dragon();
        c.take_damage(100, Some(DamageSource::mobile(A)), &mut h.ctx());
        c.take_damage(100, Some(DamageSource::mobile(B)), &mut h.ctx());

        let awards: Vec<_> = h.env.log.awards.clone();
        // A: 125 of 225 credited, B: 100 of 225
        assert_eq!(awards, vec![(A, 33, 33), (B, 26, 26)]);
        assert!(!c.is_alive());
        assert_eq!(c.removal_requested(), Some(RemovalReason::Died));
        assert_eq!(h.env.log.loot_generated, vec![PET]);
    }

    #[test]
    fn bonus_map_pays_more() {
        let mut h = Harness::new(arena());
        let mut c = dragon();
        c.set_location(Location::new(MapId::FELUCCA, here().point));
        c.take_damage(500, Some(DamageSource::mobile(A)), &mut h.ctx());
        assert_eq!(h.env.log.awards, vec![(A, 78, 78)]);
    }

    #[test]
    fn party_members_share_a_cut() {
        let mut env = arena();
        env.insert(SandboxMobile::player(A, here()).in_party(7));
        env.insert(SandboxMobile::player(FRIEND, here()).in_party(7));
        let mut h = Harness::new(env);
        let mut c = dragon();
        c.take_damage(500, Some(DamageSource::mobile(A)), &mut h.ctx());
        assert_eq!(h.env.log.awards, vec![(A, 30, 30), (FRIEND, 30, 30)]);
    }

    #[test]
    fn summons_pay_nothing() {
        let mut h = Harness::new(arena());
        let mut c = dragon();
        c.summon(MASTER, true, Duration::from_secs(60), here(), &mut h.ctx())
            .unwrap();
        c.take_damage(500, Some(DamageSource::mobile(A)), &mut h.ctx());
        assert!(!c.is_alive());
        assert!(h.env.log.awards.is_empty());
        assert!(h.env.log.loot_generated.is_empty());
    }

    #[test]
    fn loot_is_generated_once() {
        let mut h = Harness::new(arena());
        let mut c = dragon();
        assert!(c.on_before_death(&mut h.ctx()));
        assert!(c.on_before_death(&mut h.ctx()));
        assert_eq!(h.env.log.loot_generated.len(), 1);
        assert!(c.has_generated_loot());
    }
}
