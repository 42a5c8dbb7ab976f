//! The world as one creature sees it during its turn.
//!
//! Framework mobiles (players, vendors run elsewhere) come from the wrapped
//! [`Env`]. Other creatures are served from snapshots taken after their own
//! last turn. Effects aimed at another creature are queued as [`Pending`] and
//! applied once the acting creature is done, so no two creatures are ever
//! mutated at the same time.

use std::collections::BTreeMap;

use creature_core::{
    BardState, Creature, Effect, EntityId, Env, FollowerCount, FollowerLedger, Location, MobileInfo,
    MobileOracle, Notice, Point3D, SkillName, Skills, SpellKey, WorldActions,
};

/// Read-only copy of a creature for its neighbours.
#[derive(Clone, Debug)]
pub(crate) struct CreatureView {
    pub info: MobileInfo,
    pub skills: Skills,
    master: Option<EntityId>,
    bard: BardState,
}

impl CreatureView {
    pub fn of(creature: &Creature) -> Self {
        Self {
            info: creature.as_mobile_info(),
            skills: creature.skills().clone(),
            master: creature.master(),
            bard: *creature.bard_state(),
        }
    }

    /// Same answer as [`Creature::damage_master`] at snapshot time.
    pub fn responsible_for(&self, damagee: EntityId) -> Option<EntityId> {
        if self.bard.provoked && self.bard.target == Some(damagee) {
            return self.bard.master;
        }
        self.master
    }
}

/// Effect on a creature, applied after the acting creature's turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Pending {
    Damage {
        target: EntityId,
        amount: i32,
        source: EntityId,
        responsible: Option<EntityId>,
    },
    Heal {
        target: EntityId,
        amount: i32,
    },
    Cure {
        target: EntityId,
    },
}

pub(crate) struct WorldView<'a> {
    inner: &'a mut dyn Env,
    creatures: &'a BTreeMap<EntityId, CreatureView>,
    pending: &'a mut Vec<Pending>,
}

impl<'a> WorldView<'a> {
    pub fn new(
        inner: &'a mut dyn Env,
        creatures: &'a BTreeMap<EntityId, CreatureView>,
        pending: &'a mut Vec<Pending>,
    ) -> Self {
        Self {
            inner,
            creatures,
            pending,
        }
    }

    fn creature(&self, id: EntityId) -> Option<&CreatureView> {
        self.creatures.get(&id)
    }
}

impl MobileOracle for WorldView<'_> {
    fn mobile(&self, id: EntityId) -> Option<MobileInfo> {
        match self.creature(id) {
            Some(view) => Some(view.info.clone()),
            None => self.inner.mobile(id),
        }
    }

    fn skill(&self, id: EntityId, skill: SkillName, base: bool) -> u32 {
        match self.creature(id) {
            Some(view) => view.skills.fixed(skill),
            None => self.inner.skill(id, skill, base),
        }
    }

    fn in_line_of_sight(&self, from: &Location, to: &Location) -> bool {
        self.inner.in_line_of_sight(from, to)
    }

    fn mobiles_in_range(&self, at: &Location, range: i32) -> Vec<MobileInfo> {
        let mut found = self.inner.mobiles_in_range(at, range);
        found.extend(
            self.creatures
                .values()
                .filter(|view| view.info.location.in_range(at, range))
                .map(|view| view.info.clone()),
        );
        found
    }

    fn can_be_harmful(&self, from: EntityId, to: EntityId) -> bool {
        match self.creature(to) {
            Some(view) => from != to && view.info.is_live(),
            None => self.inner.can_be_harmful(from, to),
        }
    }

    fn can_be_beneficial(&self, from: EntityId, to: EntityId) -> bool {
        match self.creature(to) {
            Some(view) => !view.info.deleted,
            None => self.inner.can_be_beneficial(from, to),
        }
    }

    fn party_members(&self, id: EntityId) -> Vec<EntityId> {
        self.inner.party_members(id)
    }

    fn in_house_region(&self, at: &Location) -> bool {
        self.inner.in_house_region(at)
    }

    fn sector_active(&self, at: &Location) -> bool {
        self.inner.sector_active(at)
    }
}

impl FollowerLedger for WorldView<'_> {
    fn followers(&self, master: EntityId) -> Option<FollowerCount> {
        self.inner.followers(master)
    }

    fn set_followers(&mut self, master: EntityId, current: u32) {
        self.inner.set_followers(master, current);
    }

    fn link_follower(&mut self, master: EntityId, follower: EntityId) {
        self.inner.link_follower(master, follower);
    }

    fn unlink_follower(&mut self, master: EntityId, follower: EntityId) {
        self.inner.unlink_follower(master, follower);
    }
}

impl WorldActions for WorldView<'_> {
    fn step_toward(&mut self, mover: EntityId, from: &Location, to: &Point3D) -> Option<Point3D> {
        self.inner.step_toward(mover, from, to)
    }

    fn apply_damage(&mut self, target: EntityId, amount: i32, source: EntityId) {
        if self.creatures.contains_key(&target) {
            let responsible = self.creature(source).and_then(|view| view.responsible_for(target));
            self.pending.push(Pending::Damage {
                target,
                amount,
                source,
                responsible,
            });
        } else {
            self.inner.apply_damage(target, amount, source);
        }
    }

    fn heal(&mut self, target: EntityId, amount: i32) {
        if self.creatures.contains_key(&target) {
            self.pending.push(Pending::Heal { target, amount });
        } else {
            self.inner.heal(target, amount);
        }
    }

    fn cure_poison(&mut self, target: EntityId, healer: EntityId) -> bool {
        match self.creature(target) {
            Some(view) => {
                let poisoned = view.info.poison.is_some();
                if poisoned {
                    self.pending.push(Pending::Cure { target });
                }
                poisoned
            }
            None => self.inner.cure_poison(target, healer),
        }
    }

    fn rummage_corpse(&mut self, looter: EntityId, at: &Location, range: i32) -> bool {
        self.inner.rummage_corpse(looter, at, range)
    }

    fn drop_backpack(&mut self, owner: EntityId, at: &Location) {
        self.inner.drop_backpack(owner, at);
    }

    fn clear_backpack(&mut self, owner: EntityId) {
        self.inner.clear_backpack(owner);
    }

    fn generate_loot(&mut self, creature: EntityId, species: &str) {
        self.inner.generate_loot(creature, species);
    }

    fn award(&mut self, to: EntityId, fame: i32, karma: i32) {
        self.inner.award(to, fame, karma);
    }

    fn detach_from_spawner(&mut self, spawner: EntityId, creature: EntityId) {
        self.inner.detach_from_spawner(spawner, creature);
    }

    fn cast_spell(&mut self, caster: EntityId, spell: &SpellKey, target: Option<EntityId>) -> bool {
        self.inner.cast_spell(caster, spell, target)
    }

    fn emit(&mut self, source: EntityId, effect: Effect) {
        self.inner.emit(source, effect);
    }

    fn notify(&mut self, to: EntityId, notice: Notice) {
        self.inner.notify(to, notice);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use creature_core::{
        EngineConfig, GameTime, MapId, SandboxEnv, SandboxMobile, SpeciesTemplate,
    };

    fn at(x: i32, y: i32) -> Location {
        Location::new(MapId::TRAMMEL, Point3D::new(x, y, 0))
    }

    fn wolf(id: u32, location: Location) -> Creature {
        Creature::from_template(
            EntityId(id),
            "grey_wolf",
            Arc::new(SpeciesTemplate::default()),
            location,
            GameTime::ZERO,
            &EngineConfig::default(),
        )
    }

    #[test]
    fn creatures_and_players_share_one_view() {
        let mut env = SandboxEnv::new();
        env.insert(SandboxMobile::player(EntityId(1), at(0, 0)));
        let views = BTreeMap::from([(EntityId(10), CreatureView::of(&wolf(10, at(2, 2))))]);
        let mut pending = Vec::new();
        let view = WorldView::new(&mut env, &views, &mut pending);

        let ids: Vec<_> = view.mobiles_in_range(&at(0, 0), 5).iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![EntityId(1), EntityId(10)]);
        assert!(view.mobile(EntityId(10)).unwrap().creature.is_some());
        assert!(view.can_be_harmful(EntityId(1), EntityId(10)));
    }

    #[test]
    fn hits_on_creatures_are_deferred() {
        let mut env = SandboxEnv::new();
        env.insert(SandboxMobile::player(EntityId(1), at(0, 0)));
        let views = BTreeMap::from([(EntityId(10), CreatureView::of(&wolf(10, at(1, 1))))]);
        let mut pending = Vec::new();
        {
            let mut view = WorldView::new(&mut env, &views, &mut pending);
            view.apply_damage(EntityId(10), 7, EntityId(1));
            view.apply_damage(EntityId(1), 3, EntityId(10));
            view.heal(EntityId(10), 2);
        }

        assert_eq!(
            pending,
            vec![
                Pending::Damage {
                    target: EntityId(10),
                    amount: 7,
                    source: EntityId(1),
                    responsible: None,
                },
                Pending::Heal {
                    target: EntityId(10),
                    amount: 2,
                },
            ]
        );
        assert_eq!(env.log.damage, vec![(EntityId(1), 3, EntityId(10))]);
    }
}
