//! In-memory world used by tests and the headless simulator.
//!
//! The sandbox keeps just enough state to answer every [`Env`](super::Env)
//! query: players and their follower counters, blocked tiles, corpses, house
//! regions and sleeping sectors. Every side effect is appended to a log so
//! callers can assert on what a creature did.

use std::collections::{BTreeMap, BTreeSet};

use super::{
    AccessLevel, Effect, FollowerCount, FollowerLedger, MobileInfo, MobileOracle, Notice,
    WorldActions,
};
use crate::spell::SpellKey;
use crate::state::{EntityId, Location, MapId, Point3D};
use crate::stats::SkillName;

/// A mobile owned by the sandbox (usually a player).
#[derive(Clone, Debug)]
pub struct SandboxMobile {
    pub info: MobileInfo,
    pub skills: BTreeMap<SkillName, u32>,
    pub followers: FollowerCount,
    pub follower_ids: BTreeSet<EntityId>,
    pub party: Option<u32>,
    pub fame: i32,
    pub karma: i32,
}

impl SandboxMobile {
    pub fn player(id: EntityId, location: Location) -> Self {
        Self {
            info: MobileInfo {
                id,
                location,
                alive: true,
                deleted: false,
                player: true,
                access: AccessLevel::Player,
                hits: 100,
                hits_max: 100,
                str: 100,
                karma: 0,
                poison: None,
                creature: None,
            },
            skills: BTreeMap::new(),
            followers: FollowerCount { current: 0, max: 5 },
            follower_ids: BTreeSet::new(),
            party: None,
            fame: 0,
            karma: 0,
        }
    }

    #[must_use]
    pub fn with_skill(mut self, skill: SkillName, fixed: u32) -> Self {
        self.skills.insert(skill, fixed);
        self
    }

    #[must_use]
    pub fn with_followers(mut self, current: u32, max: u32) -> Self {
        self.followers = FollowerCount { current, max };
        self
    }

    #[must_use]
    pub fn with_hits(mut self, hits: i32, hits_max: i32) -> Self {
        self.info.hits = hits;
        self.info.hits_max = hits_max;
        self
    }

    #[must_use]
    pub fn with_access(mut self, access: AccessLevel) -> Self {
        self.info.access = access;
        self
    }

    #[must_use]
    pub fn in_party(mut self, party: u32) -> Self {
        self.party = Some(party);
        self
    }
}

/// Everything creatures asked the sandbox to do.
#[derive(Clone, Debug, Default)]
pub struct SandboxLog {
    pub damage: Vec<(EntityId, i32, EntityId)>,
    pub heals: Vec<(EntityId, i32)>,
    pub cures: Vec<EntityId>,
    pub effects: Vec<(EntityId, Effect)>,
    pub notices: Vec<(EntityId, Notice)>,
    pub spells: Vec<(EntityId, SpellKey, Option<EntityId>)>,
    pub dropped_packs: Vec<EntityId>,
    pub cleared_packs: Vec<EntityId>,
    pub loot_generated: Vec<EntityId>,
    pub awards: Vec<(EntityId, i32, i32)>,
    pub detached: Vec<(EntityId, EntityId)>,
    pub steps: Vec<(EntityId, Point3D)>,
}

impl SandboxLog {
    pub fn effects_of(&self, source: EntityId) -> impl Iterator<Item = &Effect> {
        self.effects
            .iter()
            .filter(move |(id, _)| *id == source)
            .map(|(_, effect)| effect)
    }
}

#[derive(Clone, Debug)]
pub struct SandboxEnv {
    mobiles: BTreeMap<EntityId, SandboxMobile>,
    blocked: BTreeSet<(MapId, i32, i32)>,
    hidden: BTreeSet<EntityId>,
    corpses: Vec<(Location, u32)>,
    houses: Vec<(MapId, Point3D, Point3D)>,
    inactive_sectors: BTreeSet<MapId>,
    packs: BTreeMap<EntityId, u32>,
    pub log: SandboxLog,
}

impl Default for SandboxEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxEnv {
    pub fn new() -> Self {
        Self {
            mobiles: BTreeMap::new(),
            blocked: BTreeSet::new(),
            hidden: BTreeSet::new(),
            corpses: Vec::new(),
            houses: Vec::new(),
            inactive_sectors: BTreeSet::new(),
            packs: BTreeMap::new(),
            log: SandboxLog::default(),
        }
    }

    pub fn insert(&mut self, mobile: SandboxMobile) {
        self.mobiles.insert(mobile.info.id, mobile);
    }

    pub fn get(&self, id: EntityId) -> Option<&SandboxMobile> {
        self.mobiles.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut SandboxMobile> {
        self.mobiles.get_mut(&id)
    }

    pub fn mobiles(&self) -> impl Iterator<Item = &SandboxMobile> {
        self.mobiles.values()
    }

    pub fn block(&mut self, map: MapId, x: i32, y: i32) {
        self.blocked.insert((map, x, y));
    }

    /// Surrounds `at` with blocked tiles so every step fails.
    pub fn wall_in(&mut self, at: &Location) {
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx != 0 || dy != 0 {
                    self.block(at.map, at.point.x + dx, at.point.y + dy);
                }
            }
        }
    }

    pub fn clear_blocks(&mut self) {
        self.blocked.clear();
    }

    /// Takes `id` out of everyone's line of sight.
    pub fn hide(&mut self, id: EntityId) {
        self.hidden.insert(id);
    }

    pub fn add_corpse(&mut self, at: Location, items: u32) {
        self.corpses.push((at, items));
    }

    pub fn add_house(&mut self, map: MapId, min: Point3D, max: Point3D) {
        self.houses.push((map, min, max));
    }

    pub fn set_sector_active(&mut self, map: MapId, active: bool) {
        if active {
            self.inactive_sectors.remove(&map);
        } else {
            self.inactive_sectors.insert(map);
        }
    }

    pub fn pack_items(&self, owner: EntityId) -> u32 {
        self.packs.get(&owner).copied().unwrap_or(0)
    }

    pub fn follower_ids(&self, master: EntityId) -> Vec<EntityId> {
        self.mobiles
            .get(&master)
            .map(|m| m.follower_ids.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl MobileOracle for SandboxEnv {
    fn mobile(&self, id: EntityId) -> Option<MobileInfo> {
        self.mobiles.get(&id).map(|m| m.info.clone())
    }

    fn skill(&self, id: EntityId, skill: SkillName, _base: bool) -> u32 {
        self.mobiles
            .get(&id)
            .and_then(|m| m.skills.get(&skill).copied())
            .unwrap_or(0)
    }

    fn in_line_of_sight(&self, from: &Location, to: &Location) -> bool {
        if from.map != to.map {
            return false;
        }
        !self
            .hidden
            .iter()
            .filter_map(|id| self.mobiles.get(id))
            .any(|m| m.info.location == *to)
    }

    fn mobiles_in_range(&self, at: &Location, range: i32) -> Vec<MobileInfo> {
        self.mobiles
            .values()
            .filter(|m| m.info.location.in_range(at, range))
            .map(|m| m.info.clone())
            .collect()
    }

    fn can_be_harmful(&self, from: EntityId, to: EntityId) -> bool {
        from != to && self.mobiles.get(&to).is_some_and(|m| m.info.is_live())
    }

    fn can_be_beneficial(&self, _from: EntityId, to: EntityId) -> bool {
        self.mobiles.get(&to).is_some_and(|m| !m.info.deleted)
    }

    fn party_members(&self, id: EntityId) -> Vec<EntityId> {
        let Some(party) = self.mobiles.get(&id).and_then(|m| m.party) else {
            return Vec::new();
        };
        self.mobiles
            .values()
            .filter(|m| m.party == Some(party))
            .map(|m| m.info.id)
            .collect()
    }

    fn in_house_region(&self, at: &Location) -> bool {
        self.houses.iter().any(|(map, min, max)| {
            *map == at.map
                && (min.x..=max.x).contains(&at.point.x)
                && (min.y..=max.y).contains(&at.point.y)
        })
    }

    fn sector_active(&self, at: &Location) -> bool {
        !self.inactive_sectors.contains(&at.map)
    }
}

impl FollowerLedger for SandboxEnv {
    fn followers(&self, master: EntityId) -> Option<FollowerCount> {
        self.mobiles.get(&master).map(|m| m.followers)
    }

    fn set_followers(&mut self, master: EntityId, current: u32) {
        if let Some(m) = self.mobiles.get_mut(&master) {
            m.followers.current = current;
        }
    }

    fn link_follower(&mut self, master: EntityId, follower: EntityId) {
        if let Some(m) = self.mobiles.get_mut(&master) {
            m.follower_ids.insert(follower);
        }
    }

    fn unlink_follower(&mut self, master: EntityId, follower: EntityId) {
        if let Some(m) = self.mobiles.get_mut(&master) {
            m.follower_ids.remove(&follower);
        }
    }
}

impl WorldActions for SandboxEnv {
    fn step_toward(&mut self, mover: EntityId, from: &Location, to: &Point3D) -> Option<Point3D> {
        let dx = (to.x - from.point.x).signum();
        let dy = (to.y - from.point.y).signum();
        if dx == 0 && dy == 0 {
            return None;
        }
        let next = Point3D::new(from.point.x + dx, from.point.y + dy, from.point.z);
        if self.blocked.contains(&(from.map, next.x, next.y)) {
            return None;
        }
        self.log.steps.push((mover, next));
        Some(next)
    }

    fn apply_damage(&mut self, target: EntityId, amount: i32, source: EntityId) {
        if let Some(m) = self.mobiles.get_mut(&target) {
            m.info.hits = (m.info.hits - amount).max(0);
            if m.info.hits == 0 {
                m.info.alive = false;
            }
        }
        self.log.damage.push((target, amount, source));
    }

    fn heal(&mut self, target: EntityId, amount: i32) {
        if let Some(m) = self.mobiles.get_mut(&target) {
            m.info.hits = (m.info.hits + amount).min(m.info.hits_max);
        }
        self.log.heals.push((target, amount));
    }

    fn cure_poison(&mut self, target: EntityId, _healer: EntityId) -> bool {
        let cured = self
            .mobiles
            .get_mut(&target)
            .is_some_and(|m| m.info.poison.take().is_some());
        if cured {
            self.log.cures.push(target);
        }
        cured
    }

    fn rummage_corpse(&mut self, looter: EntityId, at: &Location, range: i32) -> bool {
        let Some(corpse) = self
            .corpses
            .iter_mut()
            .find(|(loc, items)| *items > 0 && loc.in_range(at, range))
        else {
            return false;
        };
        corpse.1 -= 1;
        *self.packs.entry(looter).or_default() += 1;
        true
    }

    fn drop_backpack(&mut self, owner: EntityId, _at: &Location) {
        self.packs.remove(&owner);
        self.log.dropped_packs.push(owner);
    }

    fn clear_backpack(&mut self, owner: EntityId) {
        self.packs.remove(&owner);
        self.log.cleared_packs.push(owner);
    }

    fn generate_loot(&mut self, creature: EntityId, _species: &str) {
        *self.packs.entry(creature).or_default() += 1;
        self.log.loot_generated.push(creature);
    }

    fn award(&mut self, to: EntityId, fame: i32, karma: i32) {
        if let Some(m) = self.mobiles.get_mut(&to) {
            m.fame += fame;
            m.karma += karma;
        }
        self.log.awards.push((to, fame, karma));
    }

    fn detach_from_spawner(&mut self, spawner: EntityId, creature: EntityId) {
        self.log.detached.push((spawner, creature));
    }

    fn cast_spell(&mut self, caster: EntityId, spell: &SpellKey, target: Option<EntityId>) -> bool {
        self.log.spells.push((caster, spell.clone(), target));
        true
    }

    fn emit(&mut self, source: EntityId, effect: Effect) {
        self.log.effects.push((source, effect));
    }

    fn notify(&mut self, to: EntityId, notice: Notice) {
        self.log.notices.push((to, notice));
    }
}
