//! Damage log and looting rights.
//!
//! Every mobile that hurts a creature gets one [`DamageEntry`], kept in the
//! order they first drew blood. Damage done by pets, summons or provoked
//! creatures also lands in a nested entry for the mobile responsible.

use std::time::Duration;

use crate::config::EngineConfig;
use crate::creature::Creature;
use crate::state::{EntityId, GameTime};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DamageEntry {
    pub damager: EntityId,
    pub amount: i32,
    pub last_damage: GameTime,
    /// Share of `amount` owed to whoever controlled the damager.
    pub responsible: Vec<DamageEntry>,
}

impl DamageEntry {
    fn new(damager: EntityId, now: GameTime) -> Self {
        Self {
            damager,
            amount: 0,
            last_damage: now,
            responsible: Vec::new(),
        }
    }

    pub fn has_expired(&self, now: GameTime, expiry: Duration) -> bool {
        now.since(self.last_damage) > expiry
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DamageLog {
    entries: Vec<DamageEntry>,
}

impl DamageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[DamageEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> i64 {
        self.entries.iter().map(|e| i64::from(e.amount)).sum()
    }

    pub fn record(
        &mut self,
        damager: EntityId,
        amount: i32,
        responsible: Option<EntityId>,
        now: GameTime,
    ) {
        let index = match self.entries.iter().position(|e| e.damager == damager) {
            Some(index) => index,
            None => {
                self.entries.push(DamageEntry::new(damager, now));
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[index];
        entry.amount = entry.amount.saturating_add(amount);
        entry.last_damage = now;

        let Some(master) = responsible else {
            return;
        };
        let sub = match entry.responsible.iter().position(|e| e.damager == master) {
            Some(i) => &mut entry.responsible[i],
            None => {
                entry.responsible.push(DamageEntry::new(master, now));
                let last = entry.responsible.len() - 1;
                &mut entry.responsible[last]
            }
        };
        sub.amount = sub.amount.saturating_add(amount);
        sub.last_damage = now;
    }

    /// Drops entries older than `expiry`. Returns how many were removed.
    pub fn prune(&mut self, now: GameTime, expiry: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.has_expired(now, expiry));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A contributor's credited damage and whether it earns a share.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageStore {
    pub mobile: EntityId,
    pub damage: i32,
    pub has_right: bool,
}

/// Ranks the players who earned a share of a kill.
///
/// Damage done through a pet is credited to the live player responsible for
/// it and only the remainder goes to the direct damager, and only if that is
/// a live player. The first contributor found gets the first-responder bonus.
/// The list is sorted by credited damage, highest first, and a contributor
/// qualifies when their damage reaches `top / divisor`, the divisor being
/// chosen by the victim's maximum hits.
///
/// Expired entries are pruned from `log`; nothing else in it changes.
pub fn get_looting_rights(
    log: &mut DamageLog,
    hits_max: i32,
    now: GameTime,
    config: &EngineConfig,
    is_live_player: impl Fn(EntityId) -> bool,
) -> Vec<DamageStore> {
    log.prune(now, config.combat.damage_entry_expiry());

    let mut rights: Vec<DamageStore> = Vec::new();
    let credit = |rights: &mut Vec<DamageStore>, mobile: EntityId, damage: i32| {
        match rights.iter_mut().find(|s| s.mobile == mobile) {
            Some(store) => store.damage = store.damage.saturating_add(damage),
            None => rights.push(DamageStore {
                mobile,
                damage,
                has_right: false,
            }),
        }
    };

    for entry in log.entries() {
        let mut damage = entry.amount;
        for sub in &entry.responsible {
            if !is_live_player(sub.damager) {
                continue;
            }
            credit(&mut rights, sub.damager, sub.amount);
            damage -= sub.amount;
        }
        if damage > 0 && is_live_player(entry.damager) {
            credit(&mut rights, entry.damager, damage);
        }
    }

    let Some(first) = rights.first_mut() else {
        return rights;
    };
    let bonus = 100 + i64::from(config.looting.first_responder_bonus_percent);
    first.damage = (i64::from(first.damage) * bonus / 100).clamp(0, i64::from(i32::MAX)) as i32;

    rights.sort_by(|a, b| b.damage.cmp(&a.damage));
    let top = i64::from(rights[0].damage);
    let divisor = i64::from(config.looting.divisor_for(hits_max));
    for store in &mut rights {
        store.has_right = i64::from(store.damage) * divisor >= top;
    }
    rights
}

impl Creature {
    pub fn damage_log(&self) -> &DamageLog {
        &self.damage_log
    }

    /// Looting rights over this creature's own damage log.
    pub fn looting_rights(
        &mut self,
        now: GameTime,
        config: &EngineConfig,
        is_live_player: impl Fn(EntityId) -> bool,
    ) -> Vec<DamageStore> {
        let hits_max = self.hits_max();
        get_looting_rights(&mut self.damage_log, hits_max, now, config, is_live_player)
    }
}
