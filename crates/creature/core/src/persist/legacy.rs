//! Unflagged layouts of versions 0 through 18.
//!
//! Each version appends fields to the previous one. Fields that later
//! versions dropped are still consumed so the stream stays aligned.

use super::PersistError;
use super::SaveReader;
use super::codec::{BodyExtras, ai_kind, fight_mode, friend_list, invalid, order, owner_list};
use crate::combat::FightMode;
use crate::config::EngineConfig;
use crate::control::{Allegiance, OrderType};
use crate::creature::{Creature, SpeciesTemplate, Speeds};
use crate::state::{EntityId, Point3D};
use crate::stats::{DamageRange, ResourceKind, ResourceSeeds};

/// Speeds old saves wrote verbatim from the classic speed tables.
const STANDARD_ACTIVE_SPEEDS: [f64; 10] = [0.175, 0.1, 0.15, 0.2, 0.25, 0.3, 0.4, 0.5, 0.6, 0.8];
const STANDARD_PASSIVE_SPEEDS: [f64; 10] = [0.35, 0.2, 0.4, 0.5, 0.6, 0.8, 1.0, 1.2, 1.6, 2.0];

/// Loyalty was stored on a 0-10 scale before this version.
const LOYALTY_RESCALED_IN: i32 = 16;
/// `Unfriend` was inserted into the order enum in this version.
const UNFRIEND_ADDED_IN: i32 = 13;

pub(super) fn read(
    c: &mut Creature,
    version: i32,
    r: &mut SaveReader<'_>,
    config: &EngineConfig,
) -> Result<BodyExtras, PersistError> {
    let mut extras = BodyExtras::default();

    c.current_ai = ai_kind(r.read_i32()?.into())?;
    c.default_ai = ai_kind(r.read_i32()?.into())?;
    c.range_perception = r.read_i32()?;
    if c.range_perception == EngineConfig::LEGACY_PERCEPTION {
        c.range_perception = config.default_perception;
    }
    c.range_fight = r.read_i32()?;
    c.team = r.read_i32()?;
    let stored = Speeds {
        active: r.read_f64()?,
        passive: r.read_f64()?,
        current: r.read_f64()?,
    };
    c.speeds = renormalize(stored, &c.template);
    let home = r.read_point()?;
    c.home = (home != Point3D::ZERO).then_some(home);

    if version >= 1 {
        c.range_home = r.read_i32()?;
        extras.attack_spells = Some(read_names(r)?);
        extras.defense_spells = Some(read_names(r)?);
    } else {
        c.range_home = 0;
    }

    let mut controlled = false;
    let mut control_master = None;
    let mut summon_end = None;
    let mut raw_order = 0;
    if version >= 2 {
        c.fight_mode = fight_mode(r.read_i32()?.into())?;
        controlled = r.read_bool()?;
        control_master = r.read_entity()?;
        c.control.target = r.read_entity()?;
        let destination = r.read_point()?;
        c.control.destination = (destination != Point3D::ZERO).then_some(destination);
        raw_order = r.read_i32()?;
        c.min_tame_skill = r.read_f64()?;
        if version < 9 {
            // max tame skill
            r.read_f64()?;
        }
        c.tamable = r.read_bool()?;
        if r.read_bool()? {
            summon_end = Some(r.read_delta_time()?);
        }
        c.control.slots = u32::try_from(r.read_i32()?).unwrap_or(0);
    } else {
        c.fight_mode = FightMode::Closest;
    }

    c.loyalty = if version >= 3 {
        r.read_i32()?
    } else {
        EngineConfig::MAX_LOYALTY
    };
    if version >= 4 {
        c.waypoint = r.read_entity()?;
    }
    let summon_master = if version >= 5 { r.read_entity()? } else { None };

    if version >= 6 {
        for kind in [ResourceKind::Hits, ResourceKind::Stam, ResourceKind::Mana] {
            let seed = r.read_i32()?;
            let seed = if version < 7 && seed == 0 {
                ResourceSeeds::UNSET
            } else {
                seed
            };
            c.seeds.set(kind, seed);
        }
        let min = r.read_i32()?;
        let max = r.read_i32()?;
        if min >= 0 && max >= 0 {
            c.damage = DamageRange::new(min, max);
        }
    }

    if version >= 8 {
        c.owners = owner_list(read_list(r)?);
    }
    c.generated_loot = if version >= 11 { r.read_bool()? } else { true };

    if version >= UNFRIEND_ADDED_IN {
        if r.read_bool()? {
            c.friends = friend_list(read_list(r)?);
        }
    } else if raw_order >= OrderType::Unfriend as i32 {
        raw_order += 1;
    }
    c.control.order = order(raw_order.into())?;

    if version < LOYALTY_RESCALED_IN && c.loyalty != EngineConfig::MAX_LOYALTY {
        c.loyalty *= 10;
    }
    c.loyalty = c.loyalty.clamp(0, EngineConfig::MAX_LOYALTY);

    if version >= 14 {
        c.remove_if_untamed = r.read_bool()?;
        c.remove_step = u32::try_from(r.read_i32()?).unwrap_or(0);
    }
    if version >= 17 {
        extras.delete_after = Some(r.read_duration()?);
    }
    if version >= 18 {
        c.corpse_name = r.read_opt_str()?;
    }

    c.allegiance = match (summon_end, summon_master.or(control_master)) {
        (Some(expires_at), Some(master)) => Allegiance::Summoned { master, expires_at },
        (None, Some(master)) if controlled && control_master.is_some() => Allegiance::Controlled { master },
        _ => Allegiance::Wild,
    };
    Ok(extras)
}

/// Speeds taken verbatim from the classic tables follow the species'
/// current tuning; hand-set speeds are kept.
fn renormalize(stored: Speeds, template: &SpeciesTemplate) -> Speeds {
    let standard_active = STANDARD_ACTIVE_SPEEDS.contains(&stored.active);
    let standard_passive = STANDARD_PASSIVE_SPEEDS.contains(&stored.passive);
    let mut speeds = stored;
    if standard_active && stored.current == stored.active {
        speeds.current = template.active_speed;
    } else if standard_passive && stored.current == stored.passive {
        speeds.current = template.passive_speed;
    }
    if standard_active {
        speeds.active = template.active_speed;
    }
    if standard_passive {
        speeds.passive = template.passive_speed;
    }
    speeds
}

fn read_count(r: &mut SaveReader<'_>) -> Result<usize, PersistError> {
    let count = r.read_i32()?;
    usize::try_from(count).map_err(|_| invalid("count", count))
}

fn read_names(r: &mut SaveReader<'_>) -> Result<Vec<String>, PersistError> {
    let count = read_count(r)?;
    let mut names = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        names.push(r.read_str()?);
    }
    Ok(names)
}

fn read_list(r: &mut SaveReader<'_>) -> Result<Vec<EntityId>, PersistError> {
    let count = read_count(r)?;
    let mut ids = Vec::with_capacity(count.min(r.remaining() / 4));
    for _ in 0..count {
        if let Some(id) = r.read_entity()? {
            ids.push(id);
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::ai::AiKind;
    use crate::creature::testing::*;
    use crate::error::{ErrorSeverity, GameError};
    use crate::persist::{LoadContext, PostLoadFixup, SaveWriter, codec::write_mobile};
    use crate::spell::{SpellKey, SpellRegistry};
    use crate::state::GameTime;

    /// Field values of an old record; `write` emits what `version` stored.
    struct OldRecord {
        current_ai: i32,
        perception: i32,
        speeds: [f64; 3],
        attack_spells: Vec<&'static str>,
        controlled: bool,
        master: i32,
        order: i32,
        summon_end_ms: Option<i64>,
        loyalty: i32,
        summon_master: i32,
        seeds: [i32; 3],
        owners: Vec<i32>,
        friends: Vec<i32>,
        delete_ms: i64,
        corpse_name: Option<&'static str>,
    }

    impl Default for OldRecord {
        fn default() -> Self {
            Self {
                current_ai: AiKind::Animal as i32,
                perception: 16,
                speeds: [0.33, 0.66, 0.66],
                attack_spells: Vec::new(),
                controlled: false,
                master: -1,
                order: 0,
                summon_end_ms: None,
                loyalty: 100,
                summon_master: -1,
                seeds: [120, -1, -1],
                owners: Vec::new(),
                friends: Vec::new(),
                delete_ms: 0,
                corpse_name: None,
            }
        }
    }

    impl OldRecord {
        fn write(&self, version: i32, w: &mut SaveWriter) {
            w.write_i32(self.current_ai);
            w.write_i32(AiKind::Animal as i32);
            w.write_i32(self.perception);
            w.write_i32(1);
            w.write_i32(0);
            for speed in self.speeds {
                w.write_f64(speed);
            }
            w.write_point(Point3D::new(100, 100, 0));
            if version >= 1 {
                w.write_i32(10);
                w.write_i32(self.attack_spells.len() as i32);
                for name in &self.attack_spells {
                    w.write_str(name);
                }
                w.write_i32(0);
            }
            if version >= 2 {
                w.write_i32(FightMode::Closest as i32);
                w.write_bool(self.controlled);
                w.write_i32(self.master);
                w.write_i32(-1);
                w.write_point(Point3D::ZERO);
                w.write_i32(self.order);
                w.write_f64(83.1);
                if version < 9 {
                    w.write_f64(99.9);
                }
                w.write_bool(true);
                w.write_bool(self.summon_end_ms.is_some());
                if let Some(ms) = self.summon_end_ms {
                    w.write_i64(ms);
                }
                w.write_i32(1);
            }
            if version >= 3 {
                w.write_i32(self.loyalty);
            }
            if version >= 4 {
                w.write_i32(-1);
            }
            if version >= 5 {
                w.write_i32(self.summon_master);
            }
            if version >= 6 {
                for seed in self.seeds {
                    w.write_i32(seed);
                }
                w.write_i32(1);
                w.write_i32(4);
            }
            if version >= 8 {
                w.write_i32(self.owners.len() as i32);
                for id in &self.owners {
                    w.write_i32(*id);
                }
            }
            if version >= 11 {
                w.write_bool(false);
            }
            if version >= 13 {
                w.write_bool(!self.friends.is_empty());
                if !self.friends.is_empty() {
                    w.write_i32(self.friends.len() as i32);
                    for id in &self.friends {
                        w.write_i32(*id);
                    }
                }
            }
            if version >= 14 {
                w.write_bool(false);
                w.write_i32(0);
            }
            if version >= 17 {
                w.write_i64(self.delete_ms);
            }
            if version >= 18 {
                w.write_opt_str(self.corpse_name);
            }
        }
    }

    const SAVED: GameTime = GameTime::from_secs(1_000);
    const LOADED: GameTime = GameTime::from_secs(50);

    fn species() -> BTreeMap<String, Arc<SpeciesTemplate>> {
        let mut t = template();
        t.active_speed = 0.3;
        t.passive_speed = 0.6;
        BTreeMap::from([(String::from("wolf"), Arc::new(t))])
    }

    fn load(version: i32, record: &OldRecord) -> Result<crate::persist::LoadedCreature, PersistError> {
        let mut w = SaveWriter::new(SAVED);
        write_mobile(&creature(), &mut w);
        w.write_i32(version);
        record.write(version, &mut w);
        let bytes = w.into_bytes();

        let species = species();
        let spells = SpellRegistry::with_magery();
        let config = EngineConfig::default();
        let mut r = SaveReader::new(&bytes, LOADED);
        let loaded = Creature::deserialize(
            &mut r,
            LoadContext {
                species: &species,
                spells: &spells,
                config: &config,
            },
        )?;
        assert_eq!(r.remaining(), 0, "v{version} left bytes unread");
        Ok(loaded)
    }

    #[test]
    fn every_legacy_version_stays_aligned() {
        for version in 0..=18 {
            let loaded = load(version, &OldRecord::default()).unwrap();
            assert_eq!(loaded.version, version);
            assert_eq!(loaded.creature.loyalty(), 100);
        }
    }

    #[test]
    fn version_zero_gets_defaults() {
        let c = load(0, &OldRecord::default()).unwrap().creature;
        assert_eq!(c.range_home(), 0);
        assert_eq!(c.fight_mode(), FightMode::Closest);
        assert!(c.is_wild());
        assert!(c.has_generated_loot());
        assert_eq!(c.home(), Some(Point3D::new(100, 100, 0)));
    }

    #[test]
    fn old_perception_default_is_raised() {
        let record = OldRecord {
            perception: EngineConfig::LEGACY_PERCEPTION,
            ..OldRecord::default()
        };
        assert_eq!(load(18, &record).unwrap().creature.range_perception(), 16);
    }

    #[test]
    fn standard_speeds_follow_the_species() {
        let record = OldRecord {
            speeds: [0.2, 0.4, 0.4],
            ..OldRecord::default()
        };
        let speeds = load(18, &record).unwrap().creature.speeds();
        assert_eq!((speeds.active, speeds.passive, speeds.current), (0.3, 0.6, 0.6));

        let custom = load(18, &OldRecord::default()).unwrap().creature.speeds();
        assert_eq!((custom.active, custom.passive, custom.current), (0.33, 0.66, 0.66));
    }

    #[test]
    fn old_orders_and_loyalty_are_migrated() {
        let record = OldRecord {
            controlled: true,
            master: 1,
            order: 5,
            loyalty: 7,
            owners: vec![1],
            ..OldRecord::default()
        };
        let c = load(12, &record).unwrap().creature;
        assert_eq!(c.control_master(), Some(MASTER));
        assert_eq!(c.control_order(), OrderType::Guard);
        assert_eq!(c.loyalty(), 70);
        assert_eq!(c.owners(), &[MASTER]);

        let c = load(16, &record).unwrap().creature;
        assert_eq!(c.control_order(), OrderType::Unfriend);
        assert_eq!(c.loyalty(), 7);
    }

    #[test]
    fn zero_seeds_before_v7_mean_unset() {
        let record = OldRecord {
            seeds: [0, 0, 55],
            ..OldRecord::default()
        };
        let c = load(6, &record).unwrap().creature;
        assert_eq!(c.seeds(), ResourceSeeds { hits: -1, stam: -1, mana: 55 });

        let c = load(7, &record).unwrap().creature;
        assert_eq!(c.seeds().hits, 0);
    }

    #[test]
    fn retired_ai_kinds_fall_back_to_the_default() {
        let record = OldRecord {
            current_ai: AiKind::Thief as i32,
            ..OldRecord::default()
        };
        let loaded = load(18, &record).unwrap();
        assert_eq!(loaded.creature.current_ai(), AiKind::Animal);
        assert!(loaded.fixups.contains(&PostLoadFixup::SetupAi { kind: AiKind::Animal }));
    }

    #[test]
    fn reflection_era_spell_names_are_skipped() {
        let record = OldRecord {
            attack_spells: vec!["Server.Spells.Third.FireballSpell", "magery.harm"],
            ..OldRecord::default()
        };
        let loaded = load(18, &record).unwrap();
        assert_eq!(loaded.creature.spells().attack, vec![SpellKey::new("magery.harm")]);
        assert_eq!(loaded.skipped_spells, vec![String::from("Server.Spells.Third.FireballSpell")]);
    }

    #[test]
    fn summons_keep_their_remaining_time() {
        let record = OldRecord {
            summon_end_ms: Some(30_000),
            summon_master: 1,
            ..OldRecord::default()
        };
        let loaded = load(18, &record).unwrap();
        let expires = LOADED + Duration::from_secs(30);
        assert_eq!(loaded.creature.summon_master(), Some(MASTER));
        assert_eq!(loaded.creature.summon_expires_at(), Some(expires));
        assert!(loaded.fixups.contains(&PostLoadFixup::ArmUnsummon { at: expires }));
        assert!(loaded.fixups.contains(&PostLoadFixup::RestoreFollowers { master: MASTER }));
    }

    #[test]
    fn abandoned_pets_restart_their_countdown() {
        let record = OldRecord {
            owners: vec![1],
            corpse_name: Some("a sad wolf"),
            ..OldRecord::default()
        };
        let loaded = load(18, &record).unwrap();
        assert_eq!(loaded.creature.corpse_name(), Some("a sad wolf"));
        assert!(loaded.fixups.contains(&PostLoadFixup::ArmDeleteTimer {
            after: Duration::from_secs(3 * 24 * 60 * 60),
        }));

        let record = OldRecord {
            delete_ms: 60_000,
            ..OldRecord::default()
        };
        let loaded = load(17, &record).unwrap();
        assert!(loaded.fixups.contains(&PostLoadFixup::ArmDeleteTimer {
            after: Duration::from_secs(60),
        }));
    }

    #[test]
    fn newer_versions_are_fatal() {
        let err = load(21, &OldRecord::default()).unwrap_err();
        assert_eq!(err, PersistError::UnknownVersion { version: 21, newest: 20 });
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
    }

    #[test]
    fn bad_order_values_are_rejected() {
        let record = OldRecord {
            order: 40,
            ..OldRecord::default()
        };
        assert!(matches!(
            load(18, &record),
            Err(PersistError::InvalidDiscriminant { field: "order", value: 40 })
        ));
    }
}
