//! Creature save records.
//!
//! ```text
//! record  := mobile version body
//! mobile  := species id name location alive stats resources skills
//!            fame karma poison modifiers
//! body    := legacy fields            (version 0..=18)
//!          | flags field*             (version 19, 20)
//! ```
//!
//! Flagged bodies only carry fields that differ from what the species
//! template gives a fresh creature.

use std::time::Duration;

use super::legacy;
use super::{PersistError, SaveFlags, SaveReader, SaveWriter};
use crate::ai::{AiKind, AiRegistry, LiveCreature};
use crate::combat::FightMode;
use crate::config::EngineConfig;
use crate::context::CreatureContext;
use crate::control::{Allegiance, BardState, OrderType};
use crate::creature::{Cooldowns, Creature, FriendList, OwnerList, SpawnerLink, SpeciesOracle};
use crate::schedule::CreatureTask;
use crate::spell::{SpellKey, SpellRegistry};
use crate::state::{EntityId, GameTime, MapId};
use crate::stats::{DamageRange, ResourceSeeds, SkillName, SkillValue, StatKind, StatModifier};

pub const CURRENT_VERSION: i32 = 20;
/// First version with the flagged layout.
pub const FLAGGED_SINCE: i32 = 19;

/// Work that needs other entities or the scheduler, applied once every
/// record of a load has been read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostLoadFixup {
    /// Charge the master's follower slots again.
    RestoreFollowers { master: EntityId },
    ArmUnsummon { at: GameTime },
    ArmDeleteTimer { after: Duration },
    /// Drop stat modifiers that ran out while the shard was down.
    PruneModifiers,
    /// Instantiate and set up the behaviour for `kind`.
    SetupAi { kind: AiKind },
    RefreshSpeed,
}

/// A creature read back from a record, not yet placed in the world.
#[derive(Debug)]
pub struct LoadedCreature {
    pub creature: Creature,
    pub version: i32,
    /// Spell keys the registry no longer knows.
    pub skipped_spells: Vec<String>,
    pub fixups: Vec<PostLoadFixup>,
}

impl LoadedCreature {
    /// Applies the fixups in order and hands the creature its behaviour.
    pub fn finish(self, registry: &AiRegistry, ctx: &mut CreatureContext<'_>) -> LiveCreature {
        let Self {
            mut creature,
            fixups,
            ..
        } = self;
        for fixup in fixups {
            match fixup {
                PostLoadFixup::RestoreFollowers { .. } => creature.restore_followers(ctx),
                PostLoadFixup::ArmUnsummon { at } => {
                    let id = ctx.tasks.schedule(creature.id, at, CreatureTask::Unsummon);
                    creature.timers.unsummon = Some(id);
                }
                PostLoadFixup::ArmDeleteTimer { after } => creature.arm_delete_timer(after, ctx),
                PostLoadFixup::PruneModifiers => {
                    creature.modifiers.prune(ctx.now);
                }
                // LiveCreature::new below runs setup for the current kind.
                PostLoadFixup::SetupAi { .. } => {}
                PostLoadFixup::RefreshSpeed => creature.refresh_speed(),
            }
        }
        LiveCreature::new(creature, registry, ctx)
    }
}

/// Lookups a reader needs besides the bytes.
#[derive(Clone, Copy)]
pub struct LoadContext<'a> {
    pub species: &'a dyn SpeciesOracle,
    pub spells: &'a SpellRegistry,
    pub config: &'a EngineConfig,
}

impl Creature {
    /// Writes the creature with the current version.
    pub fn serialize(&self, w: &mut SaveWriter) {
        write_mobile(self, w);
        w.write_i32(CURRENT_VERSION);
        write_flagged(self, w);
    }

    /// Reads a record written by any known version.
    pub fn deserialize(r: &mut SaveReader<'_>, load: LoadContext<'_>) -> Result<LoadedCreature, PersistError> {
        let mut creature = read_mobile(r, load)?;
        let version = r.read_i32()?;
        if !(0..=CURRENT_VERSION).contains(&version) {
            return Err(PersistError::UnknownVersion {
                version,
                newest: CURRENT_VERSION,
            });
        }

        let body = if version >= FLAGGED_SINCE {
            read_flagged(&mut creature, version, r)?
        } else {
            legacy::read(&mut creature, version, r, load.config)?
        };

        if creature.default_ai.is_deprecated() {
            creature.default_ai = creature.template.ai;
        }
        if creature.current_ai.is_deprecated() {
            creature.current_ai = creature.default_ai.resolve(creature.template.ai);
        }

        let mut skipped_spells = Vec::new();
        let attack = std::mem::take(&mut creature.spells.attack);
        let defense = std::mem::take(&mut creature.spells.defense);
        creature.spells.attack = resolve_spells(body.attack_spells, attack, load.spells, &mut skipped_spells);
        creature.spells.defense = resolve_spells(body.defense_spells, defense, load.spells, &mut skipped_spells);

        let fixups = plan_fixups(&creature, body.delete_after, load.config);
        Ok(LoadedCreature {
            creature,
            version,
            skipped_spells,
            fixups,
        })
    }
}

/// Fields every body layout hands back for shared post-processing.
#[derive(Debug, Default)]
pub(super) struct BodyExtras {
    pub attack_spells: Option<Vec<String>>,
    pub defense_spells: Option<Vec<String>>,
    pub delete_after: Option<Duration>,
}

/// `None` keeps `fallback`, the list the template gave the creature.
fn resolve_spells(
    keys: Option<Vec<String>>,
    fallback: Vec<SpellKey>,
    registry: &SpellRegistry,
    skipped: &mut Vec<String>,
) -> Vec<SpellKey> {
    let Some(keys) = keys else {
        return fallback;
    };
    keys.into_iter()
        .filter_map(|key| {
            if registry.contains(&key) {
                Some(SpellKey::new(key))
            } else {
                skipped.push(key);
                None
            }
        })
        .collect()
}

fn plan_fixups(creature: &Creature, delete_after: Option<Duration>, config: &EngineConfig) -> Vec<PostLoadFixup> {
    let mut fixups = Vec::new();
    if let Some(master) = creature.master() {
        fixups.push(PostLoadFixup::RestoreFollowers { master });
    }
    if let Allegiance::Summoned { expires_at, .. } = creature.allegiance {
        fixups.push(PostLoadFixup::ArmUnsummon { at: expires_at });
    }
    let delete_after = delete_after.filter(|d| !d.is_zero());
    let unclaimed = creature.last_owner().is_some() && creature.is_wild() && !creature.stabled;
    if !creature.stabled && !creature.is_controlled() && (delete_after.is_some() || unclaimed) {
        fixups.push(PostLoadFixup::ArmDeleteTimer {
            after: delete_after.unwrap_or_else(|| config.upkeep.unclaimed_delete()),
        });
    }
    if !creature.modifiers.is_empty() {
        fixups.push(PostLoadFixup::PruneModifiers);
    }
    fixups.push(PostLoadFixup::SetupAi {
        kind: creature.current_ai,
    });
    fixups.push(PostLoadFixup::RefreshSpeed);
    fixups
}

// ===== mobile block =====

fn stat_code(kind: StatKind) -> u8 {
    match kind {
        StatKind::Str => 0,
        StatKind::Dex => 1,
        StatKind::Int => 2,
    }
}

fn stat_from_code(code: u8) -> Result<StatKind, PersistError> {
    match code {
        0 => Ok(StatKind::Str),
        1 => Ok(StatKind::Dex),
        2 => Ok(StatKind::Int),
        other => Err(invalid("stat", other)),
    }
}

pub(super) fn invalid(field: &'static str, value: impl Into<i64>) -> PersistError {
    PersistError::InvalidDiscriminant {
        field,
        value: value.into(),
    }
}

pub(super) fn write_mobile(c: &Creature, w: &mut SaveWriter) {
    w.write_str(&c.species);
    w.write_entity(Some(c.id));
    w.write_str(&c.name);
    w.write_location(c.location);
    w.write_bool(c.alive);
    w.write_i32(c.stats.str);
    w.write_i32(c.stats.dex);
    w.write_i32(c.stats.int);
    w.write_i32(c.resources.hits);
    w.write_i32(c.resources.stam);
    w.write_i32(c.resources.mana);

    w.write_encoded_len(c.skills.len());
    for (name, value) in c.skills.iter() {
        w.write_u8(name as u8);
        w.write_u32(value.base);
        w.write_u32(value.cap);
    }

    w.write_i32(c.fame);
    w.write_i32(c.karma);
    w.write_bool(c.poison.is_some());
    if let Some(level) = c.poison {
        w.write_u8(level);
    }

    let modifiers: Vec<&StatModifier> = c.modifiers.iter().collect();
    w.write_encoded_len(modifiers.len());
    for m in modifiers {
        w.write_str(&m.name);
        w.write_u8(stat_code(m.kind));
        w.write_i32(m.offset);
        w.write_bool(m.expires_at.is_some());
        if let Some(at) = m.expires_at {
            w.write_delta_time(at);
        }
    }
}

fn read_mobile(r: &mut SaveReader<'_>, load: LoadContext<'_>) -> Result<Creature, PersistError> {
    let species = r.read_str()?;
    let template = load
        .species
        .template(&species)
        .ok_or_else(|| PersistError::UnknownSpecies { key: species.clone() })?;
    let raw_id = r.read_i32()?;
    let id = EntityId::from_raw(raw_id).ok_or_else(|| invalid("id", raw_id))?;
    let name = r.read_str()?;
    let location = r.read_location()?;

    let mut c = Creature::from_template(id, &species, template, location, r.loaded_at(), load.config);
    c.name = name;
    c.alive = r.read_bool()?;
    c.stats.str = r.read_i32()?;
    c.stats.dex = r.read_i32()?;
    c.stats.int = r.read_i32()?;
    c.resources.hits = r.read_i32()?;
    c.resources.stam = r.read_i32()?;
    c.resources.mana = r.read_i32()?;

    for _ in 0..r.read_encoded_len()? {
        let code = r.read_u8()?;
        let name = SkillName::from_repr(code).ok_or_else(|| invalid("skill", code))?;
        let base = r.read_u32()?;
        let cap = r.read_u32()?;
        c.skills.set_entry(name, SkillValue { base, cap });
    }

    c.fame = r.read_i32()?;
    c.karma = r.read_i32()?;
    c.poison = if r.read_bool()? { Some(r.read_u8()?) } else { None };

    for _ in 0..r.read_encoded_len()? {
        let name = r.read_str()?;
        let kind = stat_from_code(r.read_u8()?)?;
        let offset = r.read_i32()?;
        let mut modifier = StatModifier::new(name, kind, offset);
        if r.read_bool()? {
            modifier = modifier.until(r.read_delta_time()?);
        }
        c.modifiers.add(modifier);
    }
    Ok(c)
}

// ===== flagged body =====

fn allegiance_code(allegiance: Allegiance) -> u8 {
    match allegiance {
        Allegiance::Wild => 0,
        Allegiance::Controlled { .. } => 1,
        Allegiance::Summoned { .. } => 2,
    }
}

fn write_flagged(c: &Creature, w: &mut SaveWriter) {
    let t = &*c.template;
    let saved_at = w.saved_at();
    let template_damage = DamageRange::new(t.damage.min, t.damage.max);
    let cooldowns = [
        c.cooldowns.next_reacquire,
        c.cooldowns.next_heal,
        c.cooldowns.next_heal_owner,
        c.cooldowns.next_breath,
        c.cooldowns.next_aura,
        c.cooldowns.next_rummage,
    ];
    let delete_left = c
        .timers
        .delete
        .filter(|_| !c.stabled && !c.is_controlled())
        .map(|(_, at)| at.remaining_from(saved_at))
        .filter(|left| !left.is_zero());

    let mut flags = SaveFlags::empty();
    flags.set(SaveFlags::CURRENT_AI, c.current_ai != t.ai);
    flags.set(SaveFlags::DEFAULT_AI, c.default_ai != t.ai);
    flags.set(SaveFlags::PERCEPTION, c.range_perception != t.range_perception);
    flags.set(SaveFlags::FIGHT_RANGE, c.range_fight != t.range_fight);
    flags.set(SaveFlags::TEAM, c.team != t.team);
    flags.set(
        SaveFlags::SPEEDS,
        c.speeds.active != t.active_speed || c.speeds.passive != t.passive_speed,
    );
    flags.set(SaveFlags::HOME, c.home.is_some());
    flags.set(SaveFlags::RANGE_HOME, c.range_home != t.range_home);
    flags.set(SaveFlags::ATTACK_SPELLS, c.spells.attack != t.attack_spells);
    flags.set(SaveFlags::DEFENSE_SPELLS, c.spells.defense != t.defense_spells);
    flags.set(SaveFlags::FIGHT_MODE, c.fight_mode != t.fight_mode);
    flags.set(
        SaveFlags::CONTROL,
        !c.is_wild()
            || c.control.order != OrderType::None
            || c.control.target.is_some()
            || c.control.destination.is_some()
            || c.stabled
            || c.abandoned,
    );
    flags.set(
        SaveFlags::TAMING,
        c.tamable != t.tamable || c.min_tame_skill != t.min_tame_skill || c.control.slots != t.control_slots,
    );
    flags.set(SaveFlags::LOYALTY, c.loyalty != EngineConfig::MAX_LOYALTY);
    flags.set(SaveFlags::WAYPOINT, c.waypoint.is_some());
    flags.set(SaveFlags::SEEDS, c.seeds != ResourceSeeds::default());
    flags.set(SaveFlags::DAMAGE, c.damage != template_damage);
    flags.set(SaveFlags::OWNERS, !c.owners.is_empty());
    flags.set(SaveFlags::GENERATED_LOOT, c.generated_loot);
    flags.set(SaveFlags::FRIENDS, !c.friends.is_empty());
    flags.set(SaveFlags::REMOVAL, c.remove_if_untamed || c.remove_step > 0);
    flags.set(SaveFlags::DELETE_TIME, delete_left.is_some());
    flags.set(SaveFlags::CORPSE_NAME, c.corpse_name.is_some());
    flags.set(SaveFlags::COOLDOWNS, cooldowns.iter().any(|at| *at > saved_at));
    flags.set(SaveFlags::BARD, c.bard.is_active() || c.bard.master.is_some());
    flags.set(SaveFlags::SPAWNER, c.spawner.is_some());
    flags.set(SaveFlags::SEEKS_HOME, c.seeks_home != t.seeks_home);

    w.write_encoded_u32(flags.bits());

    if flags.contains(SaveFlags::CURRENT_AI) {
        w.write_u8(c.current_ai as u8);
    }
    if flags.contains(SaveFlags::DEFAULT_AI) {
        w.write_u8(c.default_ai as u8);
    }
    if flags.contains(SaveFlags::PERCEPTION) {
        w.write_i32(c.range_perception);
    }
    if flags.contains(SaveFlags::FIGHT_RANGE) {
        w.write_i32(c.range_fight);
    }
    if flags.contains(SaveFlags::TEAM) {
        w.write_i32(c.team);
    }
    if flags.contains(SaveFlags::SPEEDS) {
        w.write_f64(c.speeds.active);
        w.write_f64(c.speeds.passive);
        w.write_f64(c.speeds.current);
    }
    if let Some(home) = c.home {
        w.write_point(home);
    }
    if flags.contains(SaveFlags::RANGE_HOME) {
        w.write_i32(c.range_home);
    }
    if flags.contains(SaveFlags::ATTACK_SPELLS) {
        write_spells(&c.spells.attack, w);
    }
    if flags.contains(SaveFlags::DEFENSE_SPELLS) {
        write_spells(&c.spells.defense, w);
    }
    if flags.contains(SaveFlags::FIGHT_MODE) {
        w.write_u8(c.fight_mode as u8);
    }
    if flags.contains(SaveFlags::CONTROL) {
        w.write_u8(allegiance_code(c.allegiance));
        w.write_entity(c.master());
        if let Allegiance::Summoned { expires_at, .. } = c.allegiance {
            w.write_delta_time(expires_at);
        }
        w.write_u8(c.control.order as u8);
        w.write_entity(c.control.target);
        w.write_bool(c.control.destination.is_some());
        if let Some(destination) = c.control.destination {
            w.write_point(destination);
        }
        w.write_bool(c.stabled);
        w.write_bool(c.abandoned);
    }
    if flags.contains(SaveFlags::TAMING) {
        w.write_bool(c.tamable);
        w.write_f64(c.min_tame_skill);
        w.write_encoded_u32(c.control.slots);
    }
    if flags.contains(SaveFlags::LOYALTY) {
        w.write_i32(c.loyalty);
    }
    if flags.contains(SaveFlags::WAYPOINT) {
        w.write_entity(c.waypoint);
    }
    if flags.contains(SaveFlags::SEEDS) {
        w.write_i32(c.seeds.hits);
        w.write_i32(c.seeds.stam);
        w.write_i32(c.seeds.mana);
    }
    if flags.contains(SaveFlags::DAMAGE) {
        w.write_i32(c.damage.min);
        w.write_i32(c.damage.max);
    }
    if flags.contains(SaveFlags::OWNERS) {
        w.write_entities(&c.owners);
    }
    // GENERATED_LOOT carries no payload.
    if flags.contains(SaveFlags::FRIENDS) {
        w.write_entities(&c.friends);
    }
    if flags.contains(SaveFlags::REMOVAL) {
        w.write_bool(c.remove_if_untamed);
        w.write_encoded_u32(c.remove_step);
    }
    if let Some(left) = delete_left {
        w.write_duration(left);
    }
    if let Some(name) = &c.corpse_name {
        w.write_str(name);
    }
    if flags.contains(SaveFlags::COOLDOWNS) {
        for at in cooldowns {
            w.write_delta_time(at);
        }
    }
    if flags.contains(SaveFlags::BARD) {
        w.write_bool(c.bard.provoked);
        w.write_bool(c.bard.pacified);
        w.write_entity(c.bard.master);
        w.write_entity(c.bard.target);
        w.write_delta_time(c.bard.ends_at);
    }
    if let Some(spawner) = c.spawner {
        w.write_entity(Some(spawner.id));
        w.write_u8(spawner.map.0);
        w.write_bool(spawner.unlink_on_taming);
    }
    if flags.contains(SaveFlags::SEEKS_HOME) {
        w.write_bool(c.seeks_home);
    }
}

fn write_spells(keys: &[SpellKey], w: &mut SaveWriter) {
    w.write_encoded_len(keys.len());
    for key in keys {
        w.write_str(key.as_str());
    }
}

fn read_spells(r: &mut SaveReader<'_>) -> Result<Vec<String>, PersistError> {
    let len = r.read_encoded_len()?;
    let mut keys = Vec::with_capacity(len.min(r.remaining()));
    for _ in 0..len {
        keys.push(r.read_str()?);
    }
    Ok(keys)
}

pub(super) fn ai_kind(value: i64) -> Result<AiKind, PersistError> {
    u8::try_from(value)
        .ok()
        .and_then(AiKind::from_repr)
        .ok_or_else(|| invalid("ai", value))
}

pub(super) fn fight_mode(value: i64) -> Result<FightMode, PersistError> {
    u8::try_from(value)
        .ok()
        .and_then(FightMode::from_repr)
        .ok_or_else(|| invalid("fight mode", value))
}

pub(super) fn order(value: i64) -> Result<OrderType, PersistError> {
    u8::try_from(value)
        .ok()
        .and_then(OrderType::from_repr)
        .ok_or_else(|| invalid("order", value))
}

pub(super) fn owner_list(ids: Vec<EntityId>) -> OwnerList {
    ids.into_iter().take(EngineConfig::MAX_OWNERS).collect()
}

pub(super) fn friend_list(ids: Vec<EntityId>) -> FriendList {
    ids.into_iter().take(EngineConfig::MAX_FRIENDS).collect()
}

fn read_flagged(c: &mut Creature, version: i32, r: &mut SaveReader<'_>) -> Result<BodyExtras, PersistError> {
    let bits = r.read_encoded_u32()?;
    let flags = SaveFlags::from_bits(bits)
        .filter(|flags| SaveFlags::allowed_in(version).contains(*flags))
        .ok_or(PersistError::InvalidFlags { version, bits })?;
    let mut extras = BodyExtras::default();

    if flags.contains(SaveFlags::CURRENT_AI) {
        c.current_ai = ai_kind(r.read_u8()?.into())?;
    }
    if flags.contains(SaveFlags::DEFAULT_AI) {
        c.default_ai = ai_kind(r.read_u8()?.into())?;
    }
    if flags.contains(SaveFlags::PERCEPTION) {
        c.range_perception = r.read_i32()?;
    }
    if flags.contains(SaveFlags::FIGHT_RANGE) {
        c.range_fight = r.read_i32()?;
    }
    if flags.contains(SaveFlags::TEAM) {
        c.team = r.read_i32()?;
    }
    if flags.contains(SaveFlags::SPEEDS) {
        c.speeds.active = r.read_f64()?;
        c.speeds.passive = r.read_f64()?;
        c.speeds.current = r.read_f64()?;
    }
    if flags.contains(SaveFlags::HOME) {
        c.home = Some(r.read_point()?);
    }
    if flags.contains(SaveFlags::RANGE_HOME) {
        c.range_home = r.read_i32()?;
    }
    if flags.contains(SaveFlags::ATTACK_SPELLS) {
        extras.attack_spells = Some(read_spells(r)?);
    }
    if flags.contains(SaveFlags::DEFENSE_SPELLS) {
        extras.defense_spells = Some(read_spells(r)?);
    }
    if flags.contains(SaveFlags::FIGHT_MODE) {
        c.fight_mode = fight_mode(r.read_u8()?.into())?;
    }
    if flags.contains(SaveFlags::CONTROL) {
        let code = r.read_u8()?;
        let master = r.read_entity()?;
        c.allegiance = match (code, master) {
            (0, _) => Allegiance::Wild,
            (1, Some(master)) => Allegiance::Controlled { master },
            (2, Some(master)) => Allegiance::Summoned {
                master,
                expires_at: r.read_delta_time()?,
            },
            (code, _) => return Err(invalid("allegiance", code)),
        };
        c.control.order = order(r.read_u8()?.into())?;
        c.control.target = r.read_entity()?;
        c.control.destination = if r.read_bool()? { Some(r.read_point()?) } else { None };
        c.stabled = r.read_bool()?;
        c.abandoned = r.read_bool()?;
    }
    if flags.contains(SaveFlags::TAMING) {
        c.tamable = r.read_bool()?;
        c.min_tame_skill = r.read_f64()?;
        c.control.slots = r.read_encoded_u32()?;
    }
    if flags.contains(SaveFlags::LOYALTY) {
        c.loyalty = r.read_i32()?.clamp(0, EngineConfig::MAX_LOYALTY);
    }
    if flags.contains(SaveFlags::WAYPOINT) {
        c.waypoint = r.read_entity()?;
    }
    if flags.contains(SaveFlags::SEEDS) {
        c.seeds.hits = r.read_i32()?;
        c.seeds.stam = r.read_i32()?;
        c.seeds.mana = r.read_i32()?;
    }
    if flags.contains(SaveFlags::DAMAGE) {
        c.damage = DamageRange {
            min: r.read_i32()?,
            max: r.read_i32()?,
        };
    }
    if flags.contains(SaveFlags::OWNERS) {
        c.owners = owner_list(r.read_entities()?);
    }
    c.generated_loot = flags.contains(SaveFlags::GENERATED_LOOT);
    if flags.contains(SaveFlags::FRIENDS) {
        c.friends = friend_list(r.read_entities()?);
    }
    if flags.contains(SaveFlags::REMOVAL) {
        c.remove_if_untamed = r.read_bool()?;
        c.remove_step = r.read_encoded_u32()?;
    }
    if flags.contains(SaveFlags::DELETE_TIME) {
        extras.delete_after = Some(r.read_duration()?);
    }
    if flags.contains(SaveFlags::CORPSE_NAME) {
        c.corpse_name = Some(r.read_str()?);
    }
    if flags.contains(SaveFlags::COOLDOWNS) {
        c.cooldowns = Cooldowns {
            next_reacquire: r.read_delta_time()?,
            next_heal: r.read_delta_time()?,
            next_heal_owner: r.read_delta_time()?,
            next_breath: r.read_delta_time()?,
            next_aura: r.read_delta_time()?,
            next_rummage: r.read_delta_time()?,
        };
    }
    if flags.contains(SaveFlags::BARD) {
        c.bard = BardState {
            provoked: r.read_bool()?,
            pacified: r.read_bool()?,
            master: r.read_entity()?,
            target: r.read_entity()?,
            ends_at: r.read_delta_time()?,
        };
    }
    if flags.contains(SaveFlags::SPAWNER) {
        let raw = r.read_i32()?;
        let id = EntityId::from_raw(raw).ok_or_else(|| invalid("spawner", raw))?;
        c.spawner = Some(SpawnerLink {
            id,
            map: MapId(r.read_u8()?),
            unlink_on_taming: r.read_bool()?,
        });
    }
    if flags.contains(SaveFlags::SEEKS_HOME) {
        c.seeks_home = r.read_bool()?;
    }
    Ok(extras)
}
