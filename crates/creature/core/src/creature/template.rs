//! Species templates: the data a creature is constructed from.
//!
//! Templates are content. They are loaded once (RON in `creature-content`),
//! shared behind `Arc`, and never mutated. A live creature keeps a handle to
//! its template for the traits that are not per-instance state (breath,
//! healing and aura profiles, food preference, behaviour flags).

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ai::AiKind;
use crate::combat::FightMode;
use crate::config::EngineConfig;
use crate::spell::SpellKey;
use crate::stats::SkillName;
use crate::think::{AuraProfile, BreathProfile, HealProfile};

use super::FoodType;

/// Inclusive roll range used when spawning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollRange {
    pub min: i32,
    pub max: i32,
}

impl RollRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: i32) -> Self {
        Self::new(value, value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillRange {
    pub skill: SkillName,
    /// Whole points, e.g. `85.1`.
    pub min: f64,
    pub max: f64,
}

/// Behaviour switches that are properties of a species, not of an instance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpeciesTraits {
    pub can_rummage: bool,
    pub reacquire_on_movement: bool,
    pub can_be_distracted: bool,
    pub no_kill_awards: bool,
    pub unprovokable: bool,
    /// Escorts are never put on the unclaimed-pet delete timer.
    pub escort: bool,
    pub commandable: bool,
    pub invulnerable: bool,
    pub flees_when_hurt: bool,
}

impl Default for SpeciesTraits {
    fn default() -> Self {
        Self {
            can_rummage: false,
            reacquire_on_movement: false,
            can_be_distracted: true,
            no_kill_awards: false,
            unprovokable: false,
            escort: false,
            commandable: true,
            invulnerable: false,
            flees_when_hurt: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpeciesTemplate {
    pub name: String,
    pub ai: AiKind,
    pub fight_mode: FightMode,
    pub range_perception: i32,
    pub range_fight: i32,
    /// Seconds per think while fighting.
    pub active_speed: f64,
    /// Seconds per think while idle.
    pub passive_speed: f64,
    pub team: i32,
    pub range_home: i32,
    pub seeks_home: bool,
    pub str: RollRange,
    pub dex: RollRange,
    pub int: RollRange,
    /// Seeds for the resource ceilings; `None` derives them from base stats.
    pub hits: Option<RollRange>,
    pub stam: Option<RollRange>,
    pub mana: Option<RollRange>,
    pub damage: RollRange,
    pub skills: Vec<SkillRange>,
    pub fame: i32,
    pub karma: i32,
    pub tamable: bool,
    pub min_tame_skill: f64,
    pub control_slots: u32,
    pub food: FoodType,
    pub breath: Option<BreathProfile>,
    pub heal: Option<HealProfile>,
    pub aura: Option<AuraProfile>,
    pub traits: SpeciesTraits,
    pub attack_spells: Vec<SpellKey>,
    pub defense_spells: Vec<SpellKey>,
}

impl Default for SpeciesTemplate {
    fn default() -> Self {
        Self {
            name: String::from("creature"),
            ai: AiKind::Melee,
            fight_mode: FightMode::Closest,
            range_perception: EngineConfig::DEFAULT_PERCEPTION,
            range_fight: 1,
            active_speed: 0.2,
            passive_speed: 0.4,
            team: 0,
            range_home: 10,
            seeks_home: false,
            str: RollRange::fixed(50),
            dex: RollRange::fixed(50),
            int: RollRange::fixed(50),
            hits: None,
            stam: None,
            mana: None,
            damage: RollRange::new(1, 4),
            skills: Vec::new(),
            fame: 0,
            karma: 0,
            tamable: false,
            min_tame_skill: 0.0,
            control_slots: 1,
            food: FoodType::MEAT,
            breath: None,
            heal: None,
            aura: None,
            traits: SpeciesTraits::default(),
            attack_spells: Vec::new(),
            defense_spells: Vec::new(),
        }
    }
}

/// Lookup of species templates by their stable key.
pub trait SpeciesOracle {
    fn template(&self, key: &str) -> Option<Arc<SpeciesTemplate>>;
}

impl SpeciesOracle for BTreeMap<String, Arc<SpeciesTemplate>> {
    fn template(&self, key: &str) -> Option<Arc<SpeciesTemplate>> {
        self.get(key).cloned()
    }
}
