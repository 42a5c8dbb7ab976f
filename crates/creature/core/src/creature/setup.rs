//! Spawn-time customization: seeds, stat rolls, skills, fame and karma.
//!
//! Setting a seed or a base stat refills the matching resource to its new
//! ceiling, so a freshly rolled creature always starts at full health.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::env::RngOracle;
use crate::state::{EntityId, GameTime, Location};
use crate::stats::{DamageRange, ResourceKind, SkillName, StatKind};

use super::{Creature, RollRange, SpeciesTemplate};

/// Fame (and negated karma) bands for levels 1 through 5.
const FAME_LEVELS: [(i32, i32); 5] = [
    (0, 1249),
    (1250, 2499),
    (2500, 4999),
    (5000, 9999),
    (10000, 10000),
];

impl Creature {
    /// Builds a creature and rolls every range in its template.
    pub fn spawn(
        id: EntityId,
        species: &str,
        template: Arc<SpeciesTemplate>,
        location: Location,
        now: GameTime,
        config: &EngineConfig,
        rng: &mut dyn RngOracle,
    ) -> Self {
        let t = Arc::clone(&template);
        let mut creature = Self::from_template(id, species, template, location, now, config);
        creature.set_str_range(t.str.min, t.str.max, rng);
        creature.set_dex_range(t.dex.min, t.dex.max, rng);
        creature.set_int_range(t.int.min, t.int.max, rng);
        if let Some(RollRange { min, max }) = t.hits {
            creature.set_hits_range(min, max, rng);
        }
        if let Some(RollRange { min, max }) = t.stam {
            creature.set_stam_range(min, max, rng);
        }
        if let Some(RollRange { min, max }) = t.mana {
            creature.set_mana_range(min, max, rng);
        }
        creature.set_damage(t.damage.min, t.damage.max);
        for skill in &t.skills {
            creature.set_skill(skill.skill, skill.min, skill.max, rng);
        }
        creature.home = Some(location.point);
        creature
    }

    fn set_seed(&mut self, kind: ResourceKind, value: i32) {
        self.seeds.set(kind, value);
        self.resources.set(kind, self.effective_cap(kind));
    }

    pub fn set_hits(&mut self, value: i32) {
        self.set_seed(ResourceKind::Hits, value);
    }

    pub fn set_hits_range(&mut self, min: i32, max: i32, rng: &mut dyn RngOracle) {
        self.set_hits(rng.range_i32(min, max));
    }

    pub fn set_stam(&mut self, value: i32) {
        self.set_seed(ResourceKind::Stam, value);
    }

    pub fn set_stam_range(&mut self, min: i32, max: i32, rng: &mut dyn RngOracle) {
        self.set_stam(rng.range_i32(min, max));
    }

    pub fn set_mana(&mut self, value: i32) {
        self.set_seed(ResourceKind::Mana, value);
    }

    pub fn set_mana_range(&mut self, min: i32, max: i32, rng: &mut dyn RngOracle) {
        self.set_mana(rng.range_i32(min, max));
    }

    /// Sets a base stat and refills every resource.
    pub fn set_stat(&mut self, kind: StatKind, value: i32) {
        self.stats.set(kind, value.max(1));
        self.fill_resources();
    }

    pub fn set_str(&mut self, value: i32) {
        self.set_stat(StatKind::Str, value);
    }

    pub fn set_str_range(&mut self, min: i32, max: i32, rng: &mut dyn RngOracle) {
        self.set_str(rng.range_i32(min, max));
    }

    pub fn set_dex(&mut self, value: i32) {
        self.set_stat(StatKind::Dex, value);
    }

    pub fn set_dex_range(&mut self, min: i32, max: i32, rng: &mut dyn RngOracle) {
        self.set_dex(rng.range_i32(min, max));
    }

    pub fn set_int(&mut self, value: i32) {
        self.set_stat(StatKind::Int, value);
    }

    pub fn set_int_range(&mut self, min: i32, max: i32, rng: &mut dyn RngOracle) {
        self.set_int(rng.range_i32(min, max));
    }

    pub fn set_damage(&mut self, min: i32, max: i32) {
        self.damage = DamageRange::new(min, max);
    }

    /// Rolls a skill between two point values and stores it in tenths.
    pub fn set_skill(&mut self, skill: SkillName, min: f64, max: f64, rng: &mut dyn RngOracle) {
        let lo = (min * 10.0).round() as i32;
        let hi = (max * 10.0).round() as i32;
        let fixed = rng.range_i32(lo, hi).max(0) as u32;
        self.skills.set_fixed(skill, fixed);
    }

    /// Rolls fame inside the band for `level` (1-5).
    pub fn set_fame_level(&mut self, level: usize, rng: &mut dyn RngOracle) {
        if let Some((lo, hi)) = level.checked_sub(1).and_then(|i| FAME_LEVELS.get(i)) {
            self.fame = rng.range_i32(*lo, *hi);
        }
    }

    /// Rolls negative karma inside the band for `level` (1-5).
    pub fn set_karma_level(&mut self, level: usize, rng: &mut dyn RngOracle) {
        if let Some((lo, hi)) = level.checked_sub(1).and_then(|i| FAME_LEVELS.get(i)) {
            self.karma = -rng.range_i32(*lo, *hi);
        }
    }

    pub fn set_fame(&mut self, fame: i32) {
        self.fame = fame;
    }

    pub fn set_karma(&mut self, karma: i32) {
        self.karma = karma;
    }
}
