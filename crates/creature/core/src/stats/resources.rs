//! Hit points, stamina and mana: seeds, ceilings and current values.

use crate::config::EngineConfig;

use super::StatKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
pub enum ResourceKind {
    Hits,
    Stam,
    Mana,
}

impl ResourceKind {
    /// Base stat the ceiling falls back to when no seed is set.
    pub const fn governing_stat(self) -> StatKind {
        match self {
            Self::Hits => StatKind::Str,
            Self::Stam => StatKind::Dex,
            Self::Mana => StatKind::Int,
        }
    }
}

/// Species seeds for resource ceilings; [`ResourceSeeds::UNSET`] means
/// "derive from the base stat".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceSeeds {
    pub hits: i32,
    pub stam: i32,
    pub mana: i32,
}

impl ResourceSeeds {
    pub const UNSET: i32 = -1;

    pub fn get(&self, kind: ResourceKind) -> i32 {
        match kind {
            ResourceKind::Hits => self.hits,
            ResourceKind::Stam => self.stam,
            ResourceKind::Mana => self.mana,
        }
    }

    pub fn set(&mut self, kind: ResourceKind, value: i32) {
        match kind {
            ResourceKind::Hits => self.hits = value,
            ResourceKind::Stam => self.stam = value,
            ResourceKind::Mana => self.mana = value,
        }
    }
}

impl Default for ResourceSeeds {
    fn default() -> Self {
        Self {
            hits: Self::UNSET,
            stam: Self::UNSET,
            mana: Self::UNSET,
        }
    }
}

/// Current resource values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Resources {
    pub hits: i32,
    pub stam: i32,
    pub mana: i32,
}

impl Resources {
    pub fn get(&self, kind: ResourceKind) -> i32 {
        match kind {
            ResourceKind::Hits => self.hits,
            ResourceKind::Stam => self.stam,
            ResourceKind::Mana => self.mana,
        }
    }

    pub fn set(&mut self, kind: ResourceKind, value: i32) {
        match kind {
            ResourceKind::Hits => self.hits = value,
            ResourceKind::Stam => self.stam = value,
            ResourceKind::Mana => self.mana = value,
        }
    }
}

/// Melee damage band.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageRange {
    pub min: i32,
    pub max: i32,
}

impl DamageRange {
    pub const UNSET: Self = Self { min: -1, max: -1 };

    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }
}

/// Ceiling of a resource.
///
/// A positive seed is shifted by the stat offset and clamped to
/// `[1, STAT_CAP]`; otherwise the effective base stat is used directly.
pub fn effective_cap(seed: i32, stat_offset: i32, base_stat: i32) -> i32 {
    if seed > 0 {
        seed.saturating_add(stat_offset).clamp(1, EngineConfig::STAT_CAP)
    } else {
        base_stat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_caps_are_clamped() {
        assert_eq!(effective_cap(500, 20, 90), 520);
        assert_eq!(effective_cap(5, -50, 90), 1);
        assert_eq!(effective_cap(64_990, 100, 90), EngineConfig::STAT_CAP);
    }

    #[test]
    fn extreme_seeds_saturate_before_clamping() {
        assert_eq!(effective_cap(i32::MAX, 500, 90), EngineConfig::STAT_CAP);
        assert_eq!(effective_cap(1, i32::MIN, 90), 1);
    }

    #[test]
    fn unseeded_caps_use_base_stat() {
        assert_eq!(effective_cap(ResourceSeeds::UNSET, 20, 90), 90);
        assert_eq!(effective_cap(0, 20, 90), 90);
    }
}
