//! Skill table stored in tenths of a point.

use std::collections::BTreeMap;

/// Skills consulted by creature logic. Discriminants are persisted.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::EnumIter,
    strum::Display,
    strum::FromRepr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SkillName {
    Anatomy = 1,
    AnimalLore = 2,
    Parry = 5,
    Healing = 17,
    MagicResist = 26,
    Tactics = 27,
    Archery = 31,
    AnimalTaming = 35,
    Poisoning = 30,
    Magery = 25,
    EvalInt = 16,
    Meditation = 46,
    Swords = 40,
    Macing = 41,
    Fencing = 42,
    Wrestling = 43,
}

/// Fixed-point skill value (tenths) and its cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkillValue {
    pub base: u32,
    pub cap: u32,
}

impl SkillValue {
    pub const DEFAULT_CAP: u32 = 1000;

    /// Value in whole points.
    pub fn points(&self) -> f64 {
        f64::from(self.base) / 10.0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Skills {
    entries: BTreeMap<SkillName, SkillValue>,
}

impl Skills {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored value in tenths; untrained skills read as zero.
    pub fn fixed(&self, name: SkillName) -> u32 {
        self.entries.get(&name).map_or(0, |v| v.base)
    }

    pub fn points(&self, name: SkillName) -> f64 {
        f64::from(self.fixed(name)) / 10.0
    }

    /// Stores `fixed` tenths, raising the cap when the value exceeds it.
    pub fn set_fixed(&mut self, name: SkillName, fixed: u32) {
        let entry = self.entries.entry(name).or_insert(SkillValue {
            base: 0,
            cap: SkillValue::DEFAULT_CAP,
        });
        entry.base = fixed;
        if fixed > entry.cap {
            entry.cap = fixed;
        }
    }

    pub fn set_entry(&mut self, name: SkillName, value: SkillValue) {
        self.entries.insert(name, value);
    }

    pub fn get(&self, name: SkillName) -> Option<&SkillValue> {
        self.entries.get(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkillName, SkillValue)> + '_ {
        self.entries.iter().map(|(name, value)| (*name, *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_above_cap_raises_cap() {
        let mut skills = Skills::new();
        skills.set_fixed(SkillName::Tactics, 1200);
        let value = skills.get(SkillName::Tactics).copied().unwrap();
        assert_eq!(value.base, 1200);
        assert_eq!(value.cap, 1200);
        assert_eq!(skills.points(SkillName::Tactics), 120.0);
        assert_eq!(skills.fixed(SkillName::Magery), 0);
    }

    #[test]
    fn discriminants_round_trip() {
        assert_eq!(SkillName::from_repr(27), Some(SkillName::Tactics));
        assert_eq!(SkillName::from_repr(200), None);
    }
}
