//! Spell registry keyed by stable string identifiers.
//!
//! Creatures persist the keys of their attack and defense spells. On load the
//! keys are resolved against a [`SpellRegistry`]; a key the registry no longer
//! knows is skipped instead of failing the whole record.

use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier such as `"magery.fireball"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SpellKey(pub String);

impl SpellKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpellRole {
    Attack,
    Defense,
}

/// Castable spell instance produced by a registry factory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spell {
    pub key: SpellKey,
    pub circle: u8,
    pub mana: i32,
    pub role: SpellRole,
}

pub type SpellFactory = fn() -> Spell;

#[derive(Clone, Debug, Default)]
pub struct SpellRegistry {
    factories: BTreeMap<String, SpellFactory>,
}

impl SpellRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: &str, factory: SpellFactory) {
        self.factories.insert(key.to_owned(), factory);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    pub fn create(&self, key: &SpellKey) -> Option<Spell> {
        self.factories.get(key.as_str()).map(|factory| factory())
    }

    /// Registry holding the classic magery spells creatures use.
    pub fn with_magery() -> Self {
        let mut registry = Self::new();
        registry.register("magery.magic_arrow", || spell("magery.magic_arrow", 1, 4, SpellRole::Attack));
        registry.register("magery.harm", || spell("magery.harm", 2, 6, SpellRole::Attack));
        registry.register("magery.fireball", || spell("magery.fireball", 3, 9, SpellRole::Attack));
        registry.register("magery.lightning", || spell("magery.lightning", 4, 11, SpellRole::Attack));
        registry.register("magery.energy_bolt", || spell("magery.energy_bolt", 6, 20, SpellRole::Attack));
        registry.register("magery.flamestrike", || spell("magery.flamestrike", 7, 40, SpellRole::Attack));
        registry.register("magery.heal", || spell("magery.heal", 1, 4, SpellRole::Defense));
        registry.register("magery.cure", || spell("magery.cure", 2, 6, SpellRole::Defense));
        registry.register("magery.greater_heal", || spell("magery.greater_heal", 4, 11, SpellRole::Defense));
        registry.register("magery.reflect", || spell("magery.reflect", 5, 14, SpellRole::Defense));
        registry
    }
}

fn spell(key: &str, circle: u8, mana: i32, role: SpellRole) -> Spell {
    Spell {
        key: SpellKey::new(key),
        circle,
        mana,
        role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_known_keys_only() {
        let registry = SpellRegistry::with_magery();
        let fireball = registry.create(&SpellKey::new("magery.fireball")).unwrap();
        assert_eq!(fireball.circle, 3);
        assert_eq!(fireball.role, SpellRole::Attack);
        assert!(registry.create(&SpellKey::new("Server.Spells.Third.FireballSpell")).is_none());
    }
}
