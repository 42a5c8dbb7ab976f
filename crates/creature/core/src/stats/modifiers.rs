//! Named, optionally expiring stat offsets (curses, buffs, potions).

use crate::state::GameTime;

use super::StatKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatModifier {
    pub name: String,
    pub kind: StatKind,
    pub offset: i32,
    pub expires_at: Option<GameTime>,
}

impl StatModifier {
    pub fn new(name: impl Into<String>, kind: StatKind, offset: i32) -> Self {
        Self {
            name: name.into(),
            kind,
            offset,
            expires_at: None,
        }
    }

    #[must_use]
    pub fn until(mut self, expires_at: GameTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    fn expired(&self, now: GameTime) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Modifiers keyed by name; adding a modifier with an existing name replaces it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatModifiers {
    entries: Vec<StatModifier>,
}

impl StatModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, modifier: StatModifier) {
        self.remove(&modifier.name);
        self.entries.push(modifier);
    }

    pub fn remove(&mut self, name: &str) -> Option<StatModifier> {
        let index = self.entries.iter().position(|m| m.name == name)?;
        Some(self.entries.remove(index))
    }

    /// Sum of every modifier currently applied to `kind`.
    pub fn offset(&self, kind: StatKind) -> i32 {
        self.entries
            .iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.offset)
            .sum()
    }

    /// Drops expired modifiers, returning how many were removed.
    pub fn prune(&mut self, now: GameTime) -> usize {
        let before = self.entries.len();
        self.entries.retain(|m| !m.expired(now));
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatModifier> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
