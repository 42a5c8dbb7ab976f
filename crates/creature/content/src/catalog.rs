//! In-memory species catalog.

use std::collections::BTreeMap;
use std::sync::Arc;

use creature_core::{SpeciesOracle, SpeciesTemplate};

/// Species templates keyed by their stable species key (`"wolf"`, `"dragon"`).
///
/// Built once at startup and shared read-only; templates sit behind `Arc` so
/// live creatures can hold on to theirs without copying.
#[derive(Clone, Debug, Default)]
pub struct SpeciesCatalog {
    entries: BTreeMap<String, Arc<SpeciesTemplate>>,
}

impl SpeciesCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a template; returns the one it displaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        template: SpeciesTemplate,
    ) -> Option<Arc<SpeciesTemplate>> {
        self.entries.insert(key.into(), Arc::new(template))
    }

    pub fn get(&self, key: &str) -> Option<&Arc<SpeciesTemplate>> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<SpeciesTemplate>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Species whose templates can be tamed.
    pub fn tamable(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, t)| t.tamable).map(|(k, _)| k)
    }
}

impl SpeciesOracle for SpeciesCatalog {
    fn template(&self, key: &str) -> Option<Arc<SpeciesTemplate>> {
        self.entries.get(key).cloned()
    }
}

impl FromIterator<(String, SpeciesTemplate)> for SpeciesCatalog {
    fn from_iter<I: IntoIterator<Item = (String, SpeciesTemplate)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (key, template) in iter {
            catalog.insert(key, template);
        }
        catalog
    }
}
