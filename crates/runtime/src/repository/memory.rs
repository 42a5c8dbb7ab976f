//! In-memory CreatureRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use creature_core::EntityId;

use crate::repository::{CreatureRepository, RepositoryError, Result};

/// In-memory implementation of CreatureRepository.
#[derive(Default)]
pub struct InMemoryCreatureRepo {
    records: RwLock<HashMap<EntityId, Vec<u8>>>,
}

impl InMemoryCreatureRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CreatureRepository for InMemoryCreatureRepo {
    fn save(&self, id: EntityId, record: &[u8]) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        records.insert(id, record.to_vec());
        Ok(())
    }

    fn load(&self, id: EntityId) -> Result<Option<Vec<u8>>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(records.get(&id).cloned())
    }

    fn exists(&self, id: EntityId) -> bool {
        self.records
            .read()
            .map(|records| records.contains_key(&id))
            .unwrap_or(false)
    }

    fn delete(&self, id: EntityId) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        records.remove(&id);
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<EntityId>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut ids: Vec<EntityId> = records.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
