//! Repository contract for saving and loading creature records.

use creature_core::EntityId;

use crate::repository::Result;

/// Storage for serialized creatures, keyed by serial.
///
/// Records are written by [`Creature::serialize`](creature_core::Creature::serialize)
/// and are opaque to the repository.
pub trait CreatureRepository: Send + Sync {
    /// Save a record, replacing any previous one for `id`.
    fn save(&self, id: EntityId, record: &[u8]) -> Result<()>;

    /// Load a record by serial.
    fn load(&self, id: EntityId) -> Result<Option<Vec<u8>>>;

    /// Check if a record exists
    fn exists(&self, id: EntityId) -> bool;

    fn delete(&self, id: EntityId) -> Result<()>;

    /// All stored serials in ascending order.
    fn list_ids(&self) -> Result<Vec<EntityId>>;

    /// Delete every record, returning how many were removed.
    fn clear(&self) -> Result<usize> {
        let ids = self.list_ids()?;
        for id in &ids {
            self.delete(*id)?;
        }
        Ok(ids.len())
    }
}
