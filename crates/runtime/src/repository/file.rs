//! File-based CreatureRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use creature_core::EntityId;

use crate::repository::{CreatureRepository, RepositoryError, Result};

/// Stores each creature as `creature_{serial}.bin` in one directory.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-save leaves the previous record intact.
pub struct FileCreatureRepository {
    base_dir: PathBuf,
}

impl FileCreatureRepository {
    /// Create the repository, making the directory if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, id: EntityId) -> PathBuf {
        self.base_dir.join(format!("creature_{}.bin", id.0))
    }
}

impl CreatureRepository for FileCreatureRepository {
    fn save(&self, id: EntityId, record: &[u8]) -> Result<()> {
        let path = self.record_path(id);
        let temp_path = path.with_extension("bin.tmp");

        fs::write(&temp_path, record).map_err(RepositoryError::Io)?;
        fs::rename(&temp_path, &path).map_err(RepositoryError::Io)?;

        tracing::debug!("Saved creature[{}] to {}", id, path.display());
        Ok(())
    }

    fn load(&self, id: EntityId) -> Result<Option<Vec<u8>>> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(RepositoryError::Io)?;
        if bytes.is_empty() {
            return Err(RepositoryError::CorruptedData(format!(
                "empty record {}",
                path.display()
            )));
        }
        Ok(Some(bytes))
    }

    fn exists(&self, id: EntityId) -> bool {
        self.record_path(id).exists()
    }

    fn delete(&self, id: EntityId) -> Result<()> {
        let path = self.record_path(id);
        if path.exists() {
            fs::remove_file(&path).map_err(RepositoryError::Io)?;
            tracing::debug!("Deleted creature[{}]", id);
        }
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<EntityId>> {
        let mut ids = Vec::new();
        let entries = fs::read_dir(&self.base_dir).map_err(RepositoryError::Io)?;

        for entry in entries {
            let path = entry.map_err(RepositoryError::Io)?.path();
            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(serial) = filename
                    .strip_prefix("creature_")
                    .and_then(|s| s.strip_suffix(".bin"))
                && let Ok(serial) = serial.parse::<u32>()
            {
                ids.push(EntityId(serial));
            }
        }

        ids.sort_unstable();
        Ok(ids)
    }
}
