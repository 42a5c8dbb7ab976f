//! Content factory for loading everything from a data directory.

use std::path::{Path, PathBuf};

use creature_core::{EngineConfig, FoodTable};

use crate::catalog::SpeciesCatalog;
use crate::loaders::{ConfigLoader, FoodLoader, LoadResult, SpeciesLoader};

/// All startup content, loaded together.
#[derive(Clone, Debug, Default)]
pub struct ContentBundle {
    pub config: EngineConfig,
    pub species: SpeciesCatalog,
    pub food: FoodTable,
}

/// Content factory that loads all creature content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── species.ron
/// └── food.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The `data/` directory shipped with this crate.
    pub fn bundled() -> Self {
        Self::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data"))
    }

    /// Load engine tuning from `config.toml`; a missing file means defaults.
    pub fn load_config(&self) -> LoadResult<EngineConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            return Ok(EngineConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load species templates from `species.ron`.
    pub fn load_species(&self) -> LoadResult<SpeciesCatalog> {
        let path = self.data_dir.join("species.ron");
        SpeciesLoader::load(&path)
    }

    /// Load the food table from `food.ron`.
    pub fn load_food(&self) -> LoadResult<FoodTable> {
        let path = self.data_dir.join("food.ron");
        FoodLoader::load(&path)
    }

    pub fn load_all(&self) -> LoadResult<ContentBundle> {
        Ok(ContentBundle {
            config: self.load_config()?,
            species: self.load_species()?,
            food: self.load_food()?,
        })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
