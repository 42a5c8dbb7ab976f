//! Food-preference table loader.

use std::path::Path;

use anyhow::Context;
use creature_core::FoodTable;

use crate::loaders::{LoadResult, read_file};

/// Loader for the item → food-group table from RON files.
///
/// RON format: `(items: { "raw_ribs": "MEAT", "apple": "FRUITS_AND_VEGGIES" })`
pub struct FoodLoader;

impl FoodLoader {
    pub fn load(path: &Path) -> LoadResult<FoodTable> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<FoodTable> {
        ron::from_str(content).context("Failed to parse food table RON")
    }
}
