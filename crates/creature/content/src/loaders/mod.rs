//! Content loaders for reading creature data from files.
//!
//! Each loader turns one RON/TOML file into the matching `creature-core` type.

pub mod config;
pub mod factory;
pub mod food;
pub mod species;

pub use config::ConfigLoader;
pub use factory::{ContentBundle, ContentFactory};
pub use food::FoodLoader;
pub use species::SpeciesLoader;

use std::path::Path;

use anyhow::Context;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file {}", path.display()))
}
