//! Data-driven content definitions and loaders.
//!
//! This crate houses the content the creature engine interprets and provides
//! loaders for RON/TOML data files:
//! - Species templates (data-driven via RON)
//! - Food-preference tables (data-driven via RON)
//! - Engine tuning (data-driven via TOML)
//!
//! Content is read once at startup, shared read-only, and never persisted with
//! a creature. Save records refer to species by key only.

pub mod catalog;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use catalog::SpeciesCatalog;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentBundle, ContentFactory, FoodLoader, SpeciesLoader};
