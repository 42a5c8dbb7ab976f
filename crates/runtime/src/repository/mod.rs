//! Repository layer for creature save records.
//!
//! Repositories store the opaque bytes produced by the creature codec, one
//! record per serial. Static content (species, food, tuning) is loaded by
//! `creature-content`, not here.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileCreatureRepository;
pub use memory::InMemoryCreatureRepo;
pub use traits::CreatureRepository;
