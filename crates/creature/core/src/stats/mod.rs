//! Stat and resource model.
//!
//! A creature's hit/stamina/mana ceilings are layered: a species "seed" sets
//! the ceiling directly, transient modifiers shift it, and without a seed the
//! ceiling falls back to the governing base stat.
//!
//! ```text
//! base stats ──► modifiers ──► effective stat
//!                    │
//! seeds ─────────────┴───────► effective cap ──► current resource (≤ cap)
//! ```
mod core;
mod modifiers;
mod resources;
mod skills;

pub use core::{CoreStats, StatKind};
pub use modifiers::{StatModifier, StatModifiers};
pub use resources::{DamageRange, ResourceKind, ResourceSeeds, Resources, effective_cap};
pub use skills::{SkillName, SkillValue, Skills};
