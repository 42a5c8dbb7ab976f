//! Target acquisition and combat policy.
//!
//! - [`ranking`]: fight modes, target scoring and acquisition
//! - [`aggression`]: reactions to attacks and damage, reacquire throttle, fleeing
//! - [`looting`]: the damage log and looting-rights attribution
//! - [`rewards`]: loot generation and fame/karma on death
mod aggression;
mod looting;
mod ranking;
mod rewards;

pub use aggression::DamageSource;
pub use looting::{DamageEntry, DamageLog, DamageStore, get_looting_rights};
pub use ranking::{FightMode, UNRANKABLE, rank_candidate};
pub use rewards::Award;
