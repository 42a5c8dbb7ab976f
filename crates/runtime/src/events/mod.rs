//! Topic-based event bus for runtime events.
//!
//! Creature outcomes and world bookkeeping are published on separate topics
//! so consumers can subscribe only to what they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::WorldEvent;
