//! Runtime orchestration for the creature simulation.
//!
//! This crate hosts the world that schedules creature thinks and timers on
//! top of `creature-core`, persists creatures through repositories, and runs
//! everything on a background worker behind an async API. Consumers embed
//! [`Runtime`] to drive ticks, subscribe to events, and interact with the
//! world through [`RuntimeHandle`]. Tools that want no async can use
//! [`World`] directly.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`world`] owns creatures, the task queue and the clock
//! - [`repository`] stores creature save records
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod repository;
pub mod rng;
pub mod runtime;
pub mod world;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use events::{Event, EventBus, Topic, WorldEvent};
pub use repository::{
    CreatureRepository, FileCreatureRepository, InMemoryCreatureRepo, RepositoryError,
};
pub use rng::StdRngOracle;
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use world::{LoadSummary, TickReport, World, WorldContent};
