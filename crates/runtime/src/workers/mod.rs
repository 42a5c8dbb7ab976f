//! Worker tasks that back the runtime orchestration.
//!
//! The simulation worker owns the creature world and executes commands sent
//! through [`crate::RuntimeHandle`].

mod simulation;

pub use simulation::{Command, SimulationWorker};
