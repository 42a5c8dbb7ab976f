//! High-level runtime orchestrator.
//!
//! The runtime owns the simulation worker, wires up command/event channels,
//! and exposes a builder-based API for clients to drive the creature world.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use creature_content::ContentBundle;
use creature_core::Env;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::events::EventBus;
use crate::repository::{CreatureRepository, InMemoryCreatureRepo};
use crate::rng::StdRngOracle;
use crate::world::{TickReport, World, WorldContent};
use crate::workers::{Command, SimulationWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Game time covered by one [`Runtime::step`].
    pub tick: Duration,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Fixed seed for reproducible runs; `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
    /// First serial handed to a spawned creature.
    pub first_creature_id: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(250),
            event_buffer_size: 256,
            command_buffer_size: 32,
            rng_seed: None,
            first_creature_id: 0x1000,
        }
    }
}

/// Main runtime that drives the creature world
///
/// Design: Runtime owns the worker and paces the clock.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    config: RuntimeConfig,
    sim_worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Advance the world by one tick of game time
    pub async fn step(&self) -> Result<TickReport> {
        self.handle.advance(self.config.tick).await
    }

    /// Run `ticks` steps back to back, as fast as the worker allows
    pub async fn run_for(&self, ticks: u64) -> Result<Vec<TickReport>> {
        let mut reports = Vec::new();
        for _ in 0..ticks {
            reports.push(self.step().await?);
        }
        Ok(reports)
    }

    /// Step in real time, one tick per tick interval, until `shutdown` resolves
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let mut interval = tokio::time::interval(self.config.tick);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => return Ok(()),
                _ = interval.tick() => {
                    self.step().await?;
                }
            }
        }
    }

    /// Shutdown the runtime gracefully
    ///
    /// Other clones of the handle keep the worker alive until they drop.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.sim_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    content: Option<WorldContent>,
    repository: Option<Arc<dyn CreatureRepository>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            content: None,
            repository: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set required startup content
    pub fn content(mut self, bundle: ContentBundle) -> Self {
        self.content = Some(WorldContent::from_bundle(bundle));
        self
    }

    /// Use content that is already wrapped, e.g. with extra behaviours registered
    pub fn world_content(mut self, content: WorldContent) -> Self {
        self.content = Some(content);
        self
    }

    /// Where saves go; defaults to an in-memory repository
    pub fn repository(mut self, repository: Arc<dyn CreatureRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Build the runtime around the framework `env` and start the worker
    pub fn build<E: Env + Send + 'static>(self, env: E) -> Result<Runtime> {
        let content = self.content.ok_or(RuntimeError::MissingContent)?;
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemoryCreatureRepo::new()));

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let handle = RuntimeHandle::new(command_tx, event_bus.clone());

        let rng = Box::new(StdRngOracle::new(self.config.rng_seed));
        let world = World::new(env, content, rng, self.config.first_creature_id);
        let sim_worker = SimulationWorker::new(world, repository, command_rx, event_bus);

        let sim_worker_handle = tokio::spawn(async move {
            sim_worker.run().await;
        });

        Ok(Runtime {
            handle,
            config: self.config,
            sim_worker_handle,
        })
    }
}
