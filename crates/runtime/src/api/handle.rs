//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! driving the world or streaming events from specific topics.
use std::time::Duration;

use creature_core::{AiKind, Creature, EntityId, Location, OrderType, SpeechOutcome};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;
use crate::world::{LoadSummary, TickReport};

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    /// Sends a command built around a fresh reply channel and awaits the answer.
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Advance game time by `dt`.
    pub async fn advance(&self, dt: Duration) -> Result<TickReport> {
        self.request(|reply| Command::Advance { dt, reply }).await
    }

    pub async fn spawn(&self, species: impl Into<String>, location: Location) -> Result<EntityId> {
        let species = species.into();
        self.request(|reply| Command::Spawn {
            species,
            location,
            reply,
        })
        .await?
    }

    pub async fn summon(
        &self,
        species: impl Into<String>,
        caster: EntityId,
        obey: bool,
        duration: Duration,
        location: Location,
    ) -> Result<EntityId> {
        let species = species.into();
        self.request(|reply| Command::Summon {
            species,
            caster,
            obey,
            duration,
            location,
            reply,
        })
        .await?
    }

    pub async fn tame(&self, creature: EntityId, master: EntityId) -> Result<()> {
        self.request(|reply| Command::Tame {
            creature,
            master,
            reply,
        })
        .await?
    }

    pub async fn release(&self, creature: EntityId) -> Result<()> {
        self.request(|reply| Command::Release { creature, reply }).await?
    }

    /// Say something near the world's creatures; returns those that reacted.
    pub async fn speak(&self, speaker: EntityId, text: impl Into<String>) -> Result<Vec<(EntityId, SpeechOutcome)>> {
        let text = text.into();
        self.request(|reply| Command::Speak {
            speaker,
            text,
            reply,
        })
        .await
    }

    /// Give an order with an explicit target.
    pub async fn order(
        &self,
        creature: EntityId,
        order: OrderType,
        target: Option<EntityId>,
        from: EntityId,
    ) -> Result<bool> {
        self.request(|reply| Command::Order {
            creature,
            order,
            target,
            from,
            reply,
        })
        .await?
    }

    /// Returns whether the creature died.
    pub async fn damage(&self, target: EntityId, amount: i32, from: Option<EntityId>) -> Result<bool> {
        self.request(|reply| Command::Damage {
            target,
            amount,
            from,
            reply,
        })
        .await?
    }

    pub async fn feed(
        &self,
        creature: EntityId,
        from: EntityId,
        item: impl Into<String>,
        amount: u32,
    ) -> Result<bool> {
        let item = item.into();
        self.request(|reply| Command::Feed {
            creature,
            from,
            item,
            amount,
            reply,
        })
        .await?
    }

    pub async fn provoke(
        &self,
        creature: EntityId,
        target: EntityId,
        bard: EntityId,
        success: bool,
    ) -> Result<bool> {
        self.request(|reply| Command::Provoke {
            creature,
            target,
            bard,
            success,
            reply,
        })
        .await?
    }

    pub async fn pacify(&self, creature: EntityId, bard: EntityId, duration: Duration) -> Result<()> {
        self.request(|reply| Command::Pacify {
            creature,
            bard,
            duration,
            reply,
        })
        .await?
    }

    pub async fn change_ai(&self, creature: EntityId, kind: AiKind) -> Result<()> {
        self.request(|reply| Command::ChangeAi {
            creature,
            kind,
            reply,
        })
        .await?
    }

    /// Write every creature to the configured repository.
    pub async fn save(&self) -> Result<usize> {
        self.request(|reply| Command::Save { reply }).await?
    }

    /// Read every record from the configured repository into the world.
    pub async fn load(&self) -> Result<LoadSummary> {
        self.request(|reply| Command::Load { reply }).await?
    }

    /// Query one creature (read-only copy)
    pub async fn query_creature(&self, id: EntityId) -> Result<Option<Creature>> {
        self.request(|reply| Command::QueryCreature { id, reply }).await
    }

    pub async fn list_creatures(&self) -> Result<Vec<EntityId>> {
        self.request(|reply| Command::ListCreatures { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Creature` - taming, combat, loyalty and lifecycle outcomes
    /// - `Topic::World` - ticks, spawns, removals, saves and loads
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
