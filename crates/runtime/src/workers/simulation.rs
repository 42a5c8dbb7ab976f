//! Simulation worker that owns the authoritative [`World`].
//!
//! Receives commands from [`RuntimeHandle`](crate::RuntimeHandle), applies
//! them to the world, and publishes the resulting events to the EventBus.

use std::sync::Arc;
use std::time::Duration;

use creature_core::{AiKind, Creature, EntityId, Env, Location, OrderType, SpeechOutcome};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::api::Result;
use crate::events::{Event, EventBus, WorldEvent};
use crate::repository::CreatureRepository;
use crate::world::{LoadSummary, TickReport, World};

/// Commands that can be sent to the simulation worker
pub enum Command {
    /// Move the clock forward and run everything that falls due.
    Advance {
        dt: Duration,
        reply: oneshot::Sender<TickReport>,
    },
    Spawn {
        species: String,
        location: Location,
        reply: oneshot::Sender<Result<EntityId>>,
    },
    Summon {
        species: String,
        caster: EntityId,
        obey: bool,
        duration: Duration,
        location: Location,
        reply: oneshot::Sender<Result<EntityId>>,
    },
    Tame {
        creature: EntityId,
        master: EntityId,
        reply: oneshot::Sender<Result<()>>,
    },
    Release {
        creature: EntityId,
        reply: oneshot::Sender<Result<()>>,
    },
    Speak {
        speaker: EntityId,
        text: String,
        reply: oneshot::Sender<Vec<(EntityId, SpeechOutcome)>>,
    },
    Order {
        creature: EntityId,
        order: OrderType,
        target: Option<EntityId>,
        from: EntityId,
        reply: oneshot::Sender<Result<bool>>,
    },
    Damage {
        target: EntityId,
        amount: i32,
        from: Option<EntityId>,
        reply: oneshot::Sender<Result<bool>>,
    },
    Feed {
        creature: EntityId,
        from: EntityId,
        item: String,
        amount: u32,
        reply: oneshot::Sender<Result<bool>>,
    },
    Provoke {
        creature: EntityId,
        target: EntityId,
        bard: EntityId,
        success: bool,
        reply: oneshot::Sender<Result<bool>>,
    },
    Pacify {
        creature: EntityId,
        bard: EntityId,
        duration: Duration,
        reply: oneshot::Sender<Result<()>>,
    },
    ChangeAi {
        creature: EntityId,
        kind: AiKind,
        reply: oneshot::Sender<Result<()>>,
    },
    Save {
        reply: oneshot::Sender<Result<usize>>,
    },
    Load {
        reply: oneshot::Sender<Result<LoadSummary>>,
    },
    /// Read-only copy of one creature.
    QueryCreature {
        id: EntityId,
        reply: oneshot::Sender<Option<Creature>>,
    },
    ListCreatures {
        reply: oneshot::Sender<Vec<EntityId>>,
    },
}

/// Background task that processes creature commands.
pub struct SimulationWorker<E: Env> {
    world: World<E>,
    repository: Arc<dyn CreatureRepository>,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
}

impl<E: Env + Send + 'static> SimulationWorker<E> {
    pub fn new(
        world: World<E>,
        repository: Arc<dyn CreatureRepository>,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
    ) -> Self {
        info!(
            target: "runtime::worker",
            creatures = world.len(),
            species = world.content().species.len(),
            "SimulationWorker initialized"
        );
        Self {
            world,
            repository,
            command_rx,
            event_bus,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd);
                }
                else => break,
            }
        }
        debug!(target: "runtime::worker", "Command channel closed, worker exiting");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Advance { dt, reply } => {
                let report = self.world.advance(dt);
                self.publish_tick(&report);
                respond(reply, report, "Advance");
            }
            Command::Spawn {
                species,
                location,
                reply,
            } => {
                let result = self.world.spawn(&species, location);
                if let Ok(creature) = result {
                    self.publish(Event::World(WorldEvent::CreatureSpawned { creature, species }));
                }
                self.flush_events();
                respond(reply, result, "Spawn");
            }
            Command::Summon {
                species,
                caster,
                obey,
                duration,
                location,
                reply,
            } => {
                let result = self.world.summon(&species, caster, obey, duration, location);
                if let Ok(creature) = result {
                    self.publish(Event::World(WorldEvent::CreatureSpawned { creature, species }));
                }
                self.flush_events();
                respond(reply, result, "Summon");
            }
            Command::Tame {
                creature,
                master,
                reply,
            } => {
                let result = self.world.tame(creature, master);
                self.flush_events();
                respond(reply, result, "Tame");
            }
            Command::Release { creature, reply } => {
                let result = self.world.release(creature);
                self.flush_events();
                respond(reply, result, "Release");
            }
            Command::Speak {
                speaker,
                text,
                reply,
            } => {
                let outcomes = self.world.speak(speaker, &text);
                self.flush_events();
                respond(reply, outcomes, "Speak");
            }
            Command::Order {
                creature,
                order,
                target,
                from,
                reply,
            } => {
                let result = self.world.command(creature, order, target, from);
                self.flush_events();
                respond(reply, result, "Order");
            }
            Command::Damage {
                target,
                amount,
                from,
                reply,
            } => {
                let result = self.world.damage(target, amount, from);
                self.flush_events();
                respond(reply, result, "Damage");
            }
            Command::Feed {
                creature,
                from,
                item,
                amount,
                reply,
            } => {
                let result = self.world.feed(creature, from, &item, amount);
                self.flush_events();
                respond(reply, result, "Feed");
            }
            Command::Provoke {
                creature,
                target,
                bard,
                success,
                reply,
            } => {
                let result = self.world.provoke(creature, target, bard, success);
                self.flush_events();
                respond(reply, result, "Provoke");
            }
            Command::Pacify {
                creature,
                bard,
                duration,
                reply,
            } => {
                let result = self.world.pacify(creature, bard, duration);
                self.flush_events();
                respond(reply, result, "Pacify");
            }
            Command::ChangeAi {
                creature,
                kind,
                reply,
            } => {
                let result = self.world.change_ai(creature, kind);
                self.flush_events();
                respond(reply, result, "ChangeAi");
            }
            Command::Save { reply } => {
                let result = self.world.save_to(self.repository.as_ref());
                match &result {
                    Ok(creatures) => {
                        self.publish(Event::World(WorldEvent::Saved { creatures: *creatures }))
                    }
                    Err(err) => error!(target: "runtime::worker", error = %err, "Save failed"),
                }
                respond(reply, result, "Save");
            }
            Command::Load { reply } => {
                let result = self.world.load_from(self.repository.as_ref());
                match &result {
                    Ok(summary) => self.publish(Event::World(WorldEvent::Loaded {
                        loaded: summary.loaded.len(),
                        failed: summary.failed.len(),
                    })),
                    Err(err) => error!(target: "runtime::worker", error = %err, "Load failed"),
                }
                self.flush_events();
                respond(reply, result, "Load");
            }
            Command::QueryCreature { id, reply } => {
                respond(reply, self.world.get(id).cloned(), "QueryCreature");
            }
            Command::ListCreatures { reply } => {
                let ids = self.world.creatures().map(Creature::id).collect();
                respond(reply, ids, "ListCreatures");
            }
        }
    }

    fn publish(&self, event: Event) {
        self.event_bus.publish(event);
    }

    fn flush_events(&mut self) {
        for event in self.world.take_events() {
            self.publish(Event::Creature(event));
        }
    }

    fn publish_tick(&self, report: &TickReport) {
        for event in &report.events {
            self.publish(Event::Creature(event.clone()));
        }
        for (creature, reason) in &report.removed {
            self.publish(Event::World(WorldEvent::CreatureRemoved {
                creature: *creature,
                reason: *reason,
            }));
        }
        self.publish(Event::World(WorldEvent::TickCompleted {
            now: report.now,
            thinks: report.thinks,
            tasks_fired: report.tasks_fired,
        }));
    }
}

fn respond<T>(reply: oneshot::Sender<T>, value: T, command: &'static str) {
    if reply.send(value).is_err() {
        debug!(target: "runtime::worker", command, "Reply channel closed (caller dropped)");
    }
}
