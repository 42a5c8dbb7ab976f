//! The creature world: every live creature, the task queue and the clock.
//!
//! [`World`] is synchronous and single-owner. Each creature is mutated alone:
//! it is taken out of the map for its turn, sees everyone else through a
//! [`WorldView`], and effects it has on other creatures are settled after it
//! is put back.
//!
//! ```text
//! World::advance(dt)
//!   loop until the clock reaches now + dt
//!     ├── fire due tasks          (breath, heal, unsummon, deletion, return home)
//!     ├── think due creatures     (skip sleeping sectors)
//!     ├── hourly loyalty upkeep
//!     └── reap removal requests
//! ```
mod view;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use creature_content::{ContentBundle, SpeciesCatalog};
use creature_core::{
    AiKind, AiRegistry, Creature, CreatureContext, CreatureEvent, DamageSource, Decision,
    EngineConfig, EntityId, Env, FoodTable, GameTime, LiveCreature, LoadContext, Location,
    OrderType, PersistError, PostLoadFixup, ProvokeTarget, RemovalReason, ResourceKind,
    RngOracle, SaveReader, SaveWriter, Speech, SpeechOutcome, SpellRegistry, SpeciesOracle,
    TaskQueue, UpkeepOutcome,
};
use tracing::{debug, error, info, trace, warn};

use crate::api::{Result, RuntimeError};
use crate::repository::CreatureRepository;

pub(crate) use view::{CreatureView, Pending, WorldView};

/// Shortest gap between two thinks of one creature.
const MIN_THINK_INTERVAL: Duration = Duration::from_millis(50);

/// Settling passes before pending effects are dropped.
const MAX_SETTLE_PASSES: usize = 8;

/// Shared, read-only content a world is built from.
#[derive(Clone, Debug)]
pub struct WorldContent {
    pub config: Arc<EngineConfig>,
    pub species: Arc<SpeciesCatalog>,
    pub spells: Arc<SpellRegistry>,
    pub food: Arc<FoodTable>,
    pub ai: Arc<AiRegistry>,
}

impl WorldContent {
    /// Wraps loaded content with the built-in spells and behaviours.
    pub fn from_bundle(bundle: ContentBundle) -> Self {
        let spells = Arc::new(SpellRegistry::with_magery());
        let ai = Arc::new(AiRegistry::standard(Arc::clone(&spells)));
        Self {
            config: Arc::new(bundle.config),
            species: Arc::new(bundle.species),
            spells,
            food: Arc::new(bundle.food),
            ai,
        }
    }
}

/// What one [`World::advance`] call did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub now: GameTime,
    pub thinks: usize,
    pub tasks_fired: usize,
    pub removed: Vec<(EntityId, RemovalReason)>,
    pub events: Vec<CreatureEvent>,
}

/// Outcome of [`World::load_from`].
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub loaded: Vec<EntityId>,
    /// Records that could not be read; the creature stays out of the world.
    pub failed: Vec<(EntityId, PersistError)>,
    pub skipped_spells: Vec<(EntityId, String)>,
}

pub struct World<E: Env> {
    env: E,
    content: WorldContent,
    creatures: BTreeMap<EntityId, LiveCreature>,
    views: BTreeMap<EntityId, CreatureView>,
    next_think: BTreeMap<EntityId, GameTime>,
    /// Creatures whose sector was asleep on their last turn.
    asleep: BTreeSet<EntityId>,
    pending: Vec<Pending>,
    tasks: TaskQueue,
    events: Vec<CreatureEvent>,
    rng: Box<dyn RngOracle>,
    now: GameTime,
    next_upkeep: GameTime,
    next_id: u32,
}

impl<E: Env> World<E> {
    /// Creature serials start at `first_id`; keep them clear of the env's mobiles.
    pub fn new(env: E, content: WorldContent, rng: Box<dyn RngOracle>, first_id: u32) -> Self {
        let next_upkeep = GameTime::ZERO + upkeep_interval(&content.config);
        Self {
            env,
            content,
            creatures: BTreeMap::new(),
            views: BTreeMap::new(),
            next_think: BTreeMap::new(),
            asleep: BTreeSet::new(),
            pending: Vec::new(),
            tasks: TaskQueue::new(),
            events: Vec::new(),
            rng,
            now: GameTime::ZERO,
            next_upkeep,
            next_id: first_id,
        }
    }

    pub fn now(&self) -> GameTime {
        self.now
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn content(&self) -> &WorldContent {
        &self.content
    }

    pub fn get(&self, id: EntityId) -> Option<&Creature> {
        self.creatures.get(&id).map(|live| &live.creature)
    }

    pub fn brain_kind(&self, id: EntityId) -> Option<AiKind> {
        self.creatures.get(&id).map(LiveCreature::brain_kind)
    }

    pub fn creatures(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values().map(|live| &live.creature)
    }

    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    // ===== context plumbing =====

    fn in_context<R>(&mut self, f: impl FnOnce(&mut CreatureContext<'_>, &AiRegistry) -> R) -> R {
        let mut view = WorldView::new(&mut self.env, &self.views, &mut self.pending);
        let mut ctx = CreatureContext::new(
            self.now,
            &mut view,
            &mut *self.rng,
            &mut self.tasks,
            &self.content.config,
            &mut self.events,
        );
        f(&mut ctx, &self.content.ai)
    }

    /// Runs `f` on one creature without settling its effects on others.
    fn with_live<R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut LiveCreature, &mut CreatureContext<'_>, &AiRegistry) -> R,
    ) -> Option<R> {
        let mut live = self.creatures.remove(&id)?;
        let out = self.in_context(|ctx, ai| f(&mut live, ctx, ai));
        self.views.insert(id, CreatureView::of(&live.creature));
        self.creatures.insert(id, live);
        Some(out)
    }

    fn with_creature<R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut LiveCreature, &mut CreatureContext<'_>, &AiRegistry) -> R,
    ) -> Result<R> {
        let out = self
            .with_live(id, f)
            .ok_or(RuntimeError::UnknownCreature { id })?;
        self.settle();
        Ok(out)
    }

    fn insert(&mut self, live: LiveCreature) {
        let id = live.id();
        self.views.insert(id, CreatureView::of(&live.creature));
        self.next_think.insert(id, self.now);
        self.creatures.insert(id, live);
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Applies queued effects on creatures until none are left.
    fn settle(&mut self) {
        for _ in 0..MAX_SETTLE_PASSES {
            if self.pending.is_empty() {
                return;
            }
            for pending in std::mem::take(&mut self.pending) {
                self.apply_pending(pending);
            }
        }
        if !self.pending.is_empty() {
            warn!(
                target: "runtime::world",
                dropped = self.pending.len(),
                "Settling hit max passes limit"
            );
            self.pending.clear();
        }
    }

    fn apply_pending(&mut self, pending: Pending) {
        let applied = match pending {
            Pending::Damage {
                target,
                amount,
                source,
                responsible,
            } => self.with_live(target, |live, ctx, _| {
                if source != target {
                    live.on_aggressive_action(source, ctx);
                }
                let from = DamageSource {
                    damager: source,
                    responsible,
                };
                live.creature.take_damage(amount, Some(from), ctx);
            }),
            Pending::Heal { target, amount } => self.with_live(target, |live, _, _| {
                let creature = &mut live.creature;
                if creature.is_alive() {
                    let hits = creature.hits().saturating_add(amount).min(creature.hits_max());
                    creature.set_resource(ResourceKind::Hits, hits);
                }
            }),
            Pending::Cure { target } => self.with_live(target, |live, _, _| live.creature.set_poison(None)),
        };
        if applied.is_none() {
            debug!(target: "runtime::world", ?pending, "Effect target left the world");
        }
    }

    // ===== clock =====

    /// Moves the clock forward by `dt`, running everything that falls due.
    pub fn advance(&mut self, dt: Duration) -> TickReport {
        let until = self.now + dt;
        let mut report = TickReport::default();

        while let Some(at) = self.next_wakeup().filter(|at| *at <= until) {
            self.now = self.now.max(at);
            self.fire_due_tasks(&mut report);
            self.run_due_thinks(&mut report);
            if self.now >= self.next_upkeep {
                self.upkeep_sweep();
                self.next_upkeep = self.now + upkeep_interval(&self.content.config);
            }
            self.reap(&mut report);
        }

        self.now = until;
        report.now = until;
        report.events = self.drain_events();
        report
    }

    fn next_wakeup(&self) -> Option<GameTime> {
        let think = self.next_think.values().min().copied();
        [think, self.tasks.next_due(), Some(self.next_upkeep)]
            .into_iter()
            .flatten()
            .min()
    }

    fn fire_due_tasks(&mut self, report: &mut TickReport) {
        while let Some(task) = self.tasks.pop_due(self.now) {
            debug!(
                target: "runtime::world",
                owner = %task.owner,
                task = ?task.task,
                due = %task.due,
                "Firing task"
            );
            let fired = self.with_live(task.owner, |live, ctx, _| {
                ctx.now = task.due;
                live.creature.fire_task(task.id, task.task, ctx);
            });
            if fired.is_some() {
                report.tasks_fired += 1;
                self.settle();
            }
        }
    }

    fn run_due_thinks(&mut self, report: &mut TickReport) {
        let due: Vec<EntityId> = self
            .next_think
            .iter()
            .filter(|(_, at)| **at <= self.now)
            .map(|(id, _)| *id)
            .collect();

        for id in due {
            let Some(live) = self.creatures.get(&id) else {
                self.next_think.remove(&id);
                continue;
            };
            let creature = &live.creature;
            if !creature.is_alive() || creature.is_deleted() || creature.removal_requested().is_some() {
                self.next_think.remove(&id);
                continue;
            }
            let location = creature.location();
            let interval = creature.think_interval();

            if !self.env.sector_active(&location) {
                if self.asleep.insert(id) {
                    self.with_live(id, |live, ctx, _| live.creature.on_sector_deactivate(ctx));
                }
                self.schedule_think(id, interval);
                continue;
            }
            self.asleep.remove(&id);

            let Some((decision, interval)) = self.with_live(id, |live, ctx, _| {
                let (_, decision) = live.tick(ctx);
                (decision, live.creature.think_interval())
            }) else {
                continue;
            };
            report.thinks += 1;
            trace!(target: "runtime::world", creature = %id, ?decision, "Think");
            self.settle();
            self.schedule_think(id, interval);

            if let Decision::Moved { .. } = decision {
                self.broadcast_movement(id);
            }
        }
    }

    fn schedule_think(&mut self, id: EntityId, interval_secs: f64) {
        let interval = Duration::try_from_secs_f64(interval_secs)
            .unwrap_or(MIN_THINK_INTERVAL)
            .max(MIN_THINK_INTERVAL);
        self.next_think.insert(id, self.now + interval);
    }

    fn broadcast_movement(&mut self, mover: EntityId) {
        let Some(at) = self.views.get(&mover).map(|view| view.info.location) else {
            return;
        };
        for live in self.creatures.values_mut() {
            let creature = &mut live.creature;
            if creature.id() != mover && creature.location().in_range(&at, creature.range_perception()) {
                creature.on_nearby_movement(mover);
            }
        }
    }

    fn upkeep_sweep(&mut self) {
        let ids: Vec<EntityId> = self.creatures.keys().copied().collect();
        for id in ids {
            let outcome = self.with_live(id, |live, ctx, _| live.creature.loyalty_upkeep(ctx));
            match outcome {
                Some(UpkeepOutcome::Unchanged) | None => {}
                Some(outcome) => debug!(target: "runtime::world", creature = %id, ?outcome, "Upkeep"),
            }
        }
        self.settle();
    }

    fn reap(&mut self, report: &mut TickReport) {
        let doomed: Vec<(EntityId, RemovalReason)> = self
            .creatures
            .values()
            .filter_map(|live| live.creature.removal_requested().map(|reason| (live.id(), reason)))
            .collect();
        for (id, reason) in doomed {
            self.with_live(id, |live, ctx, _| live.creature.on_delete(ctx));
            self.forget(id);
            info!(target: "runtime::world", creature = %id, ?reason, "Creature removed");
            report.removed.push((id, reason));
        }
    }

    fn forget(&mut self, id: EntityId) -> Option<LiveCreature> {
        self.views.remove(&id);
        self.next_think.remove(&id);
        self.asleep.remove(&id);
        self.creatures.remove(&id)
    }

    fn drain_events(&mut self) -> Vec<CreatureEvent> {
        let events = std::mem::take(&mut self.events);
        for event in &events {
            match event {
                CreatureEvent::Tamed { .. }
                | CreatureEvent::Released { .. }
                | CreatureEvent::Abandoned { .. }
                | CreatureEvent::Summoned { .. }
                | CreatureEvent::RemovalRequested { .. } => {
                    info!(target: "runtime::world", ?event, "Creature event");
                }
                _ => debug!(target: "runtime::world", ?event, "Creature event"),
            }
        }
        events
    }

    /// Events produced by direct operations since the last tick.
    pub fn take_events(&mut self) -> Vec<CreatureEvent> {
        self.drain_events()
    }

    // ===== lifecycle =====

    /// Spawns a wild creature of `species` at `location`.
    pub fn spawn(&mut self, species: &str, location: Location) -> Result<EntityId> {
        let template = self
            .content
            .species
            .template(species)
            .ok_or_else(|| RuntimeError::UnknownSpecies { key: species.to_owned() })?;
        let id = self.allocate_id();
        let creature = Creature::spawn(
            id,
            species,
            template,
            location,
            self.now,
            &self.content.config,
            &mut *self.rng,
        );
        let live = self.in_context(|ctx, ai| LiveCreature::new(creature, ai, ctx));
        self.insert(live);
        debug!(target: "runtime::world", creature = %id, species, ?location, "Spawned");
        Ok(id)
    }

    /// Spawns `species` as a summon of `caster`.
    ///
    /// Nothing stays in the world when the caster cannot take the summon.
    pub fn summon(
        &mut self,
        species: &str,
        caster: EntityId,
        obey: bool,
        duration: Duration,
        location: Location,
    ) -> Result<EntityId> {
        let id = self.spawn(species, location)?;
        let summoned = self.with_creature(id, |live, ctx, _| {
            live.creature.summon(caster, obey, duration, location, ctx)
        })?;
        if let Err(err) = summoned {
            self.in_context(|ctx, _| ctx.tasks.cancel_owned_by(id));
            self.forget(id);
            return Err(err.into());
        }
        Ok(id)
    }

    pub fn tame(&mut self, id: EntityId, master: EntityId) -> Result<()> {
        self.with_creature(id, |live, ctx, _| live.creature.set_control_master(Some(master), ctx))??;
        Ok(())
    }

    pub fn release(&mut self, id: EntityId) -> Result<()> {
        self.with_creature(id, |live, ctx, _| live.creature.release(ctx))
    }

    pub fn set_stabled(&mut self, id: EntityId, stabled: bool) -> Result<()> {
        self.with_creature(id, |live, ctx, _| live.creature.set_stabled(stabled, ctx))
    }

    /// Deletes a creature as the framework would, without a removal reason.
    pub fn delete(&mut self, id: EntityId) -> Result<()> {
        self.with_creature(id, |live, ctx, _| live.creature.on_delete(ctx))?;
        self.forget(id);
        Ok(())
    }

    // ===== orders and interaction =====

    /// Delivers a line of speech to every creature; each decides if it heard.
    pub fn speak(&mut self, speaker: EntityId, text: &str) -> Vec<(EntityId, SpeechOutcome)> {
        let ids: Vec<EntityId> = self.creatures.keys().copied().collect();
        let speech = Speech { speaker, text };
        let mut outcomes = Vec::new();
        for id in ids {
            if id == speaker {
                continue;
            }
            let outcome = self.with_live(id, |live, ctx, _| live.handle_speech(&speech, ctx));
            if let Some(outcome) = outcome.filter(|o| *o != SpeechOutcome::Ignored) {
                outcomes.push((id, outcome));
            }
        }
        self.settle();
        outcomes
    }

    /// Completes an order that needed a target.
    pub fn command(
        &mut self,
        id: EntityId,
        order: OrderType,
        target: Option<EntityId>,
        from: EntityId,
    ) -> Result<bool> {
        self.with_creature(id, |live, ctx, _| live.creature.command(order, target, from, ctx))
    }

    /// Deals damage to a creature. Returns true if it died.
    pub fn damage(&mut self, target: EntityId, amount: i32, from: Option<EntityId>) -> Result<bool> {
        let source = from.map(|damager| DamageSource {
            damager,
            responsible: self
                .views
                .get(&damager)
                .and_then(|view| view.responsible_for(target)),
        });
        self.with_creature(target, |live, ctx, _| {
            if let Some(source) = source {
                live.on_aggressive_action(source.damager, ctx);
            }
            live.creature.take_damage(amount, source, ctx)
        })
    }

    pub fn aggressive_action(&mut self, target: EntityId, aggressor: EntityId) -> Result<()> {
        self.with_creature(target, |live, ctx, _| live.on_aggressive_action(aggressor, ctx))
    }

    /// Offers `amount` of `item`; the food table decides what it is.
    pub fn feed(&mut self, id: EntityId, from: EntityId, item: &str, amount: u32) -> Result<bool> {
        let food = self.content.food.classify(item);
        self.with_creature(id, |live, ctx, _| live.creature.feed(from, food, amount, ctx))
    }

    /// Turns `id` on `target` for the bard `master`.
    pub fn provoke(
        &mut self,
        id: EntityId,
        target: EntityId,
        master: EntityId,
        success: bool,
    ) -> Result<bool> {
        let mut live = self
            .creatures
            .remove(&id)
            .ok_or(RuntimeError::UnknownCreature { id })?;
        let mut other = if target == id { None } else { self.creatures.remove(&target) };

        let provoked = self.in_context(|ctx, _| {
            let target = match other.as_mut() {
                Some(other) => ProvokeTarget::Creature(&mut other.creature),
                None => ProvokeTarget::Mobile(target),
            };
            creature_core::control::provoke(&mut live.creature, target, master, success, ctx)
        });

        if let Some(other) = other {
            self.views.insert(other.id(), CreatureView::of(&other.creature));
            self.creatures.insert(other.id(), other);
        }
        self.views.insert(id, CreatureView::of(&live.creature));
        self.creatures.insert(id, live);
        self.settle();
        Ok(provoked)
    }

    pub fn pacify(&mut self, id: EntityId, master: EntityId, duration: Duration) -> Result<()> {
        let until = self.now + duration;
        self.with_creature(id, |live, ctx, _| live.creature.pacify(master, until, ctx))
    }

    /// Hot-swaps the behaviour driving a creature.
    pub fn change_ai(&mut self, id: EntityId, kind: AiKind) -> Result<()> {
        self.with_creature(id, |live, ctx, ai| live.change_ai(kind, ai, ctx))
    }

    // ===== persistence =====

    /// Writes every creature and drops records of creatures no longer here.
    pub fn save_to(&self, repo: &dyn CreatureRepository) -> Result<usize> {
        for (id, live) in &self.creatures {
            let mut writer = SaveWriter::new(self.now);
            live.creature.serialize(&mut writer);
            repo.save(*id, &writer.into_bytes())?;
        }
        for stale in repo.list_ids()? {
            if !self.creatures.contains_key(&stale) {
                repo.delete(stale)?;
            }
        }
        info!(target: "runtime::world", creatures = self.creatures.len(), now = %self.now, "World saved");
        Ok(self.creatures.len())
    }

    /// Reads every record in `repo` into the world.
    ///
    /// All records are decoded before any is placed, so follower slots and
    /// timers see the whole population. Records for serials already live are
    /// left alone.
    pub fn load_from(&mut self, repo: &dyn CreatureRepository) -> Result<LoadSummary> {
        let mut summary = LoadSummary::default();
        let load = LoadContext {
            species: self.content.species.as_ref(),
            spells: &self.content.spells,
            config: &self.content.config,
        };

        let mut decoded = Vec::new();
        for id in repo.list_ids()? {
            if self.creatures.contains_key(&id) {
                warn!(target: "runtime::world", creature = %id, "Record shadows a live creature, skipping");
                continue;
            }
            let Some(bytes) = repo.load(id)? else {
                continue;
            };
            let mut reader = SaveReader::new(&bytes, self.now);
            match Creature::deserialize(&mut reader, load) {
                Ok(loaded) => decoded.push(loaded),
                Err(err) => {
                    error!(target: "runtime::world", creature = %id, error = %err, "Failed to load creature");
                    summary.failed.push((id, err));
                }
            }
        }

        for loaded in decoded {
            let id = loaded.creature.id();
            for spell in &loaded.skipped_spells {
                warn!(target: "runtime::world", creature = %id, spell, "Dropped unknown spell");
                summary.skipped_spells.push((id, spell.clone()));
            }
            for fixup in &loaded.fixups {
                if let PostLoadFixup::RestoreFollowers { master } = fixup
                    && self.env.followers(*master).is_none()
                {
                    warn!(target: "runtime::world", creature = %id, master = %master, "Master unknown to the follower ledger");
                }
            }
            let live = self.in_context(|ctx, ai| loaded.finish(ai, ctx));
            self.next_id = self.next_id.max(id.0.saturating_add(1));
            self.insert(live);
            summary.loaded.push(id);
        }
        self.settle();

        info!(
            target: "runtime::world",
            loaded = summary.loaded.len(),
            failed = summary.failed.len(),
            "World loaded"
        );
        Ok(summary)
    }
}

fn upkeep_interval(config: &EngineConfig) -> Duration {
    config.loyalty.decay_interval().max(Duration::from_secs(1))
}
