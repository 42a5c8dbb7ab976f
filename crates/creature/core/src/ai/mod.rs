//! AI strategies.
//!
//! Each species declares an [`AiKind`]. An [`AiRegistry`] turns the kind
//! into a boxed [`Behavior`], and [`LiveCreature`] pairs a creature with the
//! behaviour currently driving it. Swapping behaviour at runtime tears the
//! old one down before the new one is set up.
//!
//! ```text
//! LiveCreature::tick
//!   ├── Creature::on_think      (rummage, breath, heal, homing, aura)
//!   └── Behavior::think
//!         ├── bard expiry, flee check
//!         ├── control orders    (pets and obedient summons)
//!         ├── acquire_target    (throttled)
//!         └── fight | wander
//! ```
mod base;
mod kinds;
mod speech;

pub use kinds::{AnimalAi, ArcherAi, BerserkAi, HealerAi, MageAi, MeleeAi, VendorAi};
pub use speech::{ParsedOrder, Speech, SpeechOutcome, parse_order};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::context::CreatureContext;
use crate::creature::Creature;
use crate::spell::{SpellKey, SpellRegistry};
use crate::state::{EntityId, Point3D};
use crate::think::ThinkReport;

/// AI style declared by a species. Discriminants are persisted.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::FromRepr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AiKind {
    UseDefault = 0,
    Melee = 1,
    Animal = 2,
    Archer = 3,
    Healer = 4,
    Vendor = 5,
    Mage = 6,
    Berserk = 7,
    /// Runs as [`AiKind::Melee`].
    Predator = 8,
    /// Retired; old saves are clamped to the species default on load.
    Thief = 9,
}

impl AiKind {
    pub const fn is_deprecated(self) -> bool {
        matches!(self, Self::Thief)
    }

    /// Kind actually instantiated, given the species default.
    pub fn resolve(self, default: AiKind) -> AiKind {
        match self {
            Self::UseDefault | Self::Thief => match default {
                Self::UseDefault | Self::Thief | Self::Predator => Self::Melee,
                other => other,
            },
            Self::Predator => Self::Melee,
            other => other,
        }
    }
}

/// What a behaviour did on one think.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Idle,
    /// Standing still after an idle roll.
    Resting,
    Moved { to: Point3D },
    Swung { target: EntityId, damage: i32 },
    Cast { spell: SpellKey, target: Option<EntityId> },
    Fled { from: EntityId },
    Tending { patient: EntityId },
}

/// A pluggable decision strategy.
///
/// Only [`Behavior::kind`] is required. The defaults implement plain melee:
/// obey orders, acquire the best target, swing at it or close in, and wander
/// when there is nothing to do.
pub trait Behavior: Send + fmt::Debug {
    fn kind(&self) -> AiKind;

    /// Runs once when the behaviour takes over a creature.
    fn setup(&mut self, creature: &mut Creature, _ctx: &mut CreatureContext<'_>) {
        creature.refresh_speed();
    }

    /// Runs once before the behaviour is replaced.
    fn teardown(&mut self, _creature: &mut Creature, _ctx: &mut CreatureContext<'_>) {}

    fn think(&mut self, creature: &mut Creature, ctx: &mut CreatureContext<'_>) -> Decision {
        base::think(self, creature, ctx)
    }

    /// Acts against a live combatant.
    fn fight(
        &mut self,
        creature: &mut Creature,
        target: EntityId,
        ctx: &mut CreatureContext<'_>,
    ) -> Decision {
        base::melee(creature, target, ctx)
    }

    /// Nothing to fight and no standing order.
    fn wander(&mut self, creature: &mut Creature, ctx: &mut CreatureContext<'_>) -> Decision {
        base::wander(creature, ctx)
    }

    fn handle_speech(
        &mut self,
        creature: &mut Creature,
        speech: &Speech<'_>,
        ctx: &mut CreatureContext<'_>,
    ) -> SpeechOutcome {
        speech::handle_orders(creature, speech, ctx)
    }

    fn on_aggressive_action(
        &mut self,
        creature: &mut Creature,
        aggressor: EntityId,
        ctx: &mut CreatureContext<'_>,
    ) {
        creature.on_aggressive_action(aggressor, ctx);
    }
}

pub type BehaviorFactory = Arc<dyn Fn() -> Box<dyn Behavior> + Send + Sync>;

/// Maps AI kinds to behaviour factories.
#[derive(Clone, Default)]
pub struct AiRegistry {
    factories: BTreeMap<AiKind, BehaviorFactory>,
}

impl fmt::Debug for AiRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

impl AiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in behaviour; mages resolve spells against `spells`.
    pub fn standard(spells: Arc<SpellRegistry>) -> Self {
        let mut registry = Self::new();
        registry.register(AiKind::Melee, || Box::new(MeleeAi));
        registry.register(AiKind::Animal, || Box::new(AnimalAi));
        registry.register(AiKind::Archer, || Box::new(ArcherAi));
        registry.register(AiKind::Healer, || Box::new(HealerAi::default()));
        registry.register(AiKind::Vendor, || Box::new(VendorAi));
        registry.register(AiKind::Berserk, || Box::new(BerserkAi));
        registry.register(AiKind::Mage, move || Box::new(MageAi::new(Arc::clone(&spells))));
        registry
    }

    /// Replaces any factory already registered for `kind`.
    pub fn register(
        &mut self,
        kind: AiKind,
        factory: impl Fn() -> Box<dyn Behavior> + Send + Sync + 'static,
    ) {
        self.factories.insert(kind, Arc::new(factory));
    }

    pub fn contains(&self, kind: AiKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Builds the behaviour for `kind`; unregistered kinds get melee.
    pub fn create(&self, kind: AiKind, default: AiKind) -> Box<dyn Behavior> {
        match self.factories.get(&kind.resolve(default)) {
            Some(factory) => factory(),
            None => Box::new(MeleeAi),
        }
    }
}

/// A creature in the world together with its active behaviour.
#[derive(Debug)]
pub struct LiveCreature {
    pub creature: Creature,
    brain: Box<dyn Behavior>,
}

impl LiveCreature {
    pub fn new(mut creature: Creature, registry: &AiRegistry, ctx: &mut CreatureContext<'_>) -> Self {
        let mut brain = registry.create(creature.current_ai, creature.default_ai);
        brain.setup(&mut creature, ctx);
        Self { creature, brain }
    }

    pub fn id(&self) -> EntityId {
        self.creature.id()
    }

    /// Kind of the behaviour actually running.
    pub fn brain_kind(&self) -> AiKind {
        self.brain.kind()
    }

    /// One AI tick: timed sub-behaviours first, then the decision step.
    pub fn tick(&mut self, ctx: &mut CreatureContext<'_>) -> (ThinkReport, Decision) {
        let report = self.creature.on_think(ctx);
        let decision = self.brain.think(&mut self.creature, ctx);
        (report, decision)
    }

    pub fn handle_speech(&mut self, speech: &Speech<'_>, ctx: &mut CreatureContext<'_>) -> SpeechOutcome {
        self.brain.handle_speech(&mut self.creature, speech, ctx)
    }

    pub fn on_aggressive_action(&mut self, aggressor: EntityId, ctx: &mut CreatureContext<'_>) {
        self.brain.on_aggressive_action(&mut self.creature, aggressor, ctx);
    }

    /// Hot-swaps the behaviour.
    pub fn change_ai(&mut self, kind: AiKind, registry: &AiRegistry, ctx: &mut CreatureContext<'_>) {
        self.brain.teardown(&mut self.creature, ctx);
        self.creature.current_ai = kind;
        self.brain = registry.create(kind, self.creature.default_ai);
        self.brain.setup(&mut self.creature, ctx);
    }

    pub fn into_creature(self) -> Creature {
        self.creature
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::creature::testing::*;
    use crate::env::{SandboxEnv, SandboxMobile};
    use crate::state::{Location, MapId};

    fn registry() -> AiRegistry {
        AiRegistry::standard(Arc::new(SpellRegistry::with_magery()))
    }

    #[test]
    fn aliases_resolve_to_real_behaviours() {
        assert_eq!(AiKind::Predator.resolve(AiKind::Animal), AiKind::Melee);
        assert_eq!(AiKind::UseDefault.resolve(AiKind::Animal), AiKind::Animal);
        assert_eq!(AiKind::Thief.resolve(AiKind::Mage), AiKind::Mage);
        assert_eq!(AiKind::Thief.resolve(AiKind::Thief), AiKind::Melee);
        assert_eq!(AiKind::from_repr(6), Some(AiKind::Mage));
        assert!(AiKind::Thief.is_deprecated());
    }

    #[test]
    fn registry_builds_declared_kind() {
        let registry = registry();
        for kind in [AiKind::Melee, AiKind::Animal, AiKind::Mage, AiKind::Vendor] {
            assert_eq!(registry.create(kind, AiKind::Melee).kind(), kind);
        }
        assert_eq!(AiRegistry::new().create(AiKind::Mage, AiKind::Melee).kind(), AiKind::Melee);
    }

    #[derive(Debug)]
    struct Recorder(Arc<Mutex<Vec<&'static str>>>);

    impl Behavior for Recorder {
        fn kind(&self) -> AiKind {
            AiKind::Berserk
        }

        fn setup(&mut self, _creature: &mut Creature, _ctx: &mut CreatureContext<'_>) {
            self.0.lock().unwrap().push("setup");
        }

        fn teardown(&mut self, _creature: &mut Creature, _ctx: &mut CreatureContext<'_>) {
            self.0.lock().unwrap().push("teardown");
        }
    }

    #[test]
    fn change_ai_tears_down_then_sets_up() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = registry();
        let log = Arc::clone(&calls);
        registry.register(AiKind::Berserk, move || Box::new(Recorder(Arc::clone(&log))));

        let mut h = Harness::new(SandboxEnv::new());
        let mut live = LiveCreature::new(creature(), &registry, &mut h.ctx());
        assert_eq!(live.brain_kind(), AiKind::Animal);

        live.change_ai(AiKind::Berserk, &registry, &mut h.ctx());
        live.change_ai(AiKind::Mage, &registry, &mut h.ctx());
        assert_eq!(live.brain_kind(), AiKind::Mage);
        assert_eq!(live.creature.current_ai(), AiKind::Mage);
        assert_eq!(*calls.lock().unwrap(), vec!["setup", "teardown"]);
    }

    #[test]
    fn tick_runs_think_then_decides() {
        let mut env = SandboxEnv::new();
        env.insert(SandboxMobile::player(
            OTHER,
            Location::new(MapId::TRAMMEL, Point3D::new(101, 100, 0)),
        ));
        let mut h = Harness::new(env);
        let mut live = LiveCreature::new(creature(), &registry(), &mut h.ctx());

        let (report, decision) = live.tick(&mut h.ctx());
        assert_eq!(report.homing, crate::think::HomingOutcome::NotApplicable);
        assert_eq!(decision, Decision::Swung { target: OTHER, damage: 1 });
        assert_eq!(h.env.log.damage, vec![(OTHER, 1, PET)]);
    }
}
