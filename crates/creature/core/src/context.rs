use crate::config::EngineConfig;
use crate::env::{Env, RngOracle};
use crate::events::CreatureEvent;
use crate::schedule::TaskQueue;
use crate::state::GameTime;

/// Everything a creature operation may read or mutate besides the creature.
///
/// Built fresh by the scheduler for each think, task or framework hook.
pub struct CreatureContext<'a> {
    pub now: GameTime,
    pub env: &'a mut dyn Env,
    pub rng: &'a mut dyn RngOracle,
    pub tasks: &'a mut TaskQueue,
    pub config: &'a EngineConfig,
    pub events: &'a mut Vec<CreatureEvent>,
}

impl<'a> CreatureContext<'a> {
    pub fn new(
        now: GameTime,
        env: &'a mut dyn Env,
        rng: &'a mut dyn RngOracle,
        tasks: &'a mut TaskQueue,
        config: &'a EngineConfig,
        events: &'a mut Vec<CreatureEvent>,
    ) -> Self {
        Self {
            now,
            env,
            rng,
            tasks,
            config,
            events,
        }
    }

    pub fn emit(&mut self, event: CreatureEvent) {
        self.events.push(event);
    }
}
