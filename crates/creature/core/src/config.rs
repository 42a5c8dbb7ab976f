use std::time::Duration;

use crate::state::MapId;

/// Engine-wide tuning constants and tunable parameters.
///
/// Loaded once at startup (see `creature-content`) and passed by reference
/// into every operation that needs it. `Default` reproduces the classic values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    pub combat: CombatConfig,
    pub loyalty: LoyaltyConfig,
    pub control: ControlChanceConfig,
    pub looting: LootTiers,
    pub rummage: RummageConfig,
    pub homing: HomingConfig,
    pub upkeep: UpkeepConfig,
    pub rewards: RewardConfig,
    /// Perception range for species that do not declare one.
    pub default_perception: i32,
}

impl EngineConfig {
    // ===== compile-time constants used as type parameters =====
    pub const MAX_LOYALTY: i32 = 100;
    pub const MAX_OWNERS: usize = 5;
    pub const MAX_FRIENDS: usize = 5;
    /// Upper bound of a seeded hit/stamina/mana maximum.
    pub const STAT_CAP: i32 = 65_000;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_PERCEPTION: i32 = 16;
    /// Perception value written by old saves before the default was raised.
    pub const LEGACY_PERCEPTION: i32 = 10;

    pub fn new() -> Self {
        Self {
            combat: CombatConfig::default(),
            loyalty: LoyaltyConfig::default(),
            control: ControlChanceConfig::default(),
            looting: LootTiers::default(),
            rummage: RummageConfig::default(),
            homing: HomingConfig::default(),
            upkeep: UpkeepConfig::default(),
            rewards: RewardConfig::default(),
            default_perception: Self::DEFAULT_PERCEPTION,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Target acquisition and aggression tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    pub reacquire_delay_ms: u64,
    /// How long a damage entry keeps counting toward looting rights.
    pub damage_entry_expiry_ms: u64,
    /// Chance that a following pet turns on whoever just hit it.
    pub distract_chance: f64,
    pub bard_effect_ms: u64,
    /// Fraction of maximum hits under which fleeing species run.
    pub flee_hits_ratio: f64,
    pub flee_duration_ms: u64,
    pub idle_chance: f64,
    pub idle_ms: (u64, u64),
    /// Time between melee swings.
    pub swing_delay_ms: u64,
}

impl CombatConfig {
    pub fn reacquire_delay(&self) -> Duration {
        Duration::from_millis(self.reacquire_delay_ms)
    }

    pub fn damage_entry_expiry(&self) -> Duration {
        Duration::from_millis(self.damage_entry_expiry_ms)
    }

    pub fn swing_delay(&self) -> Duration {
        Duration::from_millis(self.swing_delay_ms)
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            reacquire_delay_ms: 10_000,
            damage_entry_expiry_ms: 120_000,
            distract_chance: 0.10,
            bard_effect_ms: 30_000,
            flee_hits_ratio: 0.20,
            flee_duration_ms: 10_000,
            idle_chance: 0.05,
            idle_ms: (15_000, 25_000),
            swing_delay_ms: 2_500,
        }
    }
}

/// Loyalty gains, losses and the hourly decay sweep.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LoyaltyConfig {
    pub decay_interval_ms: u64,
    pub decay_step: i32,
    /// Below this a pet starts complaining.
    pub distress_threshold: i32,
    pub command_success_gain: i32,
    pub command_failure_loss: i32,
    pub feed_gain: i32,
    pub feed_chance: f64,
}

impl LoyaltyConfig {
    pub fn decay_interval(&self) -> Duration {
        Duration::from_millis(self.decay_interval_ms)
    }
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            decay_interval_ms: 3_600_000,
            decay_step: EngineConfig::MAX_LOYALTY / 10,
            distress_threshold: 10,
            command_success_gain: 1,
            command_failure_loss: 3,
            feed_gain: 10,
            feed_chance: 0.5,
        }
    }
}

/// Constants of the control-chance curve, in thousandths.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControlChanceConfig {
    /// Species whose minimum taming skill is at or below this always obey.
    pub certain_tame_floor: f64,
    pub base: i32,
    pub floor: i32,
    pub ceiling: i32,
    pub under_skilled_scale: i32,
    pub over_skilled_scale: i32,
    /// Chance lost per missing loyalty point.
    pub loyalty_penalty: i32,
}

impl Default for ControlChanceConfig {
    fn default() -> Self {
        Self {
            certain_tame_floor: 29.1,
            base: 700,
            floor: 200,
            ceiling: 990,
            under_skilled_scale: 14,
            over_skilled_scale: 6,
            loyalty_penalty: 10,
        }
    }
}

/// One step of the looting-rights qualification table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LootTier {
    pub min_hits_max: i32,
    /// Contributors need at least `top / divisor` damage.
    pub divisor: i32,
}

/// Qualification fractions keyed by the victim's maximum hits.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LootTiers {
    /// Checked in order; the first tier whose threshold is met wins.
    pub tiers: Vec<LootTier>,
    pub fallback_divisor: i32,
    pub first_responder_bonus_percent: i32,
}

impl LootTiers {
    pub fn divisor_for(&self, hits_max: i32) -> i32 {
        self.tiers
            .iter()
            .find(|tier| hits_max >= tier.min_hits_max)
            .map_or(self.fallback_divisor, |tier| tier.divisor)
            .max(1)
    }
}

impl Default for LootTiers {
    fn default() -> Self {
        Self {
            tiers: vec![
                LootTier { min_hits_max: 3000, divisor: 16 },
                LootTier { min_hits_max: 1000, divisor: 8 },
                LootTier { min_hits_max: 200, divisor: 4 },
            ],
            fallback_divisor: 2,
            first_responder_bonus_percent: 25,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RummageConfig {
    pub enabled: bool,
    pub chance: f64,
    pub range: i32,
    pub success_delay_ms: (u64, u64),
    pub retry_delay_ms: (u64, u64),
}

impl Default for RummageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chance: 0.5,
            range: 2,
            success_delay_ms: (60_000, 240_000),
            retry_delay_ms: (15_000, 45_000),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HomingConfig {
    pub step_chance: f64,
    /// Consecutive failed steps before the creature is put back home.
    pub max_failures: u32,
    pub sector_return_delay_ms: (u64, u64),
    /// Extra radius tolerated before a sleeping sector sends a creature home.
    pub sector_slack: i32,
    pub summon_home_range: i32,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            step_chance: 0.10,
            max_failures: 5,
            sector_return_delay_ms: (15_000, 59_000),
            sector_slack: 5,
            summon_home_range: 10,
        }
    }
}

/// Lifetime of unclaimed and untamed creatures.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UpkeepConfig {
    pub unclaimed_delete_ms: u64,
    pub untamed_removal_steps: u32,
}

impl UpkeepConfig {
    pub fn unclaimed_delete(&self) -> Duration {
        Duration::from_millis(self.unclaimed_delete_ms)
    }
}

impl Default for UpkeepConfig {
    fn default() -> Self {
        Self {
            unclaimed_delete_ms: 3 * 24 * 3_600_000,
            untamed_removal_steps: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RewardConfig {
    /// Maps where kills pay out extra fame and karma.
    pub bonus_maps: Vec<MapId>,
    pub bonus_percent: i32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            bonus_maps: vec![MapId::FELUCCA],
            bonus_percent: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loot_divisor_follows_hit_tiers() {
        let tiers = LootTiers::default();
        assert_eq!(tiers.divisor_for(5000), 16);
        assert_eq!(tiers.divisor_for(3000), 16);
        assert_eq!(tiers.divisor_for(2999), 8);
        assert_eq!(tiers.divisor_for(1000), 8);
        assert_eq!(tiers.divisor_for(200), 4);
        assert_eq!(tiers.divisor_for(199), 2);
    }

    #[test]
    fn decay_step_is_a_tenth_of_max() {
        assert_eq!(LoyaltyConfig::default().decay_step, 10);
    }
}
