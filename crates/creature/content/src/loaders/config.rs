//! Engine tuning loader.

use std::path::Path;

use anyhow::Context;
use creature_core::EngineConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine tuning from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load tuning from a TOML file.
    ///
    /// Every table and key is optional; anything left out keeps its classic
    /// default.
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<EngineConfig> {
        toml::from_str(content).context("Failed to parse engine config TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse(
            r#"
            default_perception = 12

            [loyalty]
            decay_step = 5

            [looting]
            first_responder_bonus_percent = 10
            "#,
        )
        .unwrap();

        let defaults = EngineConfig::default();
        assert_eq!(config.default_perception, 12);
        assert_eq!(config.loyalty.decay_step, 5);
        assert_eq!(config.loyalty.decay_interval_ms, defaults.loyalty.decay_interval_ms);
        assert_eq!(config.looting.first_responder_bonus_percent, 10);
        assert_eq!(config.looting.tiers, defaults.looting.tiers);
        assert_eq!(config.combat, defaults.combat);
    }

    #[test]
    fn empty_config_is_the_default() {
        assert_eq!(ConfigLoader::parse("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = ConfigLoader::parse("[loyalty]\ndecay_step = \"ten\"").unwrap_err();
        assert!(format!("{err:#}").contains("engine config"));
    }
}
