//! Generation configuration with documented constants
//!
//! The roll thresholds used by group generation are collected here so a
//! campaign can tune how cohesive generated groups are.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{OrbatError, Result};

/// Configuration for a generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Seed for the shared random source
    pub seed: u64,

    /// 2d6 target before rating adjustment
    ///
    /// The effective target is `base_target - rating_level`, so better
    /// rated forces match their anchor unit more often.
    pub base_target: i32,

    /// 2d6 target used when the force has no rating
    pub unrated_target: i32,

    /// Number of quality levels assumed when adjusting availability by rating
    ///
    /// Fixed at 5 rather than taken from the faction's own rating scale. A
    /// faction rated A-B on its own two-level scale should still behave like
    /// A-B out of A-F.
    pub total_rating_levels: i32,

    /// Target reduction for aerospace and conventional fighter groups
    pub fighter_modifier: i32,

    /// Target reduction for artillery groups without a missile artillery anchor
    pub artillery_modifier: i32,

    /// Extra leeway for vehicles adopting the anchor's movement mode
    pub movement_mode_modifier: i32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            base_target: 12,
            unrated_target: 10,
            total_rating_levels: 5,
            fighter_modifier: 3,
            artillery_modifier: 4,
            movement_mode_modifier: 6,
        }
    }
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if !(2..=12).contains(&self.base_target) {
            return Err(OrbatError::InvalidConfig(format!(
                "base_target ({}) must be a possible 2d6 result",
                self.base_target
            )));
        }
        if !(2..=12).contains(&self.unrated_target) {
            return Err(OrbatError::InvalidConfig(format!(
                "unrated_target ({}) must be a possible 2d6 result",
                self.unrated_target
            )));
        }
        if self.total_rating_levels < 1 {
            return Err(OrbatError::InvalidConfig(
                "total_rating_levels must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Parse a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GenerationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GenerationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.total_rating_levels, 5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GenerationConfig::from_toml_str("seed = 42\nfighter_modifier = 2\n").unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.fighter_modifier, 2);
        assert_eq!(config.base_target, 12);
    }

    #[test]
    fn test_invalid_target_rejected() {
        let result = GenerationConfig::from_toml_str("base_target = 20\n");
        assert!(matches!(result, Err(OrbatError::InvalidConfig(_))));
    }
}
