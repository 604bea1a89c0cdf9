use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::types::{DEFAULT_MAX_FLEET, DEFAULT_SCOUT_SKIP_CHANCE};

/// Starting conditions of an Overlord. Missing JSON fields fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlordConfig {
    /// Refined minerals available to buy the fleet.
    pub budget: u32,
    /// Seed of the exploration jitter.
    pub seed: u64,
    pub scout_skip_chance: f64,
    pub max_fleet: u32,
}

impl Default for OverlordConfig {
    fn default() -> Self {
        Self {
            budget: 60,
            seed: 42,
            scout_skip_chance: DEFAULT_SCOUT_SKIP_CHANCE,
            max_fleet: DEFAULT_MAX_FLEET,
        }
    }
}

impl OverlordConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Skip chance clamped to a usable probability.
    pub fn skip_chance(&self) -> f64 {
        if (0.0..=1.0).contains(&self.scout_skip_chance) {
            self.scout_skip_chance
        } else {
            warn!(
                value = self.scout_skip_chance,
                "scout skip chance out of range, using default"
            );
            DEFAULT_SCOUT_SKIP_CHANCE
        }
    }
}
