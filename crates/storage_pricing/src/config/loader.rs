//! Loading engine settings from TOML or JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::settings::{SimulationSettings, TreeValuationSettings};

/// Combined engine configuration.
///
/// Missing sections and fields take their defaults.
///
/// ```toml
/// [tree]
/// num_inventory_grid_points = 500
/// time_step = 0.0027397260273972603
///
/// [simulation]
/// num_sims = 4
/// seed = 12
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tree and intrinsic valuation settings
    pub tree: TreeValuationSettings,
    /// Spot simulation settings
    pub simulation: SimulationSettings,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            format: "toml",
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse {
                format: "json",
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Validate both sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tree.validate()?;
        self.simulation.validate()
    }
}
