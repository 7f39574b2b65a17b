use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::algorithm::Algorithm;
use crate::battery::BatteryConfig;

/// Top-level planner config, parsed from TOML.
///
/// ```toml
/// [battery]
/// initial_energy = 12.0
/// capacity = 24.0
/// maximum_power = 6.0
/// interval_width = 4
///
/// [search]
/// algorithm = "oneCycle"
/// parallel = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub battery: BatteryConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl PlannerConfig {
    /// Load config from a TOML file path.
    pub fn from_toml(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse config from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load and merge multiple TOML files (later files override earlier).
    pub fn from_toml_files(paths: &[&Path]) -> Result<Self, ConfigError> {
        let (first, rest) = paths
            .split_first()
            .ok_or_else(|| ConfigError::Parse("no config files provided".into()))?;

        let mut base = read_value(first)?;
        for path in rest {
            merge_toml(&mut base, read_value(path)?);
        }

        let merged = toml::to_string(&base).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_toml_str(&merged)
    }
}

fn read_value(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
}

fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    if let (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) = (base, overlay) {
        for (key, value) in overlay_table {
            if let Some(base_value) = base_table.get_mut(&key) {
                if base_value.is_table() && value.is_table() {
                    merge_toml(base_value, value);
                    continue;
                }
            }
            base_table.insert(key, value);
        }
    }
}

/// How the planner searches.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_algorithm")]
    pub algorithm: Algorithm,
    /// Spread the window searches over the rayon thread pool.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            parallel: false,
        }
    }
}

fn default_algorithm() -> Algorithm { Algorithm::Interval }

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(String),
}
