//! Collision world configuration
//!
//! Tuning knobs for the broad phase plus the process-wide-style defaults
//! that queries resolve against. Configs are plain serde structs loadable
//! from TOML or RON.

use serde::{Deserialize, Serialize};

/// Tuning parameters for a [`CollisionWorld`](crate::CollisionWorld)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Edge length of one spatial-hash cell
    pub cell_size: f32,

    /// Collider count at which the broad phase switches from the direct
    /// pairwise sweep to the spatial hash
    pub broad_phase_threshold: usize,

    /// Maximum cells a single collider's AABB may span per axis before it
    /// is excluded from the hash and brute-force tested instead
    pub max_cells_per_axis: u32,

    /// Default trigger policy for queries using
    /// [`TriggerInteraction::UseGlobal`](crate::TriggerInteraction::UseGlobal)
    pub queries_hit_triggers: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            cell_size: 4.0,
            broad_phase_threshold: 32,
            max_cells_per_axis: 64,
            queries_hit_triggers: true,
        }
    }
}

impl Config for CollisionConfig {}

/// Configuration trait: serde-backed load/save in TOML or RON
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file, picking the format by extension
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file, picking the format by extension
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported file format
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}
