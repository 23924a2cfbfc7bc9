//! Hypha configuration module.
//!
//! Provides configuration file support via `hypha.toml`, environment
//! variables, and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (builder methods)
//! 2. Environment variables (`HYPHA_*`)
//! 3. Configuration file (`hypha.toml`)
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration sources.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid combination of configuration values.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

/// Static type enforced for node and edge user ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdType {
    /// 64-bit signed integer ids (narrower integers are widened).
    #[default]
    Integer,
    /// String ids.
    String,
}

/// How attribute values relate to time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRepresentation {
    /// Dynamic values are maps from a timestamp to a value.
    #[default]
    Timestamp,
    /// Dynamic values are maps from an interval to a value.
    Interval,
}

/// Kind of the edge weight column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightKind {
    /// A single static double per edge.
    #[default]
    Static,
    /// A time-indexed weight following [`GraphConfig::time_representation`].
    Dynamic,
}

/// Graph store configuration.
///
/// A plain value struct passed at construction; there is no process-wide
/// state. All fields have serde defaults so partial TOML files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Static type enforced for node user ids.
    pub node_id_type: IdType,
    /// Static type enforced for edge user ids.
    pub edge_id_type: IdType,
    /// Whether the edge table owns a weight column at all.
    pub edge_weight_column: bool,
    /// Static or time-indexed weight column.
    pub edge_weight_kind: WeightKind,
    /// Representation used by every dynamic column.
    pub time_representation: TimeRepresentation,
    /// Auto-acquire lock tickets on every operation.
    ///
    /// When disabled the per-operation surface still synchronizes (Rust
    /// offers no safe unsynchronized shared mutation); use the batch
    /// guards to amortize acquisition instead.
    pub auto_locking: bool,
    /// Maintain version counters and per-observer diffs.
    pub enable_observers: bool,
    /// Maintain the reverse time index (time point -> elements).
    pub enable_index_time: bool,
    /// Default auto-include behavior for newly created views.
    pub view_auto_include: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            node_id_type: IdType::Integer,
            edge_id_type: IdType::Integer,
            edge_weight_column: true,
            edge_weight_kind: WeightKind::Static,
            time_representation: TimeRepresentation::Timestamp,
            auto_locking: true,
            enable_observers: true,
            enable_index_time: true,
            view_auto_include: false,
        }
    }
}

impl GraphConfig {
    /// Loads configuration from defaults, an optional `hypha.toml`, and
    /// `HYPHA_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a source fails to parse or the merged result is
    /// inconsistent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("HYPHA_"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] on inconsistent combinations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.edge_weight_kind == WeightKind::Dynamic && !self.edge_weight_column {
            return Err(ConfigError::InvalidValue {
                key: "edge_weight_kind".to_string(),
                message: "dynamic weight requires edge_weight_column = true".to_string(),
            });
        }
        Ok(())
    }
}
