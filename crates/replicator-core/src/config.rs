//! Configuration loading and typed config structures for the Replicator
//! simulation.
//!
//! The canonical configuration lives in `replicator-config.yaml`. This
//! module defines strongly-typed structs that mirror the YAML structure and
//! a loader that reads and validates the file. Every field has a default,
//! so an empty document is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use replicator_agents::EconomyConfig;
use replicator_world::DistanceScale;
use serde::Deserialize;

/// Environment variable that overrides `persistence.snapshot_path`.
pub const SNAPSHOT_PATH_ENV: &str = "REPLICATOR_SNAPSHOT_PATH";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is unusable.
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `replicator-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Tick bounds and pacing.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Costs, rates, and starting inventories.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Spatial settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Per-probe pipeline limits and deadlines.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Snapshot storage.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `REPLICATOR_SNAPSHOT_PATH`, when set, overrides
    /// `persistence.snapshot_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.persistence.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot drive a simulation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, message: &str| ConfigError::Invalid {
            field,
            message: message.to_owned(),
        };

        if self.pipeline.max_actions == 0 {
            return Err(invalid("pipeline.max_actions", "must be at least 1"));
        }
        if self.pipeline.decision_timeout_ms == 0 {
            return Err(invalid("pipeline.decision_timeout_ms", "must be positive"));
        }
        if self.pipeline.pipeline_timeout_ms == 0 {
            return Err(invalid("pipeline.pipeline_timeout_ms", "must be positive"));
        }
        if self.persistence.persist_timeout_ms == 0 {
            return Err(invalid("persistence.persist_timeout_ms", "must be positive"));
        }
        if self.economy.max_harvest_duration == 0 {
            return Err(invalid("economy.max_harvest_duration", "must be at least 1"));
        }
        if !self.economy.energy_per_distance.is_finite() || self.economy.energy_per_distance < 0.0
        {
            return Err(invalid(
                "economy.energy_per_distance",
                "must be a non-negative number",
            ));
        }
        if !self.economy.harvest_proximity.is_finite() || self.economy.harvest_proximity < 0.0 {
            return Err(invalid(
                "economy.harvest_proximity",
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Tick bounds and pacing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Ticks to run per start (0 = until extinction).
    #[serde(default)]
    pub max_ticks: u64,

    /// Real-time milliseconds slept between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: 0,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Spatial settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Raw distance units per AU, applied to every distance check and cost.
    #[serde(default)]
    pub units_per_au: DistanceScale,
}

/// Per-probe pipeline limits and deadlines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineConfig {
    /// Most actions a probe may take in one tick.
    #[serde(default = "default_max_actions")]
    pub max_actions: usize,

    /// Deadline for one decision provider call.
    #[serde(default = "default_decision_timeout_ms")]
    pub decision_timeout_ms: u64,

    /// Deadline for one whole pipeline, decision included.
    #[serde(default = "default_pipeline_timeout_ms")]
    pub pipeline_timeout_ms: u64,

    /// Recent experiences handed to the decision provider.
    #[serde(default = "default_recent_experience_window")]
    pub recent_experience_window: usize,

    /// Recent failures handed to the decision provider.
    #[serde(default = "default_failure_context_window")]
    pub failure_context_window: usize,

    /// Nearby bodies listed in the environment snapshot.
    #[serde(default = "default_nearby_body_limit")]
    pub nearby_body_limit: usize,
}

impl PipelineConfig {
    /// Decision deadline as a [`Duration`].
    pub const fn decision_timeout(&self) -> Duration {
        Duration::from_millis(self.decision_timeout_ms)
    }

    /// Pipeline deadline as a [`Duration`].
    pub const fn pipeline_timeout(&self) -> Duration {
        Duration::from_millis(self.pipeline_timeout_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_actions: default_max_actions(),
            decision_timeout_ms: default_decision_timeout_ms(),
            pipeline_timeout_ms: default_pipeline_timeout_ms(),
            recent_experience_window: default_recent_experience_window(),
            failure_context_window: default_failure_context_window(),
            nearby_body_limit: default_nearby_body_limit(),
        }
    }
}

/// Snapshot storage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Path of the JSON snapshot file.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Deadline for one snapshot write.
    #[serde(default = "default_persist_timeout_ms")]
    pub persist_timeout_ms: u64,

    /// Write a snapshot after every store mutation, not just at tick end.
    #[serde(default = "default_true")]
    pub snapshot_every_mutation: bool,
}

impl PersistenceConfig {
    /// Override the snapshot path from the environment when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(SNAPSHOT_PATH_ENV)
            && !val.is_empty()
        {
            self.snapshot_path = PathBuf::from(val);
        }
    }

    /// Snapshot write deadline as a [`Duration`].
    pub const fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            persist_timeout_ms: default_persist_timeout_ms(),
            snapshot_every_mutation: default_true(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_max_actions() -> usize {
    3
}

const fn default_decision_timeout_ms() -> u64 {
    30_000
}

const fn default_pipeline_timeout_ms() -> u64 {
    60_000
}

const fn default_recent_experience_window() -> usize {
    10
}

const fn default_failure_context_window() -> usize {
    5
}

const fn default_nearby_body_limit() -> usize {
    10
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("replicator-state.json")
}

const fn default_persist_timeout_ms() -> u64 {
    5000
}

const fn default_true() -> bool {
    true
}
