//! Configuration types for evolutionary runs.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_iterations() -> u64 {
    1_000_000
}
fn default_dom_interval() -> u64 {
    100
}
fn default_sync_interval() -> u64 {
    1000
}

/// Budget and scheduling parameters for `Evo::evolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolveConfig {
    /// Maximum number of agent invocations.
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Prune dominated candidates every this many iterations.
    #[serde(default = "default_dom_interval")]
    pub dom_interval: u64,
    /// Merge with the checkpoint store every this many iterations.
    #[serde(default = "default_sync_interval")]
    pub sync_interval: u64,
    /// Optional wall-clock limit in seconds, checked before each iteration.
    #[serde(default)]
    pub time_limit_secs: Option<f64>,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Surface scoring failures as errors instead of discarding the candidate.
    #[serde(default)]
    pub strict: bool,
}

impl Default for EvolveConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            dom_interval: default_dom_interval(),
            sync_interval: default_sync_interval(),
            time_limit_secs: None,
            random_seed: None,
            strict: false,
        }
    }
}

impl EvolveConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dom_interval == 0 {
            return Err(ConfigError::ZeroInterval("dom_interval"));
        }
        if self.sync_interval == 0 {
            return Err(ConfigError::ZeroInterval("sync_interval"));
        }
        self.time_limit()?;
        Ok(())
    }

    /// The wall-clock limit as a `Duration`. Negative, non-finite and
    /// out-of-range values are rejected.
    pub fn time_limit(&self) -> Result<Option<Duration>, ConfigError> {
        self.time_limit_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidTimeLimit(secs))
            })
            .transpose()
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_group_name() -> String {
    "AlexK".to_string()
}
fn default_initial_population() -> usize {
    20
}

/// Top-level configuration for the `taopt` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Sections CSV.
    pub sections_path: PathBuf,
    /// TAs CSV.
    pub tas_path: PathBuf,
    /// Directory for summary, profile and best-solution files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Shared checkpoint file. No checkpointing when unset.
    #[serde(default)]
    pub checkpoint_path: Option<PathBuf>,
    /// Value of the `groupname` column in the summary CSV.
    #[serde(default = "default_group_name")]
    pub group_name: String,
    /// Number of random grids seeded before evolving.
    #[serde(default = "default_initial_population")]
    pub initial_population: usize,
    /// Loop parameters.
    #[serde(default)]
    pub evolve: EvolveConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sections_path: PathBuf::from("assignta_data/sections.csv"),
            tas_path: PathBuf::from("assignta_data/tas.csv"),
            output_dir: default_output_dir(),
            checkpoint_path: Some(PathBuf::from("solutions.dat")),
            group_name: default_group_name(),
            initial_population: default_initial_population(),
            evolve: EvolveConfig {
                iterations: 1_000_000,
                dom_interval: 50,
                sync_interval: 999_999,
                time_limit_secs: Some(15.0),
                random_seed: None,
                strict: false,
            },
        }
    }
}

impl RunConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group_name.is_empty() {
            return Err(ConfigError::EmptyGroupName);
        }
        self.evolve.validate()
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be at least 1")]
    ZeroInterval(&'static str),
    #[error("Time limit must be a non-negative number of seconds within range, got {0}")]
    InvalidTimeLimit(f64),
    #[error("Group name must not be empty")]
    EmptyGroupName,
}
