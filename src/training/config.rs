//! Run-level configuration for the training orchestrator.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::arena::ArenaConfig;
use crate::dqn::AgentConfig;
use crate::error::{Error, Result};

/// Training run configuration.
///
/// Every field has a default, so a JSON config file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of episodes to run.
    pub episodes: usize,
    /// Wall-clock budget per episode, in seconds.
    pub episode_budget_secs: f64,
    /// Optional tick pacing; `None` runs as fast as possible.
    pub tick_rate_hz: Option<u32>,
    /// Seed for both agents' random sources; entropy when absent.
    pub seed: Option<u64>,
    /// Directory the file store reads from and writes to.
    pub output_dir: PathBuf,
    /// Arena geometry and reward shaping.
    pub arena: ArenaConfig,
    /// Hyperparameters shared by both agents.
    pub agent: AgentConfig,
}

impl TrainingConfig {
    /// Reads a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("read config {path:?}"), e))?;
        serde_json::from_str(&text).map_err(|e| Error::CorruptDocument {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Per-episode budget as a `Duration`; fails for values a `Duration` cannot hold.
    pub fn episode_budget(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.episode_budget_secs).map_err(|e| {
            Error::InvalidConfiguration {
                message: format!(
                    "episode_budget_secs {} is not a valid duration: {e}",
                    self.episode_budget_secs
                ),
            }
        })
    }

    /// Sleep between ticks, if pacing is enabled.
    pub fn tick_interval(&self) -> Option<Duration> {
        self.tick_rate_hz
            .filter(|hz| *hz > 0)
            .map(|hz| Duration::from_secs_f64(1.0 / hz as f64))
    }

    /// Rejects budgets, batch sizes and blend factors the trainer cannot use.
    pub fn validate(&self) -> Result<()> {
        if !(self.episode_budget_secs.is_finite() && self.episode_budget_secs > 0.0) {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "episode_budget_secs must be positive, got {}",
                    self.episode_budget_secs
                ),
            });
        }
        self.episode_budget()?;
        if self.agent.batch_size == 0 || self.agent.batch_size > self.agent.memory_capacity {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "batch_size must be in 1..={}, got {}",
                    self.agent.memory_capacity, self.agent.batch_size
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.agent.tau) {
            return Err(Error::InvalidConfiguration {
                message: format!("tau must be in [0, 1], got {}", self.agent.tau),
            });
        }
        Ok(())
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            episode_budget_secs: 15.0,
            tick_rate_hz: None,
            seed: None,
            output_dir: PathBuf::from("."),
            arena: ArenaConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}
