//! Hyperparameters for the value-based learners.

use serde::{Deserialize, Serialize};

/// How many blend passes the target estimator receives per episode.
///
/// Both passes use the same formula, `target := τ·policy + (1−τ)·target`.
/// `Double` compounds two passes back to back, `Single` applies one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSync {
    /// One blend pass.
    Single,
    /// Two consecutive blend passes.
    Double,
}

impl TargetSync {
    /// Blend passes applied at each episode end.
    pub fn passes(&self) -> usize {
        match self {
            TargetSync::Single => 1,
            TargetSync::Double => 2,
        }
    }
}

/// Agent hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Discount factor γ.
    pub gamma: f64,
    /// Exploration probability for a fresh agent.
    pub epsilon_start: f64,
    /// Exploration floor.
    pub epsilon_min: f64,
    /// Multiplicative ε decay applied after each learning step.
    pub epsilon_decay: f64,
    /// Minibatch size for replay.
    pub batch_size: usize,
    /// Experience buffer capacity.
    pub memory_capacity: usize,
    /// Blend factor τ for target synchronization.
    pub tau: f64,
    /// Target blend passes per episode.
    pub target_sync: TargetSync,
    /// Learning rate handed to the estimator backend.
    pub learning_rate: f64,
}

impl AgentConfig {
    /// Applies one decay step to `epsilon`, floored at `epsilon_min`.
    pub fn decayed(&self, epsilon: f64) -> f64 {
        (epsilon * self.epsilon_decay).max(self.epsilon_min)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            batch_size: 64,
            memory_capacity: 10_000,
            tau: 0.01,
            target_sync: TargetSync::Double,
            learning_rate: 1e-3,
        }
    }
}
