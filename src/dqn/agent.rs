//! ε-greedy value-based learner with experience replay and a target estimator.

use std::path::Path;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::buffer::{ReplayBuffer, Transition};
use super::config::AgentConfig;
use super::estimator::{argmax, max_value, QEstimator};
use crate::arena::{Observation, Side};
use crate::error::{Error, Result};

/// Scalar training state persisted alongside the weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentScalarState {
    #[serde(default = "AgentScalarState::default_epsilon")]
    pub epsilon: f64,
}

impl AgentScalarState {
    fn default_epsilon() -> f64 {
        1.0
    }
}

impl Default for AgentScalarState {
    fn default() -> Self {
        Self {
            epsilon: Self::default_epsilon(),
        }
    }
}

/// Summary of a learning pass that actually ran.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayReport {
    /// Transitions fitted.
    pub samples: usize,
    /// Mean absolute TD error of the sampled transitions before fitting.
    pub mean_td_error: f64,
    /// ε after the decay step.
    pub epsilon: f64,
}

/// One learning agent: policy estimator, target estimator, experience buffer
/// and exploration schedule.
pub struct DqnAgent<E: QEstimator> {
    /// Which side of the arena this agent plays.
    pub side: Side,
    policy: E,
    target: E,
    memory: ReplayBuffer,
    epsilon: f64,
    config: AgentConfig,
    rng: StdRng,
}

impl<E: QEstimator> DqnAgent<E> {
    /// Creates an agent. The target receives one blend pass toward the policy
    /// before training starts.
    pub fn new(side: Side, policy: E, target: E, config: AgentConfig, rng: StdRng) -> Result<Self> {
        if policy.action_count() != target.action_count() {
            return Err(Error::IncompatibleParameters);
        }
        let mut agent = Self {
            side,
            policy,
            target,
            memory: ReplayBuffer::new(config.memory_capacity),
            epsilon: config.epsilon_start,
            config,
            rng,
        };
        agent.sync_target(agent.config.tau)?;
        Ok(agent)
    }

    /// ε-greedy action selection. Does not change ε.
    pub fn act(&mut self, state: &Observation) -> Result<usize> {
        if self.rng.gen::<f64>() < self.epsilon {
            return Ok(self.rng.gen_range(0..self.policy.action_count()));
        }
        let q = self.policy.predict(state.as_slice())?;
        argmax(&q).ok_or(Error::ShapeMismatch {
            context: "act",
            expected: self.policy.action_count(),
            got: 0,
        })
    }

    /// Records a transition.
    pub fn remember(&mut self, transition: Transition) {
        self.memory.remember(transition);
    }

    /// One learning pass over a random minibatch, then one ε decay step.
    ///
    /// Returns `Ok(None)` without touching anything while the buffer holds
    /// fewer than `batch_size` transitions.
    pub fn replay(&mut self) -> Result<Option<ReplayReport>> {
        let batch_size = self.config.batch_size;
        if self.memory.len() < batch_size {
            return Ok(None);
        }

        let batch: Vec<Transition> = self
            .memory
            .sample(&mut self.rng, batch_size)
            .into_iter()
            .copied()
            .collect();

        let mut td_error = 0.0;
        for t in &batch {
            let mut q = self.policy.predict(t.state.as_slice())?;
            let target = self.td_target(t)?;
            let slot = q.get_mut(t.action).ok_or(Error::ShapeMismatch {
                context: "replay action index",
                expected: self.policy.action_count(),
                got: t.action + 1,
            })?;
            td_error += (target - *slot).abs();
            *slot = target;
            self.policy.fit(t.state.as_slice(), &q)?;
        }

        self.epsilon = self.config.decayed(self.epsilon);
        let report = ReplayReport {
            samples: batch.len(),
            mean_td_error: td_error / batch.len().max(1) as f64,
            epsilon: self.epsilon,
        };
        debug!(
            side = %self.side,
            samples = report.samples,
            td_error = report.mean_td_error,
            epsilon = report.epsilon,
            "replay"
        );
        Ok(Some(report))
    }

    /// `reward` for terminal transitions, else `reward + γ·max Q_target(next)`.
    pub fn td_target(&self, t: &Transition) -> Result<f64> {
        if t.done {
            return Ok(t.reward);
        }
        let next_q = self.target.predict(t.next_state.as_slice())?;
        let best = max_value(&next_q).ok_or(Error::ShapeMismatch {
            context: "target predict",
            expected: self.target.action_count(),
            got: 0,
        })?;
        Ok(t.reward + self.config.gamma * best)
    }

    /// Blends every target parameter toward the policy: `τ·policy + (1−τ)·target`.
    pub fn sync_target(&mut self, tau: f64) -> Result<()> {
        self.target.blend_from(&self.policy, tau)
    }

    /// Applies the configured number of blend passes with the configured τ.
    pub fn end_of_episode_sync(&mut self) -> Result<()> {
        for _ in 0..self.config.target_sync.passes() {
            self.sync_target(self.config.tau)?;
        }
        Ok(())
    }

    /// Persists the policy estimator's parameters.
    pub fn save_weights(&self, path: &Path) -> Result<()> {
        self.policy.save(path)
    }

    /// Restores the policy estimator's parameters. The target is left as is
    /// and catches up through the per-episode blends.
    pub fn load_weights(&mut self, path: &Path) -> Result<()> {
        self.policy.load(path)
    }

    /// Exploration state to persist.
    pub fn scalar_state(&self) -> AgentScalarState {
        AgentScalarState {
            epsilon: self.epsilon,
        }
    }

    /// Restores ε, clamped to `[epsilon_min, 1]`.
    pub fn restore_scalar_state(&mut self, state: AgentScalarState) {
        self.epsilon = state.epsilon.clamp(self.config.epsilon_min, 1.0);
    }

    /// Current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Experience buffer.
    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }

    /// Estimator used for acting and trained by replay.
    pub fn policy(&self) -> &E {
        &self.policy
    }

    /// Mutable policy, used when restoring persisted weights.
    pub fn policy_mut(&mut self) -> &mut E {
        &mut self.policy
    }

    /// Estimator used for bootstrapped targets.
    pub fn target(&self) -> &E {
        &self.target
    }

    /// Hyperparameters this agent was built with.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}
