//! pitch_rl - two-agent self-play Q-learning in a simple ball arena.
//!
//! A red and a blue agent each control a square on a 2D pitch and learn, by
//! ε-greedy deep Q-learning with experience replay, to push a ball into the
//! opponent's goal.
//!
//! - [`arena`]: physics, shaped rewards and observations.
//! - [`dqn`]: replay buffer, Q-value estimators and the learning agent.
//! - [`training`]: the episode orchestrator and its persistence store.
//!
//! The tch-backed MLP estimator is behind the `rl-nn` feature.

pub mod arena;
pub mod dqn;
pub mod error;
pub mod training;

pub use error::{Error, Result};

/// Identifier type used for training runs.
pub type Id = String;

/// Generates a new unique identifier (UUID v4).
pub fn generate_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}
