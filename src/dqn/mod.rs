//! Value-based learners.
//!
//! Experience replay, ε-greedy exploration and a slowly-tracking target
//! estimator. The estimator itself is abstracted behind [`QEstimator`]; the
//! tch-backed [`QNetwork`] requires the `rl-nn` feature.

pub mod agent;
pub mod buffer;
pub mod config;
pub mod estimator;
pub mod linear;

#[cfg(feature = "rl-nn")]
pub mod network;

pub use agent::{AgentScalarState, DqnAgent, ReplayReport};
pub use buffer::{ReplayBuffer, Transition};
pub use config::{AgentConfig, TargetSync};
pub use estimator::QEstimator;
pub use linear::LinearEstimator;

#[cfg(feature = "rl-nn")]
pub use network::QNetwork;
