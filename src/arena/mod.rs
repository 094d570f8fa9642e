//! Two-agent ball arena.
//!
//! Physics and reward shaping for the environment both learners train in:
//! two square agents, one ball, two goal lines.

pub mod config;
pub mod environment;
pub mod observation;
pub mod reward;
pub mod types;

pub use config::ArenaConfig;
pub use environment::{Arena, ArenaState, Move, StepEvents, StepOutcome, StepResult};
pub use observation::{Observation, ObservationBuilder};
pub use reward::{RewardComputer, SideRewards};
pub use types::{Ball, Rect, Side, Vec2};
