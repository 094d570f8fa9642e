//! Self-play training loop.
//!
//! The [`Trainer`] drives episodes in the arena, lets both agents learn at the
//! end of each one, and persists progress through a [`TrainingStore`].
//! Rendering, cancellation and time are injected collaborators.

pub mod cancel;
pub mod clock;
pub mod config;
pub mod metrics;
pub mod render;
pub mod store;
pub mod trainer;

#[cfg(test)]
mod tests;

pub use cancel::{CancelSource, CancelToken, Never, StopFile};
pub use clock::{Clock, SteppingClock, SystemClock};
pub use config::TrainingConfig;
pub use metrics::{EpisodeEnd, EpisodeSummary, TrainingMetrics, TrainingOutcome};
pub use render::{NoopRenderer, Renderer, TraceRenderer};
pub use store::{BestScores, FileStore, TrainingStore, WeightSlot};
pub use trainer::{linear_agents, side_rng, Phase, Trainer};

#[cfg(feature = "rl-nn")]
pub use trainer::network_agents;
