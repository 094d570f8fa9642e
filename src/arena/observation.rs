//! State-vector encoding of the arena.

use serde::{Deserialize, Serialize};

use super::config::ArenaConfig;
use super::environment::ArenaState;

/// The normalized 8-value state both agents observe each tick.
///
/// Layout:
/// ```text
/// [red_x, red_y, blue_x, blue_y, ball_x, ball_y, ball_vx, ball_vy]
/// ```
/// Positions are top-left corners divided by the arena size; velocity is
/// divided by [`ArenaConfig::velocity_scale`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation(pub [f64; ArenaConfig::STATE_DIM]);

impl Observation {
    /// Features in order, as fed to an estimator.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl AsRef<[f64]> for Observation {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Builds observations from arena states.
pub struct ObservationBuilder;

impl ObservationBuilder {
    /// Normalizes `state` against `config`'s dimensions.
    pub fn build(state: &ArenaState, config: &ArenaConfig) -> Observation {
        let w = config.width;
        let h = config.height;
        let v = config.velocity_scale;
        Observation([
            state.red.left() / w,
            state.red.top() / h,
            state.blue.left() / w,
            state.blue.top() / h,
            state.ball.bounds.left() / w,
            state.ball.bounds.top() / h,
            state.ball.velocity.x / v,
            state.ball.velocity.y / v,
        ])
    }
}
