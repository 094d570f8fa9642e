//! Configuration for the arena geometry, dynamics and reward shaping.

use serde::{Deserialize, Serialize};

/// Arena configuration.
///
/// Distances are in pixels and velocities in pixels per tick. The defaults
/// describe a 600 × 400 pitch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    // --- Geometry ---
    /// Arena width W.
    pub width: f64,
    /// Arena height H.
    pub height: f64,
    /// Side length of each agent's square hitbox.
    pub agent_size: f64,
    /// Ball radius.
    pub ball_radius: f64,
    /// Start column (hitbox left edge) of the red agent.
    pub red_start_x: f64,
    /// Start column (hitbox left edge) of the blue agent.
    pub blue_start_x: f64,
    /// Depth of each goal rectangle.
    pub goal_depth: f64,
    /// Height of each goal rectangle, vertically centered.
    pub goal_height: f64,

    // --- Dynamics ---
    /// Agent displacement per tick.
    pub agent_speed: f64,
    /// Ball speed right after a touch.
    pub push_strength: f64,
    /// Per-tick multiplicative ball velocity decay.
    pub velocity_decay: f64,
    /// Divisor applied to ball velocity in the state vector.
    pub velocity_scale: f64,

    // --- Reward shaping ---
    /// Distance penalty coefficient (penalty = coef × dist / W).
    pub distance_penalty: f64,
    /// Weight of the move-toward-ball cosine term.
    pub approach_bonus: f64,
    /// Flat bonus for touching the ball.
    pub touch_bonus: f64,
    /// Weight of the ball-toward-opponent-goal term.
    pub goal_direction_bonus: f64,
    /// Bonus for scoring.
    pub goal_bonus: f64,
    /// Penalty for conceding.
    pub conceded_penalty: f64,
}

impl ArenaConfig {
    /// Length of the state vector.
    pub const STATE_DIM: usize = 8;

    /// Number of discrete actions (up, down, left, right).
    pub const ACTION_COUNT: usize = 4;

    /// Vertical offset of the goal rectangles.
    pub fn goal_top(&self) -> f64 {
        ((self.height - self.goal_height) / 2.0).floor()
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
            agent_size: 20.0,
            ball_radius: 10.0,
            red_start_x: 50.0,
            blue_start_x: 530.0,
            goal_depth: 10.0,
            goal_height: 350.0,
            agent_speed: 5.0,
            push_strength: 7.0,
            velocity_decay: 0.95,
            velocity_scale: 10.0,
            distance_penalty: 10.0,
            approach_bonus: 0.8,
            touch_bonus: 100.0,
            goal_direction_bonus: 0.2,
            goal_bonus: 10_000.0,
            conceded_penalty: 10.0,
        }
    }
}
