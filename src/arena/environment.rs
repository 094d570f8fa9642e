//! The two-agent ball arena.
//!
//! [`ArenaState::step`] is a pure function from the current state and one
//! action per agent to the next state, the two rewards and the terminal flag.
//! [`Arena`] wraps it with the reset/step lifecycle the training loop uses.
//!
//! Tick order:
//! move agents → distance penalty → approach bonus → touches → ball
//! integration → goal-direction bonus → goal check.

use serde::{Deserialize, Serialize};

use super::config::ArenaConfig;
use super::observation::{Observation, ObservationBuilder};
use super::reward::{RewardComputer, SideRewards};
use super::types::{Ball, Rect, Side, Vec2};

/// Discrete agent action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Maps an action index to a move. Indices outside `0..4` have no move.
    pub fn from_index(action: usize) -> Option<Move> {
        match action {
            0 => Some(Move::Up),
            1 => Some(Move::Down),
            2 => Some(Move::Left),
            3 => Some(Move::Right),
            _ => None,
        }
    }

    /// Unit direction in screen coordinates (y grows downward).
    pub fn direction(&self) -> Vec2 {
        match self {
            Move::Up => Vec2::new(0.0, -1.0),
            Move::Down => Vec2::new(0.0, 1.0),
            Move::Left => Vec2::new(-1.0, 0.0),
            Move::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// What happened during a tick, besides the rewards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepEvents {
    /// Red touched the ball this tick.
    pub red_touch: bool,
    /// Blue touched the ball this tick.
    pub blue_touch: bool,
    /// Velocity imparted by the last touch, before decay.
    pub push: Option<Vec2>,
    /// The ball bounced off the top or bottom wall.
    pub wall_bounce: bool,
    /// Side that scored, if any.
    pub scorer: Option<Side>,
}

/// Full physical state of the arena at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaState {
    /// Red agent hitbox.
    pub red: Rect,
    /// Blue agent hitbox.
    pub blue: Rect,
    /// Ball bounds and velocity.
    pub ball: Ball,
}

/// Output of [`ArenaState::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub state: ArenaState,
    pub rewards: SideRewards,
    pub done: bool,
    pub events: StepEvents,
}

impl ArenaState {
    /// Start-of-episode layout: agents at their start columns, ball centered at rest.
    pub fn initial(config: &ArenaConfig) -> Self {
        let mid_y = (config.height / 2.0).floor();
        Self {
            red: Rect::new(config.red_start_x, mid_y, config.agent_size, config.agent_size),
            blue: Rect::new(config.blue_start_x, mid_y, config.agent_size, config.agent_size),
            ball: Ball::at(
                (config.width / 2.0).floor(),
                mid_y,
                config.ball_radius,
            ),
        }
    }

    /// Hitbox of `side`.
    pub fn agent(&self, side: Side) -> &Rect {
        match side {
            Side::Red => &self.red,
            Side::Blue => &self.blue,
        }
    }

    /// Goal rectangle defended by `side` (red: left, blue: right).
    pub fn goal_of(side: Side, config: &ArenaConfig) -> Rect {
        let x = match side {
            Side::Red => 0.0,
            Side::Blue => config.width - config.goal_depth,
        };
        Rect::new(x, config.goal_top(), config.goal_depth, config.goal_height)
    }

    /// Ball velocity after `hitbox` touches the ball: `push_strength` along
    /// the unit vector from the hitbox center to the ball center.
    pub fn push_velocity(ball: &Ball, hitbox: &Rect, config: &ArenaConfig) -> Vec2 {
        (ball.center() - hitbox.center()).normalized() * config.push_strength
    }

    /// Advances the arena by one tick.
    pub fn step(&self, config: &ArenaConfig, red_action: usize, blue_action: usize) -> StepOutcome {
        let mut rewards = SideRewards::default();
        let mut events = StepEvents::default();

        // 1. Move agents.
        let red = Self::moved(&self.red, red_action, config);
        let blue = Self::moved(&self.blue, blue_action, config);

        // 2-3. Distance penalty and approach bonus, against the ball before it moves.
        let ball_center = self.ball.center();
        for (side, before, after) in [(Side::Red, &self.red, &red), (Side::Blue, &self.blue, &blue)] {
            rewards[side] += RewardComputer::distance_penalty(after.center(), ball_center, config);
            rewards[side] += RewardComputer::approach_bonus(
                after.center(),
                ball_center,
                after.origin - before.origin,
                config,
            );
        }

        // 4. Touches. Blue resolves after red, so its push wins a shared tick.
        let mut velocity = self.ball.velocity;
        for (side, hitbox) in [(Side::Red, &red), (Side::Blue, &blue)] {
            if self.ball.overlaps(hitbox) {
                velocity = Self::push_velocity(&self.ball, hitbox, config);
                rewards[side] += config.touch_bonus;
                events.push = Some(velocity);
                match side {
                    Side::Red => events.red_touch = true,
                    Side::Blue => events.blue_touch = true,
                }
            }
        }

        // 5. Integrate the ball, decay, clamp, bounce off top/bottom.
        let bounds = self
            .ball
            .bounds
            .translated(velocity.trunc())
            .clamped(config.width, config.height);
        velocity = velocity * config.velocity_decay;
        if bounds.top() <= 0.0 || bounds.bottom() >= config.height {
            velocity.y = -velocity.y;
            events.wall_bounce = true;
        }
        let ball = Ball { bounds, velocity };

        // 6. Reward pushing the ball toward the opponent's goal.
        let displacement = ball.center() - ball_center;
        for side in Side::all() {
            let target = Self::goal_of(side.opponent(), config).center();
            rewards[side] +=
                RewardComputer::goal_direction_bonus(displacement, ball.center(), target, config);
        }

        // 7. Goal check. Left and right walls are goal lines, never bounces.
        let scorer = if bounds.left() <= 0.0 {
            Some(Side::Blue)
        } else if bounds.right() >= config.width {
            Some(Side::Red)
        } else {
            None
        };
        if let Some(side) = scorer {
            let goal = RewardComputer::goal(side, config);
            rewards.red += goal.red;
            rewards.blue += goal.blue;
        }
        events.scorer = scorer;

        StepOutcome {
            state: ArenaState { red, blue, ball },
            rewards,
            done: scorer.is_some(),
            events,
        }
    }

    fn moved(hitbox: &Rect, action: usize, config: &ArenaConfig) -> Rect {
        match Move::from_index(action) {
            Some(m) => hitbox
                .translated(m.direction() * config.agent_speed)
                .clamped(config.width, config.height),
            None => *hitbox,
        }
    }
}

/// Result of a single [`Arena::step`].
#[derive(Debug, Clone)]
pub struct StepResult {
    /// State vector after the step.
    pub observation: Observation,
    /// Red's reward for this tick.
    pub reward_red: f64,
    /// Blue's reward for this tick.
    pub reward_blue: f64,
    /// Whether a goal was scored.
    pub done: bool,
    /// Tick index after the step.
    pub tick: u64,
    /// Touches, bounces and goals.
    pub events: StepEvents,
}

/// The arena environment.
///
/// # Lifecycle
///
/// 1. Call [`Arena::new`] with a configuration.
/// 2. Call [`Arena::reset`] at the start of each episode.
/// 3. Call [`Arena::step`] with both agents' actions until `done` or the
///    caller's time budget runs out.
#[derive(Debug, Clone)]
pub struct Arena {
    /// Arena configuration.
    pub config: ArenaConfig,
    state: ArenaState,
    /// Ticks since the last reset.
    pub t: u64,
}

impl Arena {
    /// Arena in its start layout.
    pub fn new(config: ArenaConfig) -> Self {
        let state = ArenaState::initial(&config);
        Self { config, state, t: 0 }
    }

    /// Restores the start layout and returns the initial observation.
    pub fn reset(&mut self) -> Observation {
        self.state = ArenaState::initial(&self.config);
        self.t = 0;
        self.observation()
    }

    /// Applies one action per agent. Never fails; unknown actions mean "stay".
    pub fn step(&mut self, red_action: usize, blue_action: usize) -> StepResult {
        let outcome = self.state.step(&self.config, red_action, blue_action);
        self.state = outcome.state;
        self.t += 1;

        StepResult {
            observation: self.observation(),
            reward_red: outcome.rewards.red,
            reward_blue: outcome.rewards.blue,
            done: outcome.done,
            tick: self.t,
            events: outcome.events,
        }
    }

    /// Current physical state.
    pub fn state(&self) -> &ArenaState {
        &self.state
    }

    /// Replaces the physical state, e.g. to set up a scenario.
    pub fn set_state(&mut self, state: ArenaState) {
        self.state = state;
    }

    /// Normalized view of the current state.
    pub fn observation(&self) -> Observation {
        ObservationBuilder::build(&self.state, &self.config)
    }
}
