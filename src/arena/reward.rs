//! Shaped reward terms for the arena.
//!
//! Each tick an agent's reward is the sum of:
//! distance penalty, approach bonus, touch bonus, goal-direction bonus,
//! and (on the scoring tick) the goal bonus or conceded penalty. The goal
//! terms are orders of magnitude larger than everything else.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use super::config::ArenaConfig;
use super::types::{Side, Vec2};

/// One reward value per side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SideRewards {
    pub red: f64,
    pub blue: f64,
}

impl Index<Side> for SideRewards {
    type Output = f64;

    fn index(&self, side: Side) -> &f64 {
        match side {
            Side::Red => &self.red,
            Side::Blue => &self.blue,
        }
    }
}

impl IndexMut<Side> for SideRewards {
    fn index_mut(&mut self, side: Side) -> &mut f64 {
        match side {
            Side::Red => &mut self.red,
            Side::Blue => &mut self.blue,
        }
    }
}

/// Computes the individual shaping terms.
pub struct RewardComputer;

impl RewardComputer {
    /// `-coef × distance / W`, measured center to center.
    pub fn distance_penalty(agent_center: Vec2, ball_center: Vec2, config: &ArenaConfig) -> f64 {
        -config.distance_penalty * agent_center.distance_to(ball_center) / config.width
    }

    /// Cosine between the agent→ball vector and the agent's displacement this
    /// tick, scaled by the approach weight. Zero when either vector vanishes.
    pub fn approach_bonus(
        agent_center: Vec2,
        ball_center: Vec2,
        displacement: Vec2,
        config: &ArenaConfig,
    ) -> f64 {
        let to_ball = ball_center - agent_center;
        let a = to_ball.length();
        let b = displacement.length();
        if a < 1e-9 || b < 1e-9 {
            return 0.0;
        }
        config.approach_bonus * to_ball.dot(displacement) / (a * b)
    }

    /// Ball displacement projected on the unit vector toward `goal_center`,
    /// clipped at zero and scaled.
    pub fn goal_direction_bonus(
        ball_displacement: Vec2,
        ball_center: Vec2,
        goal_center: Vec2,
        config: &ArenaConfig,
    ) -> f64 {
        let toward_goal = (goal_center - ball_center).normalized();
        ball_displacement.dot(toward_goal).max(0.0) * config.goal_direction_bonus
    }

    /// Terminal rewards once `scorer` has put the ball in the opposing goal.
    pub fn goal(scorer: Side, config: &ArenaConfig) -> SideRewards {
        let mut rewards = SideRewards::default();
        rewards[scorer] = config.goal_bonus;
        rewards[scorer.opponent()] = -config.conceded_penalty;
        rewards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_penalty_scales_with_width() {
        let config = ArenaConfig::default();
        let p = RewardComputer::distance_penalty(Vec2::ZERO, Vec2::new(300.0, 0.0), &config);
        assert!((p + 5.0).abs() < 1e-12);
    }

    #[test]
    fn approach_bonus_is_cosine_like() {
        let config = ArenaConfig::default();
        let toward = RewardComputer::approach_bonus(
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            Vec2::new(5.0, 0.0),
            &config,
        );
        let away = RewardComputer::approach_bonus(
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            Vec2::new(-5.0, 0.0),
            &config,
        );
        let sideways = RewardComputer::approach_bonus(
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            Vec2::new(0.0, 5.0),
            &config,
        );
        assert!((toward - 0.8).abs() < 1e-12);
        assert!((away + 0.8).abs() < 1e-12);
        assert!(sideways.abs() < 1e-12);
    }

    #[test]
    fn approach_bonus_independent_of_distance() {
        let config = ArenaConfig::default();
        let near =
            RewardComputer::approach_bonus(Vec2::ZERO, Vec2::new(10.0, 10.0), Vec2::new(5.0, 0.0), &config);
        let far =
            RewardComputer::approach_bonus(Vec2::ZERO, Vec2::new(400.0, 400.0), Vec2::new(5.0, 0.0), &config);
        assert!((near - far).abs() < 1e-12);
    }

    #[test]
    fn approach_bonus_zero_without_movement() {
        let config = ArenaConfig::default();
        let r = RewardComputer::approach_bonus(Vec2::ZERO, Vec2::new(1.0, 1.0), Vec2::ZERO, &config);
        assert_eq!(r, 0.0);
    }

    #[test]
    fn goal_direction_bonus_is_clipped() {
        let config = ArenaConfig::default();
        let goal = Vec2::new(600.0, 200.0);
        let ball = Vec2::new(300.0, 200.0);
        let forward = RewardComputer::goal_direction_bonus(Vec2::new(6.0, 0.0), ball, goal, &config);
        let backward = RewardComputer::goal_direction_bonus(Vec2::new(-6.0, 0.0), ball, goal, &config);
        assert!((forward - 1.2).abs() < 1e-12);
        assert_eq!(backward, 0.0);
    }

    #[test]
    fn goal_rewards_are_asymmetric() {
        let config = ArenaConfig::default();
        let r = RewardComputer::goal(Side::Blue, &config);
        assert_eq!(r.blue, 10_000.0);
        assert_eq!(r.red, -10.0);
    }
}
