//! Per-episode summaries and the run-level metrics document.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::arena::Side;

/// Rounds to two decimals, the precision used for display and for the
/// metrics document.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Why an episode stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeEnd {
    /// The ball crossed a goal line; carries the scoring side.
    Goal(Side),
    /// The wall-clock budget ran out.
    Timeout,
}

impl fmt::Display for EpisodeEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpisodeEnd::Goal(side) => write!(f, "goal by {side}"),
            EpisodeEnd::Timeout => f.write_str("timeout"),
        }
    }
}

/// Outcome of one completed episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    /// 1-based episode index.
    pub episode: usize,
    pub reward_red: f64,
    pub reward_blue: f64,
    pub ticks: u64,
    pub end: EpisodeEnd,
    /// ε of each agent after the end-of-episode learning pass.
    pub epsilon_red: f64,
    pub epsilon_blue: f64,
    /// Sides whose best score improved this episode.
    pub improved: Vec<Side>,
}

impl EpisodeSummary {
    /// Cumulative reward of `side`.
    pub fn reward(&self, side: Side) -> f64 {
        match side {
            Side::Red => self.reward_red,
            Side::Blue => self.reward_blue,
        }
    }
}

/// Result of a whole training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOutcome {
    pub run_id: String,
    /// Episodes that reached their end phase.
    pub episodes_completed: usize,
    /// Whether the run stopped because cancellation was requested.
    pub cancelled: bool,
    pub history: Vec<EpisodeSummary>,
}

impl TrainingOutcome {
    /// Goals scored by `side` across completed episodes.
    pub fn goals(&self, side: Side) -> usize {
        self.history
            .iter()
            .filter(|s| s.end == EpisodeEnd::Goal(side))
            .count()
    }

    /// Completed episodes that ran out of budget.
    pub fn timeouts(&self) -> usize {
        self.history
            .iter()
            .filter(|s| s.end == EpisodeEnd::Timeout)
            .count()
    }

    /// Mean cumulative reward of `side`, zero for an empty run.
    pub fn mean_reward(&self, side: Side) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().map(|s| s.reward(side)).sum::<f64>() / self.history.len() as f64
    }
}

impl fmt::Display for TrainingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Training run {} ({} episodes{}) ===",
            self.run_id,
            self.episodes_completed,
            if self.cancelled { ", cancelled" } else { "" }
        )?;
        writeln!(
            f,
            "  Goals red/blue:      {}/{}",
            self.goals(Side::Red),
            self.goals(Side::Blue)
        )?;
        writeln!(f, "  Timeouts:            {}", self.timeouts())?;
        writeln!(
            f,
            "  Mean reward red:     {:.2}",
            self.mean_reward(Side::Red)
        )?;
        write!(
            f,
            "  Mean reward blue:    {:.2}",
            self.mean_reward(Side::Blue)
        )
    }
}

/// Document written once at normal shutdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub run_id: String,
    /// Last completed episode index.
    pub episode: usize,
    /// Last episode's cumulative rewards, rounded to two decimals.
    pub red_reward: f64,
    pub blue_reward: f64,
}

impl TrainingMetrics {
    /// Document for the last completed episode, zeros when there was none.
    pub fn from_last(run_id: &str, last: Option<&EpisodeSummary>) -> Self {
        match last {
            Some(s) => Self {
                run_id: run_id.to_string(),
                episode: s.episode,
                red_reward: round2(s.reward_red),
                blue_reward: round2(s.reward_blue),
            },
            None => Self {
                run_id: run_id.to_string(),
                episode: 0,
                red_reward: 0.0,
                blue_reward: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(episode: usize, end: EpisodeEnd, red: f64) -> EpisodeSummary {
        EpisodeSummary {
            episode,
            reward_red: red,
            reward_blue: -red,
            ticks: 10,
            end,
            epsilon_red: 1.0,
            epsilon_blue: 1.0,
            improved: Vec::new(),
        }
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(-1.235_000_1), -1.24);
        assert_eq!(round2(10_000.0), 10_000.0);
    }

    #[test]
    fn outcome_tallies() {
        let outcome = TrainingOutcome {
            run_id: "r".into(),
            episodes_completed: 3,
            cancelled: false,
            history: vec![
                summary(1, EpisodeEnd::Goal(Side::Red), 100.0),
                summary(2, EpisodeEnd::Timeout, -20.0),
                summary(3, EpisodeEnd::Goal(Side::Red), 10.0),
            ],
        };
        assert_eq!(outcome.goals(Side::Red), 2);
        assert_eq!(outcome.goals(Side::Blue), 0);
        assert_eq!(outcome.timeouts(), 1);
        assert!((outcome.mean_reward(Side::Red) - 30.0).abs() < 1e-12);
        assert!(outcome.to_string().contains("Goals red/blue:      2/0"));
    }

    #[test]
    fn metrics_document_uses_last_episode() {
        let last = summary(7, EpisodeEnd::Timeout, -12.3456);
        let doc = TrainingMetrics::from_last("abc", Some(&last));
        assert_eq!(doc.episode, 7);
        assert_eq!(doc.red_reward, -12.35);
        assert_eq!(doc.blue_reward, 12.35);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["red_reward"], -12.35);
    }

    #[test]
    fn end_reason_display() {
        assert_eq!(EpisodeEnd::Goal(Side::Blue).to_string(), "goal by blue");
        assert_eq!(EpisodeEnd::Timeout.to_string(), "timeout");
    }
}
