//! Scenario tests for the training orchestrator.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use super::*;
use crate::arena::{ArenaConfig, Side};
use crate::dqn::{AgentConfig, AgentScalarState, LinearEstimator, QEstimator, TargetSync};
use crate::error::Error;

/// Cancels after a fixed number of polls.
struct CancelAfter {
    polls: Cell<usize>,
    limit: usize,
}

impl CancelAfter {
    fn new(limit: usize) -> Self {
        Self {
            polls: Cell::new(0),
            limit,
        }
    }
}

impl CancelSource for CancelAfter {
    fn is_cancelled(&self) -> bool {
        let n = self.polls.get() + 1;
        self.polls.set(n);
        n > self.limit
    }
}

fn config(episodes: usize) -> TrainingConfig {
    TrainingConfig {
        episodes,
        seed: Some(7),
        agent: AgentConfig {
            batch_size: 4,
            ..AgentConfig::default()
        },
        ..TrainingConfig::default()
    }
}

/// One-second clock steps against the default 15 s budget: 15 ticks per
/// episode unless a goal comes first.
fn trainer(cfg: TrainingConfig, dir: &Path) -> Trainer<LinearEstimator, FileStore> {
    let (red, blue) = linear_agents(&cfg).unwrap();
    Trainer::new(cfg, red, blue, FileStore::new(dir))
        .unwrap()
        .with_clock(SteppingClock::new(Duration::from_secs(1)))
}

#[cfg(test)]
mod episodes {
    use super::*;

    #[test]
    fn budget_elapsed_ends_episode_by_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(config(1), dir.path());
        let outcome = t.run().unwrap();

        assert!(!outcome.cancelled);
        assert_eq!(outcome.episodes_completed, 1);
        let ep = &outcome.history[0];
        assert_eq!(ep.end, EpisodeEnd::Timeout);
        assert_eq!(ep.ticks, 15);
        assert_eq!(t.agent(Side::Red).memory().len(), 15);
        assert_eq!(t.agent(Side::Blue).memory().len(), 15);
        assert_eq!(t.phase(), Phase::Shutdown);
    }

    #[test]
    fn goal_ends_episode_immediately() {
        // Ball starts touching the right goal line, so red scores on tick one.
        let cfg = TrainingConfig {
            arena: ArenaConfig {
                width: 40.0,
                red_start_x: 0.0,
                blue_start_x: 0.0,
                ..ArenaConfig::default()
            },
            ..config(1)
        };
        let dir = tempfile::tempdir().unwrap();
        let outcome = trainer(cfg, dir.path()).run().unwrap();

        let ep = &outcome.history[0];
        assert_eq!(ep.end, EpisodeEnd::Goal(Side::Red));
        assert_eq!(ep.ticks, 1);
        assert!(ep.reward_red > 9_000.0);
        assert!(ep.reward_blue < 0.0);
        assert_eq!(outcome.goals(Side::Red), 1);
    }

    #[test]
    fn learning_runs_once_per_episode() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(config(3), dir.path());
        let outcome = t.run().unwrap();

        let expected = 0.995_f64.powi(3);
        for ep in &outcome.history {
            assert_eq!(ep.epsilon_red, ep.epsilon_blue);
        }
        assert!((t.agent(Side::Red).epsilon() - expected).abs() < 1e-12);
        assert!((outcome.history[2].epsilon_red - expected).abs() < 1e-12);
    }

    #[test]
    fn no_learning_below_batch_size() {
        let mut cfg = config(1);
        cfg.agent.batch_size = 64;
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(cfg, dir.path());
        t.run().unwrap();
        assert_eq!(t.agent(Side::Red).epsilon(), 1.0);
        assert_eq!(t.agent(Side::Blue).epsilon(), 1.0);
    }

    /// Runs one episode without learning and checks that each target moved
    /// `passes` blends toward its unchanged policy.
    fn assert_target_blended(target_sync: TargetSync, passes: i32) {
        let mut cfg = config(1);
        cfg.agent.batch_size = 64;
        cfg.agent.tau = 0.1;
        cfg.agent.target_sync = target_sync;
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(cfg, dir.path());
        let before: Vec<_> = Side::all()
            .into_iter()
            .map(|side| {
                let agent = t.agent(side);
                (
                    agent.policy().parameters().unwrap(),
                    agent.target().parameters().unwrap(),
                )
            })
            .collect();
        t.run().unwrap();

        let keep = 0.9f64.powi(passes);
        for (side, (policy, target)) in Side::all().into_iter().zip(before) {
            let agent = t.agent(side);
            assert_eq!(agent.policy().parameters().unwrap(), policy);
            let after = agent.target().parameters().unwrap();
            let pairs = policy.iter().flatten().zip(target.iter().flatten());
            for (a, (p, t0)) in after.iter().flatten().zip(pairs) {
                let expected = p + keep * (t0 - p);
                assert!((a - expected).abs() < 1e-12, "{side}: {a} vs {expected}");
            }
        }
    }

    #[test]
    fn single_sync_blends_target_once_per_episode() {
        assert_target_blended(TargetSync::Single, 1);
    }

    #[test]
    fn double_sync_blends_target_twice_per_episode() {
        assert_target_blended(TargetSync::Double, 2);
    }

    #[test]
    fn renderer_sees_every_tick_with_rounded_scores() {
        let frames: Rc<RefCell<Vec<(usize, f64, f64)>>> = Rc::default();
        let sink = Rc::clone(&frames);
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(config(2), dir.path())
            .with_renderer(move |e: usize, r: f64, b: f64| sink.borrow_mut().push((e, r, b)));
        let outcome = t.run().unwrap();

        let frames = frames.borrow();
        assert_eq!(frames.len(), 30);
        assert!(frames[..15].iter().all(|f| f.0 == 1));
        assert!(frames[15..].iter().all(|f| f.0 == 2));
        for &(_, r, b) in frames.iter() {
            assert_eq!(r, metrics::round2(r));
            assert_eq!(b, metrics::round2(b));
        }
        let last = frames[14];
        assert_eq!(last.1, metrics::round2(outcome.history[0].reward_red));
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let (a, b) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let first = trainer(config(2), a.path()).run().unwrap();
        let second = trainer(config(2), b.path()).run().unwrap();
        let rewards = |o: &TrainingOutcome| {
            o.history
                .iter()
                .map(|s| (s.reward_red, s.reward_blue))
                .collect::<Vec<_>>()
        };
        assert_eq!(rewards(&first), rewards(&second));
        assert_ne!(first.run_id, second.run_id);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = TrainingConfig {
            episode_budget_secs: -1.0,
            ..config(1)
        };
        let (red, blue) = linear_agents(&cfg).unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Trainer::new(cfg, red, blue, FileStore::new(dir.path())),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn unrepresentable_budget_is_rejected_before_running() {
        let cfg = TrainingConfig {
            episode_budget_secs: 1e20,
            ..config(1)
        };
        let (red, blue) = linear_agents(&cfg).unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Trainer::new(cfg, red, blue, FileStore::new(dir.path())),
            Err(Error::InvalidConfiguration { .. })
        ));
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}

#[cfg(test)]
mod cancellation {
    use super::*;

    #[test]
    fn mid_episode_cancel_saves_without_learning() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let mut t = trainer(config(5), dir.path()).with_cancel(CancelAfter::new(5));
        let outcome = t.run().unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.episodes_completed, 0);
        assert_eq!(t.phase(), Phase::Shutdown);
        for side in Side::all() {
            assert_eq!(t.agent(side).epsilon(), 1.0);
            assert_eq!(t.agent(side).memory().len(), 5);
            assert!(store
                .weights_path(side, WeightSlot::Latest, LinearEstimator::WEIGHTS_EXTENSION)
                .exists());
            assert!(!store
                .weights_path(side, WeightSlot::Best, LinearEstimator::WEIGHTS_EXTENSION)
                .exists());
            assert_eq!(
                store.load_scalar_state(side).unwrap(),
                Some(AgentScalarState { epsilon: 1.0 })
            );
        }
        assert_eq!(store.load_best_scores().unwrap(), Some(BestScores::default()));
        assert!(!store.metrics_path().exists());
    }

    #[test]
    fn cancel_in_second_episode_keeps_first_episode_progress() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let mut t = trainer(config(5), dir.path()).with_cancel(CancelAfter::new(20));
        let outcome = t.run().unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.episodes_completed, 1);
        assert_eq!(t.agent(Side::Red).epsilon(), 0.995);
        assert_eq!(t.arena().t, 5);
        assert!(store
            .weights_path(Side::Red, WeightSlot::Best, "json")
            .exists());
        let best = store.load_best_scores().unwrap().unwrap();
        assert_eq!(best.best_red_score, outcome.history[0].reward_red);
    }

    #[test]
    fn token_cancel_before_start_runs_no_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancelToken::new();
        token.cancel();
        let mut t = trainer(config(3), dir.path()).with_cancel(token);
        let outcome = t.run().unwrap();
        assert!(outcome.cancelled);
        assert!(outcome.history.is_empty());
        assert!(t.agent(Side::Blue).memory().is_empty());
    }
}

#[cfg(test)]
mod persistence {
    use super::*;

    #[test]
    fn normal_shutdown_writes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let mut t = trainer(config(3), dir.path());
        let outcome = t.run().unwrap();

        assert_eq!(t.run_id(), outcome.run_id);
        assert_eq!(t.config().episodes, 3);
        assert_eq!(t.store().root(), dir.path());
        let text = fs::read_to_string(store.metrics_path()).unwrap();
        let doc: TrainingMetrics = serde_json::from_str(&text).unwrap();
        assert_eq!(doc.run_id, outcome.run_id);
        assert_eq!(doc.episode, 3);
        assert_eq!(doc.red_reward, metrics::round2(outcome.history[2].reward_red));

        for side in Side::all() {
            assert!(store.weights_path(side, WeightSlot::Latest, "json").exists());
            assert!(store.weights_path(side, WeightSlot::Best, "json").exists());
            let state = store.load_scalar_state(side).unwrap().unwrap();
            assert_eq!(state.epsilon, t.agent(side).epsilon());
        }
    }

    #[test]
    fn best_scores_track_episode_maxima() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let mut t = trainer(config(4), dir.path());
        let outcome = t.run().unwrap();

        let best = store.load_best_scores().unwrap().unwrap();
        assert_eq!(best, t.best_scores());
        for side in Side::all() {
            let max = outcome
                .history
                .iter()
                .map(|s| s.reward(side))
                .fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(best.get(side), max);
            assert!(outcome.history[0].improved.contains(&side));
        }
    }

    #[test]
    fn restores_saved_state_on_init() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let saved = LinearEstimator::zeros(8, 4, 1e-3);
        store.save_weights(Side::Red, WeightSlot::Latest, &saved).unwrap();
        store
            .save_scalar_state(Side::Red, &AgentScalarState { epsilon: 0.5 })
            .unwrap();
        let best = BestScores {
            best_red_score: 12.5,
            best_blue_score: -3.25,
        };
        store.save_best_scores(&best).unwrap();

        let t = trainer(config(1), dir.path());
        let saved = saved.parameters().unwrap();
        assert_eq!(t.agent(Side::Red).policy().parameters().unwrap(), saved);
        assert_ne!(t.agent(Side::Blue).policy().parameters().unwrap(), saved);
        assert_eq!(t.agent(Side::Red).epsilon(), 0.5);
        assert_eq!(t.agent(Side::Blue).epsilon(), 1.0);
        assert_eq!(t.best_scores(), best);
        assert_eq!(t.phase(), Phase::Init);
    }

    #[test]
    fn unreadable_documents_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        fs::write(store.best_scores_path(), "").unwrap();
        fs::write(store.scalar_state_path(Side::Blue), "{\"epsilon\":").unwrap();

        let t = trainer(config(1), dir.path());
        assert_eq!(t.best_scores(), BestScores::default());
        assert_eq!(t.agent(Side::Blue).epsilon(), 1.0);
    }

    #[test]
    fn unreadable_weights_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        fs::write(
            store.weights_path(Side::Red, WeightSlot::Latest, "json"),
            "not weights",
        )
        .unwrap();
        let cfg = config(1);
        let (red, blue) = linear_agents(&cfg).unwrap();
        assert!(Trainer::new(cfg, red, blue, store).is_err());
    }

    #[test]
    fn resumed_run_continues_epsilon_schedule() {
        let dir = tempfile::tempdir().unwrap();
        trainer(config(2), dir.path()).run().unwrap();
        let mut resumed = trainer(config(1), dir.path());
        assert!((resumed.agent(Side::Red).epsilon() - 0.995_f64.powi(2)).abs() < 1e-12);
        resumed.run().unwrap();
        assert!((resumed.agent(Side::Red).epsilon() - 0.995_f64.powi(3)).abs() < 1e-12);
    }
}
