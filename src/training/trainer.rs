//! Episode orchestrator: two learning agents against each other in one arena.
//!
//! Life cycle:
//!
//! ```text
//! INIT ──► RUNNING ──(goal | budget elapsed)──► EPISODE_END ──► RUNNING …
//!             │                                                   │
//!             └──(cancel)──► SHUTDOWN ◄──(episodes exhausted)─────┘
//! ```
//!
//! INIT restores weights, ε and best scores from the store. Each tick both
//! agents act on the same observation, the arena advances, and each agent
//! remembers its own transition. EPISODE_END runs one learning pass per
//! agent, syncs the targets and records best scores. Cancellation is polled
//! at the top of every tick; it persists progress and exits without a final
//! learning pass.

use std::thread;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::cancel::{CancelSource, Never};
use super::clock::{Clock, SystemClock};
use super::config::TrainingConfig;
use super::metrics::{round2, EpisodeEnd, EpisodeSummary, TrainingMetrics, TrainingOutcome};
use super::render::{NoopRenderer, Renderer};
use super::store::{BestScores, TrainingStore, WeightSlot};
use crate::arena::{Arena, ArenaConfig, Side, SideRewards};
use crate::dqn::{DqnAgent, LinearEstimator, QEstimator, Transition};
use crate::error::Result;

/// Orchestrator phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Configured and restored, not yet running.
    Init,
    /// Inside an episode's tick loop.
    Running,
    /// Learning and bookkeeping after an episode.
    EpisodeEnd,
    /// Progress saved; the run is over.
    Shutdown,
}

/// What a single episode loop produced.
enum EpisodeRun {
    Finished {
        totals: SideRewards,
        ticks: u64,
        end: EpisodeEnd,
    },
    Cancelled {
        ticks: u64,
    },
}

/// Drives red and blue agents through episodes of the arena, learning after
/// each one and persisting progress to `S`.
pub struct Trainer<E: QEstimator, S: TrainingStore> {
    config: TrainingConfig,
    run_id: String,
    arena: Arena,
    red: DqnAgent<E>,
    blue: DqnAgent<E>,
    store: S,
    best: BestScores,
    renderer: Box<dyn Renderer>,
    cancel: Box<dyn CancelSource>,
    clock: Box<dyn Clock>,
    phase: Phase,
}

impl<E: QEstimator, S: TrainingStore> Trainer<E, S> {
    /// INIT: validates the configuration and restores persisted progress.
    ///
    /// Absent resources leave the fresh defaults in place. Unreadable scalar
    /// state or best scores are logged and replaced by defaults; unreadable
    /// weights are an error.
    pub fn new(
        config: TrainingConfig,
        red: DqnAgent<E>,
        blue: DqnAgent<E>,
        store: S,
    ) -> Result<Self> {
        config.validate()?;
        let mut trainer = Self {
            arena: Arena::new(config.arena.clone()),
            config,
            run_id: crate::generate_id(),
            red,
            blue,
            store,
            best: BestScores::default(),
            renderer: Box::new(NoopRenderer),
            cancel: Box::new(Never),
            clock: Box::new(SystemClock::new()),
            phase: Phase::Init,
        };
        trainer.restore()?;
        info!(run_id = %trainer.run_id, episodes = trainer.config.episodes, "trainer ready");
        Ok(trainer)
    }

    /// Replaces the per-tick score sink.
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Replaces the cancellation source polled every tick.
    pub fn with_cancel(mut self, cancel: impl CancelSource + 'static) -> Self {
        self.cancel = Box::new(cancel);
        self
    }

    /// Replaces the clock measuring the episode budget.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn restore(&mut self) -> Result<()> {
        for side in Side::all() {
            let agent = match side {
                Side::Red => &mut self.red,
                Side::Blue => &mut self.blue,
            };
            if self
                .store
                .load_weights(side, WeightSlot::Latest, agent.policy_mut())?
            {
                info!(%side, "restored weights");
            }

            match self.store.load_scalar_state(side) {
                Ok(Some(state)) => {
                    self.agent_mut(side).restore_scalar_state(state);
                    info!(%side, epsilon = self.agent(side).epsilon(), "restored agent state");
                }
                Ok(None) => {}
                Err(e) => warn!(%side, error = %e, "ignoring unreadable agent state"),
            }
        }

        match self.store.load_best_scores() {
            Ok(Some(best)) => {
                self.best = best;
                info!(
                    red = self.best.best_red_score,
                    blue = self.best.best_blue_score,
                    "restored best scores"
                );
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "ignoring unreadable best scores"),
        }
        Ok(())
    }

    /// Runs until the configured episodes are exhausted or cancellation is
    /// observed.
    pub fn run(&mut self) -> Result<TrainingOutcome> {
        let mut history = Vec::with_capacity(self.config.episodes);

        for episode in 1..=self.config.episodes {
            self.phase = Phase::Running;
            match self.run_episode(episode)? {
                EpisodeRun::Cancelled { ticks } => {
                    info!(episode, ticks, "cancellation requested, saving progress");
                    self.phase = Phase::Shutdown;
                    self.persist_progress()?;
                    return Ok(self.outcome(history, true));
                }
                EpisodeRun::Finished { totals, ticks, end } => {
                    self.phase = Phase::EpisodeEnd;
                    history.push(self.finish_episode(episode, totals, ticks, end)?);
                }
            }
        }

        self.phase = Phase::Shutdown;
        self.shutdown(history.last())?;
        Ok(self.outcome(history, false))
    }

    fn run_episode(&mut self, episode: usize) -> Result<EpisodeRun> {
        let budget = self.config.episode_budget()?;
        let interval = self.config.tick_interval();
        let mut state = self.arena.reset();
        let mut totals = SideRewards::default();
        let start = self.clock.now();

        loop {
            if self.cancel.is_cancelled() {
                return Ok(EpisodeRun::Cancelled {
                    ticks: self.arena.t,
                });
            }

            let red_action = self.red.act(&state)?;
            let blue_action = self.blue.act(&state)?;
            let step = self.arena.step(red_action, blue_action);

            self.red.remember(Transition {
                state,
                action: red_action,
                reward: step.reward_red,
                next_state: step.observation,
                done: step.done,
            });
            self.blue.remember(Transition {
                state,
                action: blue_action,
                reward: step.reward_blue,
                next_state: step.observation,
                done: step.done,
            });

            totals.red += step.reward_red;
            totals.blue += step.reward_blue;
            self.renderer
                .render(episode, round2(totals.red), round2(totals.blue));
            if let Some(interval) = interval {
                thread::sleep(interval);
            }
            state = step.observation;

            let elapsed = self.clock.now().saturating_sub(start);
            let end = match step.events.scorer {
                Some(scorer) if step.done => Some(EpisodeEnd::Goal(scorer)),
                _ if elapsed >= budget => Some(EpisodeEnd::Timeout),
                _ => None,
            };
            if let Some(end) = end {
                return Ok(EpisodeRun::Finished {
                    totals,
                    ticks: step.tick,
                    end,
                });
            }
        }
    }

    /// EPISODE_END: learn, sync targets, track best scores.
    fn finish_episode(
        &mut self,
        episode: usize,
        totals: SideRewards,
        ticks: u64,
        end: EpisodeEnd,
    ) -> Result<EpisodeSummary> {
        for side in Side::all() {
            let agent = self.agent_mut(side);
            if agent.replay()?.is_none() {
                debug!(%side, buffered = agent.memory().len(), "not enough experience to learn");
            }
            agent.end_of_episode_sync()?;
        }

        let mut improved = Vec::new();
        for side in Side::all() {
            if self.best.update(side, totals[side]) {
                self.store
                    .save_weights(side, WeightSlot::Best, self.agent(side).policy())?;
                info!(%side, score = totals[side], "new best score");
                improved.push(side);
            }
        }
        self.store.save_best_scores(&self.best)?;

        let summary = EpisodeSummary {
            episode,
            reward_red: totals.red,
            reward_blue: totals.blue,
            ticks,
            end,
            epsilon_red: self.red.epsilon(),
            epsilon_blue: self.blue.epsilon(),
            improved,
        };
        info!(
            episode,
            red = round2(summary.reward_red),
            blue = round2(summary.reward_blue),
            ticks,
            end = %end,
            epsilon_red = summary.epsilon_red,
            epsilon_blue = summary.epsilon_blue,
            "episode finished"
        );
        Ok(summary)
    }

    /// Latest weights, ε and best scores for both sides.
    fn persist_progress(&self) -> Result<()> {
        for side in Side::all() {
            let agent = self.agent(side);
            self.store
                .save_weights(side, WeightSlot::Latest, agent.policy())?;
            self.store.save_scalar_state(side, &agent.scalar_state())?;
        }
        self.store.save_best_scores(&self.best)
    }

    fn shutdown(&self, last: Option<&EpisodeSummary>) -> Result<()> {
        for side in Side::all() {
            let agent = self.agent(side);
            self.store
                .save_weights(side, WeightSlot::Latest, agent.policy())?;
            self.store.save_scalar_state(side, &agent.scalar_state())?;
        }
        self.store
            .save_metrics(&TrainingMetrics::from_last(&self.run_id, last))?;
        info!(run_id = %self.run_id, "training finished");
        Ok(())
    }

    fn outcome(&self, history: Vec<EpisodeSummary>, cancelled: bool) -> TrainingOutcome {
        TrainingOutcome {
            run_id: self.run_id.clone(),
            episodes_completed: history.len(),
            cancelled,
            history,
        }
    }

    /// The agent playing `side`.
    pub fn agent(&self, side: Side) -> &DqnAgent<E> {
        match side {
            Side::Red => &self.red,
            Side::Blue => &self.blue,
        }
    }

    fn agent_mut(&mut self, side: Side) -> &mut DqnAgent<E> {
        match side {
            Side::Red => &mut self.red,
            Side::Blue => &mut self.blue,
        }
    }

    /// Current orchestrator phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Identifier written to the metrics document.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Best episode totals seen so far, including restored ones.
    pub fn best_scores(&self) -> BestScores {
        self.best
    }

    /// Arena as left by the last tick.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Backing persistence store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The validated run configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }
}

/// Seeded random source for one side: `seed` for red, `seed + 1` for blue.
pub fn side_rng(seed: Option<u64>, side: Side) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(side as u64)),
        None => StdRng::from_entropy(),
    }
}

/// Builds a red/blue pair of linear agents from `config`.
pub fn linear_agents(
    config: &TrainingConfig,
) -> Result<(DqnAgent<LinearEstimator>, DqnAgent<LinearEstimator>)> {
    let build = |side: Side| {
        let mut rng = side_rng(config.seed, side);
        let lr = config.agent.learning_rate;
        let (dim, actions) = (ArenaConfig::STATE_DIM, ArenaConfig::ACTION_COUNT);
        let policy = LinearEstimator::random(dim, actions, lr, &mut rng);
        let target = LinearEstimator::random(dim, actions, lr, &mut rng);
        DqnAgent::new(side, policy, target, config.agent.clone(), rng)
    };
    Ok((build(Side::Red)?, build(Side::Blue)?))
}

/// Builds a red/blue pair of MLP agents on `device`.
#[cfg(feature = "rl-nn")]
pub fn network_agents(
    config: &TrainingConfig,
    device: tch::Device,
) -> Result<(DqnAgent<crate::dqn::QNetwork>, DqnAgent<crate::dqn::QNetwork>)> {
    use crate::dqn::QNetwork;

    if let Some(seed) = config.seed {
        tch::manual_seed(seed as i64);
    }
    let build = |side: Side| {
        let lr = config.agent.learning_rate;
        let (dim, actions) = (ArenaConfig::STATE_DIM, ArenaConfig::ACTION_COUNT);
        let policy = QNetwork::new(dim, actions, lr, device)?;
        let target = QNetwork::new(dim, actions, lr, device)?;
        DqnAgent::new(side, policy, target, config.agent.clone(), side_rng(config.seed, side))
    };
    Ok((build(Side::Red)?, build(Side::Blue)?))
}
