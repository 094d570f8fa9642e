//! Persistence port for training progress, and its filesystem adapter.
//!
//! Loads distinguish "absent" (`Ok(None)`) from "present but unreadable"
//! (`Err`); the orchestrator decides the fallback for each resource.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::metrics::TrainingMetrics;
use crate::arena::Side;
use crate::dqn::{AgentScalarState, QEstimator};
use crate::error::{Error, Result};

/// Which copy of an agent's weights to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightSlot {
    /// Most recent weights.
    Latest,
    /// Weights from the episode with the best cumulative reward.
    Best,
}

/// Best cumulative episode reward per side.
///
/// Non-finite scores (the −∞ starting value) are stored as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestScores {
    #[serde(with = "score", default = "score::floor")]
    pub best_red_score: f64,
    #[serde(with = "score", default = "score::floor")]
    pub best_blue_score: f64,
}

impl BestScores {
    /// Best score for `side`.
    pub fn get(&self, side: Side) -> f64 {
        match side {
            Side::Red => self.best_red_score,
            Side::Blue => self.best_blue_score,
        }
    }

    /// Records `total` if it beats the current best. Returns whether it did.
    pub fn update(&mut self, side: Side, total: f64) -> bool {
        let best = match side {
            Side::Red => &mut self.best_red_score,
            Side::Blue => &mut self.best_blue_score,
        };
        if total > *best {
            *best = total;
            true
        } else {
            false
        }
    }
}

impl Default for BestScores {
    fn default() -> Self {
        Self {
            best_red_score: f64::NEG_INFINITY,
            best_blue_score: f64::NEG_INFINITY,
        }
    }
}

mod score {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn floor() -> f64 {
        f64::NEG_INFINITY
    }

    pub fn serialize<S: Serializer>(value: &f64, s: S) -> std::result::Result<S::Ok, S::Error> {
        if value.is_finite() {
            s.serialize_f64(*value)
        } else {
            s.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or_else(floor))
    }
}

/// Durable storage for weights, scalar agent state, best scores and metrics.
pub trait TrainingStore {
    /// Persists `estimator`'s parameters into `slot` for `side`.
    fn save_weights<E: QEstimator>(&self, side: Side, slot: WeightSlot, estimator: &E) -> Result<()>;

    /// Loads weights into `estimator`. Returns `false` if none are stored.
    fn load_weights<E: QEstimator>(
        &self,
        side: Side,
        slot: WeightSlot,
        estimator: &mut E,
    ) -> Result<bool>;

    /// Persists the scalar agent state (ε) for `side`.
    fn save_scalar_state(&self, side: Side, state: &AgentScalarState) -> Result<()>;

    /// Scalar agent state for `side`, `None` if never saved.
    fn load_scalar_state(&self, side: Side) -> Result<Option<AgentScalarState>>;

    /// Persists both sides' best scores.
    fn save_best_scores(&self, scores: &BestScores) -> Result<()>;

    /// Best scores, `None` if never saved.
    fn load_best_scores(&self) -> Result<Option<BestScores>>;

    /// Writes the end-of-run metrics document.
    fn save_metrics(&self, metrics: &TrainingMetrics) -> Result<()>;
}

/// Stores everything as files in one directory.
///
/// Layout:
/// ```text
/// {side}_agent.weights.{ext}   latest weights
/// best_{side}.weights.{ext}    best-episode weights
/// {side}_agent_state.json      {"epsilon": ...}
/// best_scores.json             {"best_red_score": ..., "best_blue_score": ...}
/// training_metrics.json        written once at shutdown
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Store rooted at `root`; the directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding every document.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Weights file for `side` and `slot` with the estimator's `extension`.
    pub fn weights_path(&self, side: Side, slot: WeightSlot, extension: &str) -> PathBuf {
        let name = match slot {
            WeightSlot::Latest => format!("{side}_agent.weights.{extension}"),
            WeightSlot::Best => format!("best_{side}.weights.{extension}"),
        };
        self.root.join(name)
    }

    /// Scalar state document for `side`.
    pub fn scalar_state_path(&self, side: Side) -> PathBuf {
        self.root.join(format!("{side}_agent_state.json"))
    }

    /// Best scores document.
    pub fn best_scores_path(&self) -> PathBuf {
        self.root.join("best_scores.json")
    }

    /// End-of-run metrics document.
    pub fn metrics_path(&self) -> PathBuf {
        self.root.join("training_metrics.json")
    }

    fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| Error::io(format!("create store directory {:?}", self.root), e))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T, pretty: bool) -> Result<()> {
        self.ensure_root()?;
        let bytes = if pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        fs::write(path, bytes).map_err(|e| Error::io(format!("write {path:?}"), e))
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let text =
            fs::read_to_string(path).map_err(|e| Error::io(format!("read {path:?}"), e))?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| Error::CorruptDocument {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }
}

impl TrainingStore for FileStore {
    fn save_weights<E: QEstimator>(&self, side: Side, slot: WeightSlot, estimator: &E) -> Result<()> {
        self.ensure_root()?;
        estimator.save(&self.weights_path(side, slot, E::WEIGHTS_EXTENSION))
    }

    fn load_weights<E: QEstimator>(
        &self,
        side: Side,
        slot: WeightSlot,
        estimator: &mut E,
    ) -> Result<bool> {
        let path = self.weights_path(side, slot, E::WEIGHTS_EXTENSION);
        if !path.exists() {
            return Ok(false);
        }
        estimator.load(&path)?;
        Ok(true)
    }

    fn save_scalar_state(&self, side: Side, state: &AgentScalarState) -> Result<()> {
        self.write_json(&self.scalar_state_path(side), state, false)
    }

    fn load_scalar_state(&self, side: Side) -> Result<Option<AgentScalarState>> {
        self.read_json(&self.scalar_state_path(side))
    }

    fn save_best_scores(&self, scores: &BestScores) -> Result<()> {
        self.write_json(&self.best_scores_path(), scores, false)
    }

    fn load_best_scores(&self) -> Result<Option<BestScores>> {
        self.read_json(&self.best_scores_path())
    }

    fn save_metrics(&self, metrics: &TrainingMetrics) -> Result<()> {
        self.write_json(&self.metrics_path(), metrics, true)
    }
}
