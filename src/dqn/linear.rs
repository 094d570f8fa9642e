//! Pure-Rust linear action-value estimator.
//!
//! `Q(s) = W·s + b`, trained with plain SGD on squared error. Small and
//! deterministic, so the learning loop runs without libtorch.

use std::fs;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::estimator::QEstimator;
use crate::error::{Error, Result};

/// Linear Q-value estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearEstimator {
    state_dim: usize,
    action_count: usize,
    learning_rate: f64,
    /// Row-major `action_count × state_dim`.
    weights: Vec<f64>,
    bias: Vec<f64>,
}

impl LinearEstimator {
    /// Creates an estimator with all parameters at zero.
    pub fn zeros(state_dim: usize, action_count: usize, learning_rate: f64) -> Self {
        Self {
            state_dim,
            action_count,
            learning_rate,
            weights: vec![0.0; state_dim * action_count],
            bias: vec![0.0; action_count],
        }
    }

    /// Creates an estimator with weights drawn uniformly from `±1/√state_dim`.
    pub fn random<R: Rng + ?Sized>(
        state_dim: usize,
        action_count: usize,
        learning_rate: f64,
        rng: &mut R,
    ) -> Self {
        let bound = 1.0 / (state_dim.max(1) as f64).sqrt();
        let mut est = Self::zeros(state_dim, action_count, learning_rate);
        for w in est.weights.iter_mut() {
            *w = rng.gen_range(-bound..bound);
        }
        est
    }

    /// Length of the states this estimator accepts.
    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    fn row(&self, action: usize) -> &[f64] {
        &self.weights[action * self.state_dim..(action + 1) * self.state_dim]
    }
}

impl QEstimator for LinearEstimator {
    const WEIGHTS_EXTENSION: &'static str = "json";

    fn action_count(&self) -> usize {
        self.action_count
    }

    fn predict(&self, state: &[f64]) -> Result<Vec<f64>> {
        Error::check_len("linear predict", self.state_dim, state.len())?;
        Ok((0..self.action_count)
            .map(|a| {
                self.row(a)
                    .iter()
                    .zip(state)
                    .map(|(w, s)| w * s)
                    .sum::<f64>()
                    + self.bias[a]
            })
            .collect())
    }

    fn fit(&mut self, state: &[f64], target: &[f64]) -> Result<()> {
        Error::check_len("linear fit target", self.action_count, target.len())?;
        let prediction = self.predict(state)?;
        let scale = 2.0 * self.learning_rate / self.action_count as f64;
        for a in 0..self.action_count {
            let err = prediction[a] - target[a];
            if err == 0.0 {
                continue;
            }
            let row = &mut self.weights[a * self.state_dim..(a + 1) * self.state_dim];
            for (w, s) in row.iter_mut().zip(state) {
                *w -= scale * err * s;
            }
            self.bias[a] -= scale * err;
        }
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json).map_err(|e| Error::io(format!("write weights to {path:?}"), e))
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("read weights from {path:?}"), e))?;
        let loaded: LinearEstimator =
            serde_json::from_str(&text).map_err(|e| Error::CorruptDocument {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Error::check_len("linear load state_dim", self.state_dim, loaded.state_dim)?;
        Error::check_len("linear load action_count", self.action_count, loaded.action_count)?;
        Error::check_len("linear load weights", self.weights.len(), loaded.weights.len())?;
        Error::check_len("linear load bias", self.bias.len(), loaded.bias.len())?;
        self.weights = loaded.weights;
        self.bias = loaded.bias;
        Ok(())
    }

    fn parameters(&self) -> Result<Vec<Vec<f64>>> {
        Ok(vec![self.weights.clone(), self.bias.clone()])
    }

    fn blend_from(&mut self, source: &Self, tau: f64) -> Result<()> {
        if source.state_dim != self.state_dim || source.action_count != self.action_count {
            return Err(Error::IncompatibleParameters);
        }
        let pairs = self
            .weights
            .iter_mut()
            .zip(&source.weights)
            .chain(self.bias.iter_mut().zip(&source.bias));
        for (t, p) in pairs {
            *t = tau * p + (1.0 - tau) * *t;
        }
        Ok(())
    }
}
