//! Capability interface for action-value function approximators.

use std::path::Path;

use crate::error::Result;

/// An action-value function approximator.
///
/// The learning loop only ever needs the operations below; any numeric
/// backend that provides them can be plugged into a [`DqnAgent`].
///
/// Failures (shape mismatch, backend errors) are returned, never swallowed.
///
/// [`DqnAgent`]: super::agent::DqnAgent
pub trait QEstimator {
    /// File extension used when persisting weights.
    const WEIGHTS_EXTENSION: &'static str;

    /// Length of the vectors returned by [`predict`](Self::predict).
    fn action_count(&self) -> usize;

    /// Q-value for every action in `state`.
    fn predict(&self, state: &[f64]) -> Result<Vec<f64>>;

    /// One gradient step pulling `predict(state)` toward `target`.
    fn fit(&mut self, state: &[f64], target: &[f64]) -> Result<()>;

    /// Persists all trainable parameters to `path`.
    fn save(&self, path: &Path) -> Result<()>;

    /// Restores all trainable parameters from `path`.
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Flattened copy of each parameter tensor, in a stable order.
    fn parameters(&self) -> Result<Vec<Vec<f64>>>;

    /// `self := tau·source + (1 − tau)·self`, parameter by parameter.
    fn blend_from(&mut self, source: &Self, tau: f64) -> Result<()>;
}

/// Index of the largest value, first index on ties. `None` for an empty slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Largest value, `None` for an empty slice.
pub fn max_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), Some(1));
        assert_eq!(argmax(&[5.0, 5.0]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn argmax_handles_negatives() {
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), Some(1));
    }

    #[test]
    fn max_value_of_slice() {
        assert_eq!(max_value(&[0.5, -2.0, 1.5]), Some(1.5));
        assert_eq!(max_value(&[]), None);
    }
}
