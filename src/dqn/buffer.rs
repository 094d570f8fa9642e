//! Bounded FIFO experience buffer.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::arena::Observation;

/// A single recorded transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State the action was chosen in.
    pub state: Observation,
    /// Action index taken.
    pub action: usize,
    /// Reward received for this agent.
    pub reward: f64,
    /// State after the step.
    pub next_state: Observation,
    /// Whether the step ended the episode.
    pub done: bool,
}

/// Experience buffer that keeps the most recent `capacity` transitions.
///
/// Once full, every insert evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    capacity: usize,
    transitions: VecDeque<Transition>,
}

impl ReplayBuffer {
    /// Creates an empty buffer.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            transitions: VecDeque::with_capacity(capacity.min(4096)),
        }
    }

    /// Adds a transition, evicting the oldest one if over capacity.
    pub fn remember(&mut self, transition: Transition) {
        self.transitions.push_back(transition);
        if self.transitions.len() > self.capacity {
            self.transitions.pop_front();
        }
    }

    /// Draws `n` distinct transitions uniformly at random.
    ///
    /// Returns fewer than `n` only if the buffer holds fewer.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<&Transition> {
        let amount = n.min(self.transitions.len());
        rand::seq::index::sample(rng, self.transitions.len(), amount)
            .into_iter()
            .map(|i| &self.transitions[i])
            .collect()
    }

    /// Iterates oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    /// Maximum number of transitions kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of transitions held.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Whether no transition is held.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Drops every transition; the capacity is unchanged.
    pub fn clear(&mut self) {
        self.transitions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn transition(reward: f64) -> Transition {
        Transition {
            state: Observation([0.0; 8]),
            action: 0,
            reward,
            next_state: Observation([0.0; 8]),
            done: false,
        }
    }

    #[test]
    fn buffer_add_and_clear() {
        let mut buf = ReplayBuffer::new(10);
        assert!(buf.is_empty());
        buf.remember(transition(1.0));
        assert_eq!(buf.len(), 1);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 10);
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let capacity = 100;
        let extra = 37;
        let mut buf = ReplayBuffer::new(capacity);
        for i in 0..capacity + extra {
            buf.remember(transition(i as f64));
            assert!(buf.len() <= capacity);
        }
        assert_eq!(buf.len(), buf.capacity());
        let rewards: Vec<f64> = buf.iter().map(|t| t.reward).collect();
        let expected: Vec<f64> = (extra..capacity + extra).map(|i| i as f64).collect();
        assert_eq!(rewards, expected);
    }

    #[test]
    fn sample_draws_without_replacement() {
        let mut buf = ReplayBuffer::new(64);
        for i in 0..64 {
            buf.remember(transition(i as f64));
        }
        let mut rng = StdRng::seed_from_u64(7);
        let batch = buf.sample(&mut rng, 64);
        let mut rewards: Vec<i64> = batch.iter().map(|t| t.reward as i64).collect();
        rewards.sort_unstable();
        assert_eq!(rewards, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn sample_is_reproducible_with_seed() {
        let mut buf = ReplayBuffer::new(500);
        for i in 0..500 {
            buf.remember(transition(i as f64));
        }
        let a: Vec<f64> = buf
            .sample(&mut StdRng::seed_from_u64(3), 16)
            .iter()
            .map(|t| t.reward)
            .collect();
        let b: Vec<f64> = buf
            .sample(&mut StdRng::seed_from_u64(3), 16)
            .iter()
            .map(|t| t.reward)
            .collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }
}
