//! Time sources for the episode budget.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time since an arbitrary origin.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Simulated clock that advances by a fixed step on every read.
///
/// The orchestrator reads the clock once at episode start and once per tick,
/// so with step `s` an episode with budget `b` times out after `ceil(b / s)`
/// ticks regardless of host speed.
#[derive(Debug)]
pub struct SteppingClock {
    step: Duration,
    reads: Cell<u32>,
}

impl SteppingClock {
    /// Starts at zero and advances `step` per read.
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            reads: Cell::new(0),
        }
    }

    /// One step per tick at `hz` ticks per second.
    pub fn at_rate(hz: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / hz.max(1) as f64))
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Duration {
        let n = self.reads.get();
        self.reads.set(n.saturating_add(1));
        self.step * n
    }
}
