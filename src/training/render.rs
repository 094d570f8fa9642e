//! Per-tick visualization hook.

use tracing::trace;

/// Receives the running episode score after every tick.
///
/// Scores are cumulative rewards rounded to two decimals.
pub trait Renderer {
    /// Called after each tick of `episode`.
    fn render(&mut self, episode: usize, score_red: f64, score_blue: f64);
}

/// Discards every frame. Used for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn render(&mut self, _episode: usize, _score_red: f64, _score_blue: f64) {}
}

/// Emits a `trace` event every `every` frames.
#[derive(Debug, Clone)]
pub struct TraceRenderer {
    every: u64,
    frames: u64,
}

impl TraceRenderer {
    /// `every` is clamped to at least one.
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            frames: 0,
        }
    }
}

impl Renderer for TraceRenderer {
    fn render(&mut self, episode: usize, score_red: f64, score_blue: f64) {
        self.frames += 1;
        if self.frames % self.every == 0 {
            trace!(episode, score_red, score_blue, "frame");
        }
    }
}

impl<F: FnMut(usize, f64, f64)> Renderer for F {
    fn render(&mut self, episode: usize, score_red: f64, score_blue: f64) {
        self(episode, score_red, score_blue)
    }
}
