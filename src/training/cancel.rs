//! Cooperative cancellation, polled once per tick by the orchestrator.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Source of a stop request.
pub trait CancelSource {
    /// Whether the run should stop at the next tick.
    fn is_cancelled(&self) -> bool;
}

/// Shared flag that any thread can raise.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag for every clone.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl CancelSource for CancelToken {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cancels once the given path exists, e.g. after `touch STOP`.
#[derive(Debug, Clone)]
pub struct StopFile {
    path: PathBuf,
}

impl StopFile {
    /// Watches `path`; it does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CancelSource for StopFile {
    fn is_cancelled(&self) -> bool {
        self.path.exists()
    }
}

/// Never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl CancelSource for Never {
    fn is_cancelled(&self) -> bool {
        false
    }
}
