//! Error type shared by the arena, the learning loop and the persistence store.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while training or persisting.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Filesystem access failed.
    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persisted document exists but cannot be parsed.
    #[error("document at {path:?} is corrupt: {message}")]
    CorruptDocument { path: PathBuf, message: String },

    /// A vector or parameter set has the wrong length.
    #[error("shape mismatch in {context}: expected {expected} values, got {got}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },

    /// Two estimators cannot be blended into one another.
    #[error("estimators have incompatible parameter layouts")]
    IncompatibleParameters,

    /// A configuration value is out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// The libtorch backend failed.
    #[cfg(feature = "rl-nn")]
    #[error("torch error: {0}")]
    Torch(#[from] tch::TchError),
}

impl Error {
    /// Wraps an I/O failure with the operation that caused it.
    pub(crate) fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Checks that a slice has the expected length.
    pub(crate) fn check_len(context: &'static str, expected: usize, got: usize) -> Result<()> {
        if expected == got {
            Ok(())
        } else {
            Err(Error::ShapeMismatch {
                context,
                expected,
                got,
            })
        }
    }
}
