//! Error types for job construction.

use skiff_common::InternalError;
use std::path::PathBuf;

/// The result type for fallible job construction operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors surfaced by the toolchain.
///
/// [`DriverError::Internal`] is a driver bug and must abort the compilation.
/// The remaining variants describe the environment (a missing tool, an
/// unwritable temporary directory) and are reported to the user.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A violated internal invariant.
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// An executable could not be located.
    #[error("unable to find tool '{name}'")]
    ToolNotFound {
        /// The executable name that was searched for.
        name: String,
    },

    /// Reserving or writing an auxiliary file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path being reserved or written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An output file map could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

impl DriverError {
    /// Shorthand for an internal error with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        DriverError::Internal(InternalError::new(message))
    }

    /// Returns `true` if this error is a driver bug rather than an
    /// environment problem.
    pub fn is_internal(&self) -> bool {
        matches!(self, DriverError::Internal(_))
    }
}
