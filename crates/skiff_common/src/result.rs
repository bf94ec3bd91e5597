//! Common result and error types for the Skiff driver.

/// The standard result type for operations that can only fail because of a
/// driver bug.
///
/// `Err` indicates a violated internal invariant (an action kind with no
/// invocation rule, a batch built from incompatible jobs), never a problem
/// with the user's input. User-facing problems are reported through
/// [`DiagnosticSink`](https://docs.rs/skiff_diagnostics) instead.
pub type SkiffResult<T> = Result<T, InternalError>;

/// An internal driver error indicating a bug in Skiff, not a user input problem.
///
/// Construction must stop when one of these is raised: a job built on top of
/// a broken invariant produces wrong binaries, not merely wrong diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal driver error: {message}")]
pub struct InternalError {
    /// Description of the violated invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Creates the error raised when a rule exists only in platform
    /// specializations and the active platform has none.
    pub fn not_implemented(what: impl std::fmt::Display) -> Self {
        Self::new(format!("{what} is not implemented for this toolchain"))
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
