//! How seriously a diagnostic affects the plan.

use crate::code::{Category, DiagnosticCode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the driver could still produce runnable jobs.
///
/// `Warning < Error`; the sink drains errors first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The plan was degraded (an input relinked as an object, a sanitizer
    /// dropped) but every job is runnable.
    Warning,
    /// At least one job could not be built.
    Error,
}

impl Severity {
    /// The severity diagnostics of `code`'s category are reported at.
    /// Only `W` codes are warnings.
    pub fn of(code: DiagnosticCode) -> Self {
        match code.category {
            Category::Warning => Severity::Warning,
            Category::Error | Category::Driver => Severity::Error,
        }
    }

    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// `"1 warning"`, `"3 errors"`: a count for the end-of-plan summary.
    pub fn count_label(self, count: usize) -> String {
        let plural = if count == 1 { "" } else { "s" };
        format!("{count} {self}{plural}")
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}
