//! Collecting diagnostics while jobs are planned, possibly from rayon workers.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
struct Collected {
    diagnostics: Vec<Diagnostic>,
    seen: HashSet<(DiagnosticCode, Option<String>)>,
    errors: usize,
    warnings: usize,
}

/// Thread-safe collector of planning diagnostics.
///
/// A diagnostic is reported once per code and subject: an input named twice
/// on the command line, or `--sanitize address,address`, warns once. Counts
/// survive [`take_all`](DiagnosticSink::take_all) so the summary line can be
/// printed after rendering.
pub struct DiagnosticSink {
    inner: Mutex<Collected>,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Collected::default()),
        }
    }

    /// Records `diag` unless one with the same code and subject was already
    /// recorded. Returns `true` if it was recorded.
    pub fn emit(&self, diag: Diagnostic) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if !inner.seen.insert((diag.code, diag.subject.clone())) {
            return false;
        }
        match diag.severity {
            Severity::Error => inner.errors += 1,
            Severity::Warning => inner.warnings += 1,
        }
        inner.diagnostics.push(diag);
        true
    }

    /// Returns `true` if any error was recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Number of errors recorded so far.
    pub fn error_count(&self) -> usize {
        self.inner.lock().unwrap().errors
    }

    /// Number of warnings recorded so far.
    pub fn warning_count(&self) -> usize {
        self.inner.lock().unwrap().warnings
    }

    /// `"1 error, 2 warnings"`.
    pub fn summary(&self) -> String {
        let inner = self.inner.lock().unwrap();
        format!(
            "{}, {}",
            Severity::Error.count_label(inner.errors),
            Severity::Warning.count_label(inner.warnings)
        )
    }

    /// Drains every recorded diagnostic, errors first, each severity in
    /// emission order.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        let mut inner = self.inner.lock().unwrap();
        let mut diagnostics = std::mem::take(&mut inner.diagnostics);
        diagnostics.sort_by_key(|d| std::cmp::Reverse(d.severity));
        diagnostics
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}
