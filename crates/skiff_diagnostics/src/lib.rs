//! User-facing diagnostics for the Skiff driver.
//!
//! Structured [`Diagnostic`] messages carry a severity, a code, and optional
//! notes. The thread-safe [`DiagnosticSink`] accumulates them while jobs are
//! planned in parallel, and a [`DiagnosticRenderer`] formats them for a
//! terminal or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
