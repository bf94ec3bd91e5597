//! Diagnostic codes with category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Invalid driver input (bad files, bad configuration), prefixed with `E`.
    Error,
    /// Degraded but usable plans, prefixed with `W`.
    Warning,
    /// Toolchain problems such as missing tools, prefixed with `D`.
    Driver,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Driver => 'D',
        }
    }
}

/// A category prefix plus a numeric identifier, displayed as e.g. `D001`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// A required tool could not be located.
    pub const TOOL_NOT_FOUND: DiagnosticCode = DiagnosticCode::new(Category::Driver, 1);
    /// An input file has an extension the driver does not recognize.
    pub const UNKNOWN_INPUT_TYPE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 101);
    /// A requested sanitizer has no runtime library and was disabled.
    pub const SANITIZER_UNAVAILABLE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 102);

    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Error.prefix(), 'E');
        assert_eq!(Category::Warning.prefix(), 'W');
        assert_eq!(Category::Driver.prefix(), 'D');
    }

    #[test]
    fn display_format() {
        assert_eq!(format!("{}", DiagnosticCode::TOOL_NOT_FOUND), "D001");
        assert_eq!(format!("{}", DiagnosticCode::new(Category::Error, 42)), "E042");
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::UNKNOWN_INPUT_TYPE;
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
