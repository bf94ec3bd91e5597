//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Errors that can occur when loading or validating a `skiff.toml` configuration.
///
/// Validation errors name the table and key they guard, so the message can be
/// matched against the file directly.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// The file that was looked up.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("skiff.toml is not valid TOML: {0}")]
    Parse(String),

    /// A required key is missing or empty.
    #[error("skiff.toml: `{key}` in [{section}] is required")]
    MissingKey {
        /// The table the key belongs to.
        section: &'static str,
        /// The key itself.
        key: &'static str,
    },

    /// A key is present but its value is unusable.
    #[error("skiff.toml: `{key}` in [{section}] {reason}")]
    InvalidValue {
        /// The table the key belongs to.
        section: &'static str,
        /// The key itself.
        key: &'static str,
        /// What is wrong with the value.
        reason: String,
    },
}

impl ConfigError {
    /// The `[section]` and key the error refers to, if it is about one key.
    pub fn key(&self) -> Option<(&'static str, &'static str)> {
        match self {
            ConfigError::MissingKey { section, key }
            | ConfigError::InvalidValue { section, key, .. } => Some((*section, *key)),
            ConfigError::Read { .. } | ConfigError::Parse(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_names_its_table() {
        let err = ConfigError::MissingKey {
            section: "toolchain",
            key: "target",
        };
        assert_eq!(format!("{err}"), "skiff.toml: `target` in [toolchain] is required");
        assert_eq!(err.key(), Some(("toolchain", "target")));
    }

    #[test]
    fn invalid_value_carries_reason() {
        let err = ConfigError::InvalidValue {
            section: "batch",
            key: "size_limit",
            reason: "must be at least 1".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "skiff.toml: `size_limit` in [batch] must be at least 1"
        );
    }

    #[test]
    fn parse_error_has_no_key() {
        let err = ConfigError::Parse("expected '=' at line 3".to_string());
        assert_eq!(
            format!("{err}"),
            "skiff.toml is not valid TOML: expected '=' at line 3"
        );
        assert!(err.key().is_none());
    }

    #[test]
    fn read_error_names_the_file() {
        let err = ConfigError::Read {
            path: PathBuf::from("/work/app/skiff.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        assert_eq!(
            format!("{err}"),
            "failed to read /work/app/skiff.toml: file not found"
        );
    }
}
