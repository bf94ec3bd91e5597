//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ToolchainConfig;
use std::path::Path;

/// File name looked up inside a project directory.
pub const CONFIG_FILE_NAME: &str = "skiff.toml";

/// Loads and validates a configuration file.
///
/// `path` may name the file itself or a directory containing `skiff.toml`.
pub fn load_config(path: &Path) -> Result<ToolchainConfig, ConfigError> {
    let config_path = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ToolchainConfig, ConfigError> {
    let config: ToolchainConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ToolchainConfig) -> Result<(), ConfigError> {
    if config.toolchain.target.trim().is_empty() {
        return Err(ConfigError::MissingKey {
            section: "toolchain",
            key: "target",
        });
    }
    if config.toolchain.driver.as_os_str().is_empty() {
        return Err(ConfigError::MissingKey {
            section: "toolchain",
            key: "driver",
        });
    }
    if config.toolchain.target.split('-').count() < 2 {
        return Err(ConfigError::InvalidValue {
            section: "toolchain",
            key: "target",
            reason: format!(
                "'{}' is not a triple such as x86_64-unknown-linux-gnu",
                config.toolchain.target
            ),
        });
    }
    if config.batch.size_limit == 0 {
        return Err(ConfigError::InvalidValue {
            section: "batch",
            key: "size_limit",
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}
