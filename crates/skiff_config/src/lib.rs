//! Parsing and validation of `skiff.toml` toolchain configuration files.
//!
//! The configuration names the target triple, where the driver and its
//! resources live, how temporary files are handled, and how batch mode is
//! tuned. It produces a strongly-typed [`ToolchainConfig`].

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
