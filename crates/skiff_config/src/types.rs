//! Configuration types deserialized from `skiff.toml`.

use serde::Deserialize;
use std::path::PathBuf;

/// The top-level configuration parsed from `skiff.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolchainConfig {
    /// Target and tool locations.
    pub toolchain: ToolchainSection,
    /// Temporary file policy.
    #[serde(default)]
    pub temps: TempsConfig,
    /// Batch-mode tuning.
    #[serde(default)]
    pub batch: BatchConfig,
}

/// The `[toolchain]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolchainSection {
    /// Target triple, e.g. `x86_64-unknown-linux-gnu`.
    pub target: String,
    /// Path of the driver/frontend binary. Tools are searched for next to it.
    pub driver: PathBuf,
    /// Runtime resource directory. Defaults to `<driver dir>/../lib/swift`.
    #[serde(default)]
    pub resource_dir: Option<PathBuf>,
    /// SDK root passed to the frontend and the linker.
    #[serde(default)]
    pub sdk: Option<PathBuf>,
}

impl ToolchainSection {
    /// Returns the configured resource directory or the one derived from the
    /// driver location.
    pub fn resolved_resource_dir(&self) -> PathBuf {
        if let Some(dir) = &self.resource_dir {
            return dir.clone();
        }
        let bin_dir = self
            .driver
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        bin_dir.join("..").join("lib").join("swift")
    }
}

/// The `[temps]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TempsConfig {
    /// Directory for temporary files. Defaults to the system temp directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Keep temporary files after the jobs referencing them are dropped.
    #[serde(default)]
    pub save: bool,
}

impl TempsConfig {
    /// Returns the configured directory or the system temporary directory.
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Default upper bound on primaries per batch job.
pub const DEFAULT_BATCH_SIZE_LIMIT: usize = 25;

fn default_batch_size_limit() -> usize {
    DEFAULT_BATCH_SIZE_LIMIT
}

/// The `[batch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Whether compile jobs are combined into batch jobs.
    #[serde(default)]
    pub enabled: bool,
    /// Maximum number of primary inputs in one batch job.
    #[serde(default = "default_batch_size_limit")]
    pub size_limit: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            size_limit: DEFAULT_BATCH_SIZE_LIMIT,
        }
    }
}
