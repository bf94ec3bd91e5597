//! Resolving the toolchain settings from `skiff.toml` and command-line flags.

use std::path::{Path, PathBuf};

use skiff_config::{ToolchainConfig, CONFIG_FILE_NAME, DEFAULT_BATCH_SIZE_LIMIT};

use crate::{GlobalArgs, PlanArgs};

/// Everything `skiff plan` needs to know about the toolchain.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Target triple.
    pub target: String,
    /// Path of the driver binary.
    pub driver: PathBuf,
    /// Explicit runtime resource directory.
    pub resource_dir: Option<PathBuf>,
    /// SDK root.
    pub sdk: Option<PathBuf>,
    /// Directory for temporary files.
    pub temp_dir: PathBuf,
    /// Keep temporary files after planning.
    pub save_temps: bool,
    /// Maximum primaries per batch job.
    pub batch_size: usize,
}

/// Finds the configuration file to use: `--config` if given, otherwise
/// `skiff.toml` in `cwd` if it exists.
fn config_path(global: &GlobalArgs, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = &global.config {
        return Some(PathBuf::from(path));
    }
    let candidate = cwd.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

impl Settings {
    /// Merges the configuration file (if any) with command-line overrides.
    ///
    /// Flags win over the file. Without a file, `--target` and `--driver` are
    /// required.
    pub fn resolve(
        args: &PlanArgs,
        global: &GlobalArgs,
        cwd: &Path,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match config_path(global, cwd) {
            Some(path) => Some(skiff_config::load_config(&path)?),
            None => None,
        };
        Self::merge(config.as_ref(), args)
    }

    fn merge(
        config: Option<&ToolchainConfig>,
        args: &PlanArgs,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let target = args
            .target
            .clone()
            .or_else(|| config.map(|c| c.toolchain.target.clone()))
            .ok_or("no target configured: pass --target or provide skiff.toml")?;
        let driver = args
            .driver
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| config.map(|c| c.toolchain.driver.clone()))
            .ok_or("no driver configured: pass --driver or provide skiff.toml")?;
        let sdk = args
            .sdk
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| config.and_then(|c| c.toolchain.sdk.clone()));
        let resource_dir = config.and_then(|c| c.toolchain.resource_dir.clone());
        let temp_dir = config
            .map(|c| c.temps.resolved_dir())
            .unwrap_or_else(std::env::temp_dir);
        let save_temps = args.write_filelists || config.is_some_and(|c| c.temps.save);
        let batch_size = args
            .batch_size
            .or_else(|| config.map(|c| c.batch.size_limit))
            .unwrap_or(DEFAULT_BATCH_SIZE_LIMIT);
        if batch_size == 0 {
            return Err("--batch-size must be positive".into());
        }

        Ok(Self {
            target,
            driver,
            resource_dir,
            sdk,
            temp_dir,
            save_temps,
            batch_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use clap::Parser;

    fn plan_args(extra: &[&str]) -> PlanArgs {
        let mut argv = vec!["skiff", "plan", "main.swift"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            crate::Command::Plan(args) => args,
        }
    }

    fn global(config: Option<&str>) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: config.map(str::to_string),
        }
    }

    #[test]
    fn flags_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let args = plan_args(&[
            "--target",
            "x86_64-unknown-linux-gnu",
            "--driver",
            "/usr/bin/swift",
        ]);
        let settings = Settings::resolve(&args, &global(None), dir.path()).unwrap();
        assert_eq!(settings.target, "x86_64-unknown-linux-gnu");
        assert_eq!(settings.driver, PathBuf::from("/usr/bin/swift"));
        assert_eq!(settings.batch_size, DEFAULT_BATCH_SIZE_LIMIT);
        assert!(!settings.save_temps);
    }

    #[test]
    fn missing_target_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = plan_args(&["--driver", "/usr/bin/swift"]);
        let err = Settings::resolve(&args, &global(None), dir.path()).unwrap_err();
        assert!(err.to_string().contains("no target configured"));
    }

    #[test]
    fn config_in_working_directory_is_used() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
[toolchain]
target = "arm64-apple-macosx13.0"
driver = "/opt/swift/usr/bin/swift"
sdk = "/sdk"

[temps]
dir = "/tmp/skiff"
save = true

[batch]
size_limit = 4
"#,
        )
        .unwrap();
        let args = plan_args(&["--batch-size", "2"]);
        let settings = Settings::resolve(&args, &global(None), dir.path()).unwrap();
        assert_eq!(settings.target, "arm64-apple-macosx13.0");
        assert_eq!(settings.sdk, Some(PathBuf::from("/sdk")));
        assert_eq!(settings.temp_dir, PathBuf::from("/tmp/skiff"));
        assert!(settings.save_temps);
        assert_eq!(settings.batch_size, 2);
    }

    #[test]
    fn flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[toolchain]\ntarget = \"x86_64-unknown-linux-gnu\"\ndriver = \"/usr/bin/swift\"\n",
        )
        .unwrap();
        let args = plan_args(&["--target", "aarch64-unknown-linux-gnu", "--write-filelists"]);
        let global = global(path.to_str());
        let settings = Settings::resolve(&args, &global, Path::new("/nonexistent")).unwrap();
        assert_eq!(settings.target, "aarch64-unknown-linux-gnu");
        assert_eq!(settings.driver, PathBuf::from("/usr/bin/swift"));
        assert!(settings.save_temps);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let args = plan_args(&[
            "--target",
            "x86_64-unknown-linux-gnu",
            "--driver",
            "/usr/bin/swift",
            "--batch-size",
            "0",
        ]);
        assert!(Settings::resolve(&args, &global(None), dir.path()).is_err());
    }
}
