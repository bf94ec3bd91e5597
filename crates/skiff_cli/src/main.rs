//! Skiff CLI: plans compiler-driver jobs for a set of inputs.
//!
//! `skiff plan` builds the action graph for the given files, turns every
//! action into a job with the configured toolchain, and prints the resulting
//! command lines as text or JSON. Nothing is executed.

#![warn(missing_docs)]

mod plan;
mod report;
mod settings;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use skiff_common::FileType;
use skiff_driver::{CompilerMode, LinkKind};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Skiff: a compiler driver job planner.
#[derive(Parser, Debug)]
#[command(name = "skiff", version, about = "Skiff compiler driver")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `skiff.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the jobs for a set of inputs and print them.
    Plan(PlanArgs),
}

/// Arguments for the `skiff plan` subcommand.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Input files. Their extension decides their type.
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// How sources are grouped into compile jobs.
    #[arg(short, long, value_enum, default_value_t = Mode::Standard)]
    pub mode: Mode,

    /// What each compile job produces.
    #[arg(short, long, value_enum, default_value_t = Emit::Object)]
    pub emit: Emit,

    /// Also produce a module for the sources.
    #[arg(long)]
    pub emit_module: bool,

    /// Link the compiled objects.
    #[arg(short, long, value_enum)]
    pub link: Option<LinkChoice>,

    /// Name of the module being built.
    #[arg(long, default_value = "main")]
    pub module_name: String,

    /// Maximum number of primaries per batch job. Overrides `skiff.toml`.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Target triple. Overrides `skiff.toml`.
    #[arg(long)]
    pub target: Option<String>,

    /// Path of the driver binary. Overrides `skiff.toml`.
    #[arg(long)]
    pub driver: Option<String>,

    /// SDK root. Overrides `skiff.toml`.
    #[arg(long)]
    pub sdk: Option<String>,

    /// Directory outputs are placed in.
    #[arg(short, long, default_value = ".")]
    pub output_dir: String,

    /// Emit debug info (and a dSYM bundle for Apple executables).
    #[arg(short = 'g', long)]
    pub debug: bool,

    /// Sanitizers to enable, e.g. `address`.
    #[arg(long, value_delimiter = ',')]
    pub sanitize: Vec<String>,

    /// Write every file list and response file to disk. Implies keeping
    /// temporary files.
    #[arg(long)]
    pub write_filelists: bool,

    /// Output format for the planned jobs.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// How sources are grouped into compile jobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// One compile job per source file.
    Standard,
    /// One compile job for the whole module.
    Wmo,
    /// One compile job per source file, then combined into batch jobs.
    Batch,
}

impl Mode {
    /// The compilation mode jobs are constructed in. Batch jobs are formed
    /// from standard compile jobs afterwards.
    pub fn compiler_mode(self) -> CompilerMode {
        match self {
            Mode::Standard | Mode::Batch => CompilerMode::StandardCompile,
            Mode::Wmo => CompilerMode::SingleCompile,
        }
    }
}

/// What each compile job produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// Native object files.
    Object,
    /// Native assembly.
    Assembly,
    /// LLVM bitcode.
    Bitcode,
    /// Textual LLVM IR.
    Ir,
    /// Canonical SIL.
    Sil,
    /// Type-check only.
    Typecheck,
}

impl Emit {
    /// The compiler output type for this choice.
    pub fn file_type(self) -> FileType {
        match self {
            Emit::Object => FileType::Object,
            Emit::Assembly => FileType::Assembly,
            Emit::Bitcode => FileType::LlvmBc,
            Emit::Ir => FileType::LlvmIr,
            Emit::Sil => FileType::Sil,
            Emit::Typecheck => FileType::Nothing,
        }
    }
}

/// The kind of image to link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LinkChoice {
    /// An executable.
    Executable,
    /// A shared library.
    Dylib,
    /// A static archive.
    Static,
}

impl LinkChoice {
    /// The driver's link kind for this choice.
    pub fn link_kind(self) -> LinkKind {
        match self {
            LinkChoice::Executable => LinkKind::Executable,
            LinkChoice::Dylib => LinkKind::DynamicLibrary,
            LinkChoice::Static => LinkKind::StaticLibrary,
        }
    }
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Output format for planned jobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// One command line per job.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var_os("TERM").is_some(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Plan(ref args) => plan::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the log subscriber. `RUST_LOG` wins; otherwise `--verbose`
/// shows debug events and `--quiet` only errors.
fn init_tracing(global: &GlobalArgs) {
    let level = if global.verbose {
        LevelFilter::DEBUG
    } else if global.quiet {
        LevelFilter::ERROR
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_plan_defaults() {
        let cli = Cli::parse_from(["skiff", "plan", "main.swift"]);
        match cli.command {
            Command::Plan(ref args) => {
                assert_eq!(args.inputs, vec!["main.swift"]);
                assert_eq!(args.mode, Mode::Standard);
                assert_eq!(args.emit, Emit::Object);
                assert!(args.link.is_none());
                assert_eq!(args.module_name, "main");
                assert!(args.batch_size.is_none());
                assert_eq!(args.format, ReportFormat::Text);
                assert!(!args.write_filelists);
                assert!(!args.debug);
            }
        }
    }

    #[test]
    fn parse_plan_with_args() {
        let cli = Cli::parse_from([
            "skiff",
            "plan",
            "a.swift",
            "b.swift",
            "lib.o",
            "--mode",
            "batch",
            "--batch-size",
            "8",
            "--link",
            "dylib",
            "--module-name",
            "Kit",
            "--target",
            "x86_64-unknown-linux-gnu",
            "--driver",
            "/opt/swift/bin/swift",
            "--format",
            "json",
            "--sanitize",
            "address,undefined",
            "-g",
        ]);
        match cli.command {
            Command::Plan(ref args) => {
                assert_eq!(args.inputs, vec!["a.swift", "b.swift", "lib.o"]);
                assert_eq!(args.mode, Mode::Batch);
                assert_eq!(args.batch_size, Some(8));
                assert_eq!(args.link, Some(LinkChoice::Dylib));
                assert_eq!(args.module_name, "Kit");
                assert_eq!(args.target.as_deref(), Some("x86_64-unknown-linux-gnu"));
                assert_eq!(args.driver.as_deref(), Some("/opt/swift/bin/swift"));
                assert_eq!(args.format, ReportFormat::Json);
                assert_eq!(args.sanitize, vec!["address", "undefined"]);
                assert!(args.debug);
            }
        }
    }

    #[test]
    fn plan_requires_inputs() {
        assert!(Cli::try_parse_from(["skiff", "plan"]).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "skiff",
            "--quiet",
            "--color",
            "never",
            "--config",
            "/etc/skiff.toml",
            "plan",
            "main.swift",
        ]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.config.as_deref(), Some("/etc/skiff.toml"));
    }

    #[test]
    fn parse_verbose_after_subcommand() {
        let cli = Cli::parse_from(["skiff", "plan", "main.swift", "--verbose"]);
        assert!(cli.verbose);
    }

    #[test]
    fn mode_and_emit_mapping() {
        assert_eq!(Mode::Batch.compiler_mode(), CompilerMode::StandardCompile);
        assert_eq!(Mode::Wmo.compiler_mode(), CompilerMode::SingleCompile);
        assert_eq!(Emit::Typecheck.file_type(), FileType::Nothing);
        assert_eq!(Emit::Bitcode.file_type(), FileType::LlvmBc);
        assert_eq!(LinkChoice::Static.link_kind(), LinkKind::StaticLibrary);
    }
}
