//! The toolchain: turns actions into jobs for one target.

mod batch;
mod invocations;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use skiff_common::{lookup_type_for_extension, FileType};
use tracing::{debug, warn};

use crate::action::{Action, ActionKind};
use crate::args::{opt, Arg, ArgList};
use crate::compilation::Compilation;
use crate::error::{DriverError, DriverResult};
use crate::invocation::InvocationInfo;
use crate::job::{command_line_length, Job, JobParts, ResponseFileInfo};
use crate::job_context::JobContext;
use crate::output::{CommandOutput, OutputInfo};
use crate::platform::{platform_for_triple, search, Platform};
use crate::triple::Triple;

/// Name under which invocation rules refer to the compiler frontend. It
/// always resolves to the driver program itself.
pub const SWIFT_EXECUTABLE_NAME: &str = "swift";

type ProgramCache = Mutex<HashMap<String, Arc<OnceLock<Option<PathBuf>>>>>;

/// Strategy object that builds jobs for one target.
///
/// Holds no per-job state. The only thing that changes over its lifetime is
/// the program lookup cache, which only ever grows.
#[derive(Debug)]
pub struct ToolChain {
    triple: Triple,
    driver_path: PathBuf,
    platform: Box<dyn Platform>,
    program_cache: ProgramCache,
    command_line_limit: usize,
}

impl ToolChain {
    /// Creates a toolchain with an explicit platform specialization.
    pub fn new(triple: Triple, driver_path: impl Into<PathBuf>, platform: Box<dyn Platform>) -> Self {
        let command_line_limit = if triple.is_os_windows() {
            32_000
        } else {
            262_144
        };
        Self {
            triple,
            driver_path: driver_path.into(),
            platform,
            program_cache: Mutex::new(HashMap::new()),
            command_line_limit,
        }
    }

    /// Creates a toolchain with the platform selected from `triple`.
    pub fn for_triple(triple: Triple, driver_path: impl Into<PathBuf>) -> Self {
        let platform = platform_for_triple(&triple);
        Self::new(triple, driver_path, platform)
    }

    /// Overrides the command-line length above which response files are used.
    pub fn with_command_line_limit(mut self, limit: usize) -> Self {
        self.command_line_limit = limit;
        self
    }

    /// The target triple.
    pub fn triple(&self) -> &Triple {
        &self.triple
    }

    /// Path of the driver program.
    pub fn driver_path(&self) -> &Path {
        &self.driver_path
    }

    /// The platform specialization in use.
    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    /// Builds the job for `action`.
    ///
    /// `inputs` are the already-built jobs whose outputs the action consumes;
    /// `input_actions` are the command-line files it consumes directly.
    pub fn construct_job(
        &self,
        action: &Arc<Action>,
        compilation: &Compilation,
        inputs: Vec<Arc<Job>>,
        input_actions: &[Arc<Action>],
        output: CommandOutput,
        output_info: &OutputInfo,
    ) -> DriverResult<Job> {
        let invocation = {
            let context = JobContext::new(
                action,
                compilation,
                &inputs,
                input_actions,
                &output,
                output_info,
            );
            self.construct_invocation(&context)?
        };
        let executable = self.resolve_executable(&invocation.executable)?;
        self.finish_job(
            compilation,
            JobParts {
                source: Arc::clone(action),
                inputs,
                input_actions: input_actions.to_vec(),
                output,
                executable,
                arguments: Vec::new(),
                extra_environment: Vec::new(),
                filelist_infos: Vec::new(),
                response_file: None,
                batched_jobs: Vec::new(),
            },
            invocation,
        )
    }

    /// Dispatches to the invocation rule for the context's action.
    pub fn construct_invocation(&self, context: &JobContext<'_>) -> DriverResult<InvocationInfo> {
        match context.source.kind() {
            ActionKind::Input { .. } => Err(DriverError::internal(
                "input actions have no invocation rule",
            )),
            ActionKind::Compile => invocations::compile(self, context),
            ActionKind::Interpret => invocations::interpret(self, context),
            ActionKind::Backend => invocations::backend(self, context),
            ActionKind::MergeModule => invocations::merge_module(self, context),
            ActionKind::ModuleWrap => invocations::module_wrap(self, context),
            ActionKind::Repl(mode) => invocations::repl(self, context, *mode),
            ActionKind::GenerateDsym => invocations::generate_dsym(context),
            ActionKind::VerifyDebugInfo => invocations::verify_debug_info(context),
            ActionKind::GeneratePch { persistent_dir } => {
                invocations::generate_pch(self, context, persistent_dir.as_deref())
            }
            ActionKind::AutolinkExtract => invocations::autolink_extract(context),
            ActionKind::Link(kind) => self
                .platform
                .construct_link_invocation(context, *kind, self),
        }
    }

    /// Fills in the invocation-derived parts of `parts`, switching to a
    /// response file when the command line is too long.
    fn finish_job(
        &self,
        compilation: &Compilation,
        mut parts: JobParts,
        invocation: InvocationInfo,
    ) -> DriverResult<Job> {
        let length = command_line_length(&parts.executable, &invocation.arguments);
        if invocation.allows_response_files && length > self.command_line_limit {
            let file = compilation.create_temporary_file("arguments", "resp")?;
            debug!(
                length,
                limit = self.command_line_limit,
                path = %file.path().display(),
                "command line too long, using a response file"
            );
            parts.arguments = vec![format!("@{}", file.display_path())];
            parts.response_file = Some(ResponseFileInfo {
                file,
                arguments: invocation.arguments,
            });
        } else {
            parts.arguments = invocation.arguments;
        }
        parts.extra_environment = invocation.extra_environment;
        parts.filelist_infos = invocation.filelist_infos;
        Ok(Job::from_parts(parts))
    }

    fn resolve_executable(&self, name: &str) -> DriverResult<PathBuf> {
        if name == SWIFT_EXECUTABLE_NAME {
            return Ok(self.driver_path.clone());
        }
        self.find_program_relative_to_swift(name)
    }

    /// Resolves a tool name to a path: next to the driver first, then the
    /// platform's fallback search. Results, including failures, are cached
    /// for the lifetime of the toolchain.
    pub fn find_program_relative_to_swift(&self, name: &str) -> DriverResult<PathBuf> {
        let slot = {
            let mut cache = self
                .program_cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cache.entry(name.to_string()).or_default())
        };
        slot.get_or_init(|| self.resolve_program(name))
            .clone()
            .ok_or_else(|| DriverError::ToolNotFound {
                name: name.to_string(),
            })
    }

    fn resolve_program(&self, name: &str) -> Option<PathBuf> {
        let driver_dir = self.driver_path.parent().unwrap_or_else(|| Path::new(""));
        let local = driver_dir.join(name);
        let found = if search::is_executable(&local) {
            Some(local)
        } else {
            self.platform.resolve_program_fallback(name, driver_dir)
        };
        debug!(name, found = ?found, "resolved program");
        found
    }

    /// Maps a file extension to its type; unknown extensions give
    /// [`FileType::Invalid`].
    pub fn lookup_type_for_extension(&self, ext: &str) -> FileType {
        lookup_type_for_extension(ext)
    }

    /// The runtime resource directory: `-resource-dir` if given, otherwise
    /// `lib/swift` next to the driver's `bin` directory.
    pub fn resource_dir(&self, args: &ArgList) -> PathBuf {
        if let Some(dir) = args.last_arg_value(opt::RESOURCE_DIR) {
            return PathBuf::from(dir);
        }
        let bin_dir = self.driver_path.parent().unwrap_or_else(|| Path::new(""));
        bin_dir.join("..").join("lib").join("swift")
    }

    /// The directory holding the Swift runtime for this target.
    pub fn runtime_library_path(&self, args: &ArgList, static_stdlib: bool) -> PathBuf {
        let resource_dir = self.resource_dir(args);
        let base = if static_stdlib {
            resource_dir.with_file_name("swift_static")
        } else {
            resource_dir
        };
        base.join(self.triple.platform_dir_name())
    }

    /// Returns `true` if the runtime for `sanitizer` is installed.
    pub fn sanitizer_runtime_lib_exists(&self, args: &ArgList, sanitizer: &str, shared: bool) -> bool {
        let resource_dir = self.resource_dir(args);
        self.platform
            .sanitizer_runtime_lib_exists(&self.triple, &resource_dir, sanitizer, shared)
    }

    /// The `-sanitize=` values whose runtime is installed. The rest are
    /// dropped with a warning.
    pub fn supported_sanitizers(&self, args: &ArgList) -> Vec<String> {
        let mut supported = Vec::new();
        for sanitizer in args.all_values(opt::SANITIZE) {
            if self.sanitizer_runtime_lib_exists(args, sanitizer, true) {
                supported.push(sanitizer.to_string());
            } else {
                warn!(
                    sanitizer,
                    target = %self.triple,
                    "sanitizer runtime not found, disabling it"
                );
            }
        }
        supported
    }

    /// Whether `arg` may be a primary input of a job producing `output`.
    ///
    /// Always true except for index-data jobs, where only the input named
    /// as the index file is primary.
    pub fn can_compile_input_argument_be_primary(output: &CommandOutput, arg: &Arg) -> bool {
        if output.primary_output_type() != FileType::IndexData {
            return true;
        }
        match (output.index_file_path(), arg.value()) {
            (Some(index), Some(value)) => index == value,
            _ => false,
        }
    }
}
