//! Concrete, runnable jobs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::action::Action;
use crate::compilation::TemporaryFile;
use crate::invocation::FilelistInfo;
use crate::output::CommandOutput;

/// A response file holding a job's full argument vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseFileInfo {
    /// The reserved file.
    pub file: TemporaryFile,
    /// The arguments it holds.
    pub arguments: Vec<String>,
}

impl ResponseFileInfo {
    /// Renders the file contents: one escaped argument per line.
    pub fn render(&self) -> String {
        let mut text = String::new();
        for arg in &self.arguments {
            text.push_str(&escape_argument(arg));
            text.push('\n');
        }
        text
    }
}

/// A process invocation derived from one action.
///
/// Owned by the caller. Temporary files it references (file lists, the
/// response file) live exactly as long as the job.
#[derive(Debug)]
pub struct Job {
    source: Arc<Action>,
    inputs: Vec<Arc<Job>>,
    input_actions: Vec<Arc<Action>>,
    output: CommandOutput,
    executable: PathBuf,
    arguments: Vec<String>,
    extra_environment: Vec<(String, String)>,
    filelist_infos: Vec<FilelistInfo>,
    response_file: Option<ResponseFileInfo>,
    batched_jobs: Vec<Arc<Job>>,
}

/// Parts a [`Job`] is assembled from.
pub(crate) struct JobParts {
    pub source: Arc<Action>,
    pub inputs: Vec<Arc<Job>>,
    pub input_actions: Vec<Arc<Action>>,
    pub output: CommandOutput,
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub extra_environment: Vec<(String, String)>,
    pub filelist_infos: Vec<FilelistInfo>,
    pub response_file: Option<ResponseFileInfo>,
    pub batched_jobs: Vec<Arc<Job>>,
}

impl Job {
    pub(crate) fn from_parts(parts: JobParts) -> Self {
        Self {
            source: parts.source,
            inputs: parts.inputs,
            input_actions: parts.input_actions,
            output: parts.output,
            executable: parts.executable,
            arguments: parts.arguments,
            extra_environment: parts.extra_environment,
            filelist_infos: parts.filelist_infos,
            response_file: parts.response_file,
            batched_jobs: parts.batched_jobs,
        }
    }

    /// Adds an environment override, as a scheduler would for a job it
    /// wants to run under a modified environment.
    pub fn with_environment_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_environment.push((name.into(), value.into()));
        self
    }

    /// The action this job was built from.
    pub fn source(&self) -> &Arc<Action> {
        &self.source
    }

    /// Jobs that must finish before this one runs.
    pub fn inputs(&self) -> &[Arc<Job>] {
        &self.inputs
    }

    /// Command-line inputs this job consumes.
    pub fn input_actions(&self) -> &[Arc<Action>] {
        &self.input_actions
    }

    /// What this job produces.
    pub fn output(&self) -> &CommandOutput {
        &self.output
    }

    /// Resolved path of the program to run.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// The arguments passed to the process. When a response file is in use
    /// this is the single `@<path>` argument.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// The full argument vector, whether or not it went to a response file.
    pub fn full_arguments(&self) -> &[String] {
        match &self.response_file {
            Some(response) => &response.arguments,
            None => &self.arguments,
        }
    }

    /// Environment overrides for the process.
    pub fn extra_environment(&self) -> &[(String, String)] {
        &self.extra_environment
    }

    /// File lists that must be written before the process is spawned.
    pub fn filelist_infos(&self) -> &[FilelistInfo] {
        &self.filelist_infos
    }

    /// The response file, if the command line was too long.
    pub fn response_file(&self) -> Option<&ResponseFileInfo> {
        self.response_file.as_ref()
    }

    /// For batch jobs, the jobs this one replaces, in order.
    pub fn batched_jobs(&self) -> &[Arc<Job>] {
        &self.batched_jobs
    }

    /// Renders the invocation as a shell command line, environment first.
    pub fn command_line(&self) -> String {
        let mut parts: Vec<String> = self
            .extra_environment
            .iter()
            .map(|(name, value)| format!("{name}={}", escape_argument(value)))
            .collect();
        parts.push(escape_argument(&self.executable.display().to_string()));
        parts.extend(self.arguments.iter().map(|a| escape_argument(a)));
        parts.join(" ")
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Quotes an argument for a POSIX shell when it contains anything beyond
/// the usual path characters.
pub fn escape_argument(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '=' | ',' | '@' | ':' | '+')
        });
    if plain {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Total length of a command line as the OS counts it.
pub(crate) fn command_line_length(executable: &Path, arguments: &[String]) -> usize {
    executable.as_os_str().len() + arguments.iter().map(|a| a.len() + 1).sum::<usize>()
}
