//! Printing planned jobs.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use skiff_driver::{FilelistKind, Job};

/// A file list as shown in reports.
#[derive(Debug, Serialize)]
pub struct FilelistReport {
    /// Where the list is written.
    pub path: String,
    /// What it enumerates.
    pub kind: FilelistKind,
    /// Number of entries.
    pub entries: usize,
}

/// One planned job as shown in reports.
#[derive(Debug, Serialize)]
pub struct JobReport {
    /// The action kind the job runs.
    pub kind: &'static str,
    /// Resolved executable.
    pub executable: String,
    /// Full argument vector, even when a response file carries it.
    pub arguments: Vec<String>,
    /// Environment overrides.
    pub environment: BTreeMap<String, String>,
    /// Main outputs.
    pub outputs: Vec<String>,
    /// File lists the job reads.
    pub filelists: Vec<FilelistReport>,
    /// Response file path, if the command line was too long.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_file: Option<String>,
    /// Number of jobs merged into this one.
    pub batched: usize,
}

impl JobReport {
    /// Summarizes `job`.
    pub fn new(job: &Job) -> Self {
        Self {
            kind: job.source().kind().name(),
            executable: job.executable().display().to_string(),
            arguments: job.full_arguments().to_vec(),
            environment: job.extra_environment().iter().cloned().collect(),
            outputs: job
                .output()
                .primary_output_filenames()
                .into_iter()
                .map(str::to_string)
                .collect(),
            filelists: job
                .filelist_infos()
                .iter()
                .map(|info| FilelistReport {
                    path: info.path().display().to_string(),
                    kind: info.kind,
                    entries: info.len(),
                })
                .collect(),
            response_file: job.response_file().map(|r| r.file.display_path()),
            batched: job.batched_jobs().len(),
        }
    }
}

/// Renders one line per job, plus an indented line per file list.
pub fn render_text(jobs: &[Arc<Job>]) -> String {
    let mut out = String::new();
    for job in jobs {
        let kind = job.source().kind().name();
        out.push_str(&format!("[{kind}] {}\n", job.command_line()));
        if !job.batched_jobs().is_empty() {
            out.push_str(&format!("    batch of {}\n", job.batched_jobs().len()));
        }
        for info in job.filelist_infos() {
            out.push_str(&format!(
                "    list {} ({} entries)\n",
                info.path().display(),
                info.len()
            ));
        }
        if let Some(response) = job.response_file() {
            out.push_str(&format!(
                "    response file {} ({} arguments)\n",
                response.file.display_path(),
                response.arguments.len()
            ));
        }
    }
    out
}

/// Prints the text report to stdout.
pub fn print_text(jobs: &[Arc<Job>]) {
    print!("{}", render_text(jobs));
}

/// Prints the jobs as a pretty JSON array to stdout.
pub fn print_json(jobs: &[Arc<Job>]) -> serde_json::Result<()> {
    let reports: Vec<JobReport> = jobs.iter().map(|job| JobReport::new(job)).collect();
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiff_common::FileType;
    use skiff_driver::{
        Action, ArgList, CommandOutput, Compilation, CompilerMode, OutputInfo, ToolChain, Triple,
    };

    fn compile_job(count: usize, tmp: &std::path::Path) -> Job {
        let mut args = ArgList::new();
        let mut sources = Vec::new();
        let mut builder_inputs = Vec::new();
        for i in 0..count {
            let path = format!("f{i}.swift");
            sources.push(Action::input(args.push_input(path.clone()), FileType::Swift));
            builder_inputs.push(path);
        }
        let info = OutputInfo::new(CompilerMode::StandardCompile, FileType::Object, "M");
        let mut builder = Compilation::builder(args, info).temp_dir(tmp);
        for path in builder_inputs {
            builder = builder.input(FileType::Swift, path);
        }
        let compilation = builder.build();
        let toolchain = ToolChain::for_triple(Triple::parse("x86_64-unknown-linux-gnu"), "/opt/bin/swift");
        let compile = Action::compile(FileType::Object, vec![Arc::clone(&sources[0])]);
        let mut output = CommandOutput::new(FileType::Object);
        output.add_primary_output("f0.swift", "f0.o");
        toolchain
            .construct_job(
                &compile,
                &compilation,
                Vec::new(),
                &sources[..1],
                output,
                compilation.output_info(),
            )
            .unwrap()
    }

    #[test]
    fn text_report_lists_command_and_filelists() {
        let dir = tempfile::tempdir().unwrap();
        let job = Arc::new(compile_job(200, dir.path()));
        let text = render_text(&[Arc::clone(&job)]);
        let mut lines = text.lines();
        let first = lines.next().unwrap();
        assert!(first.starts_with("[compile] /opt/bin/swift -frontend -c "));
        let list = lines.next().unwrap();
        assert!(list.starts_with("    list "));
        assert!(list.ends_with("(200 entries)"));
    }

    #[test]
    fn json_report_carries_outputs_and_environment() {
        let dir = tempfile::tempdir().unwrap();
        let job = compile_job(2, dir.path()).with_environment_var("TMPDIR", "/scratch");
        let report = JobReport::new(&job);
        assert_eq!(report.kind, "compile");
        assert_eq!(report.outputs, vec!["f0.o"]);
        assert!(report.filelists.is_empty());

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["environment"]["TMPDIR"], "/scratch");
        assert_eq!(value["batched"], 0);
        assert!(value.get("response_file").is_none());
        assert!(value["arguments"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a == "-primary-file"));
    }
}
