//! `skiff plan`: action graph, job construction and reporting.
//!
//! 1. Resolve settings from `skiff.toml` and flags
//! 2. Classify inputs by extension
//! 3. Build the action graph for the requested mode
//! 4. Construct compile jobs in parallel, then batch them if asked
//! 5. Construct the module, autolink, link and dSYM jobs on top
//! 6. Print the jobs and any diagnostics

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use skiff_common::FileType;
use skiff_diagnostics::{
    Diagnostic, DiagnosticCode, DiagnosticRenderer, DiagnosticSink, JsonRenderer, Severity,
    TerminalRenderer,
};
use skiff_driver::args::opt;
use skiff_driver::{
    write_job_filelists, Action, ArgList, CommandOutput, Compilation, DriverError, DriverResult,
    Job, LinkKind, OutputInfo, ToolChain, Triple,
};
use tracing::debug;

use crate::report::{print_json, print_text};
use crate::settings::Settings;
use crate::{Emit, GlobalArgs, Mode, PlanArgs, ReportFormat};

/// An input file and the type its extension maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// The path as given.
    pub path: String,
    /// Its type; unknown extensions are treated as objects.
    pub file_type: FileType,
}

/// The shape of the graph to build.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// How sources are grouped.
    pub mode: Mode,
    /// What compile jobs produce.
    pub emit: Emit,
    /// Whether a module is produced too.
    pub emit_module: bool,
    /// What to link, if anything.
    pub link: Option<LinkKind>,
    /// Name of the module.
    pub module_name: String,
    /// Where outputs go.
    pub output_dir: PathBuf,
    /// Whether debug info is requested.
    pub debug: bool,
    /// Maximum primaries per batch job.
    pub batch_size: usize,
}

impl PlanRequest {
    fn new(args: &PlanArgs, settings: &Settings) -> Self {
        Self {
            mode: args.mode,
            emit: args.emit,
            emit_module: args.emit_module,
            link: args.link.map(|l| l.link_kind()),
            module_name: args.module_name.clone(),
            output_dir: PathBuf::from(&args.output_dir),
            debug: args.debug,
            batch_size: settings.batch_size,
        }
    }

    fn output_path(&self, name: &str) -> String {
        self.output_dir.join(name).display().to_string()
    }
}

/// Runs the `skiff plan` command.
///
/// Returns exit code 0 if every job was built, 1 if a tool was missing.
pub fn run(args: &PlanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::resolve(args, global, &cwd)?;
    let toolchain = ToolChain::for_triple(Triple::parse(&settings.target), &settings.driver);
    let sink = DiagnosticSink::new();

    let inputs = classify_inputs(&toolchain, &args.inputs, &sink);
    let request = PlanRequest::new(args, &settings);
    let (compilation, actions) = build_compilation(&settings, &request, &inputs, &args.sanitize);
    check_sanitizers(&toolchain, &compilation, &args.sanitize, &sink);

    if !global.quiet {
        eprintln!(
            "   Planning {} for {} ({} input(s), platform {})",
            request.module_name,
            toolchain.triple(),
            inputs.len(),
            toolchain.platform().name()
        );
    }

    let jobs = match plan_jobs(&toolchain, &compilation, &request, &actions) {
        Ok(jobs) => jobs,
        Err(DriverError::ToolNotFound { name }) => {
            sink.emit(tool_not_found(&name));
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    if args.write_filelists {
        for job in &jobs {
            write_job_filelists(job)?;
        }
    }

    match args.format {
        ReportFormat::Text => print_text(&jobs),
        ReportFormat::Json => print_json(&jobs)?,
    }

    for diag in &sink.take_all() {
        let rendered = match args.format {
            ReportFormat::Text => TerminalRenderer::new(global.color).render(diag),
            ReportFormat::Json => JsonRenderer.render(diag),
        };
        eprintln!("{}", rendered.trim_end());
    }

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!("   Result: {} job(s), {}", jobs.len(), sink.summary());
    }

    Ok(if sink.has_errors() { 1 } else { 0 })
}

fn tool_not_found(name: &str) -> Diagnostic {
    Diagnostic::error(DiagnosticCode::TOOL_NOT_FOUND, "unable to find tool")
        .with_subject(name)
        .with_note("tools are looked up next to the driver, then on PATH")
        .with_help("install the tool or point `toolchain.driver` at a complete toolchain")
}

/// Maps every input to a file type. Unknown extensions produce a warning and
/// are handed to the linker as objects.
pub fn classify_inputs(toolchain: &ToolChain, paths: &[String], sink: &DiagnosticSink) -> Vec<InputFile> {
    paths
        .iter()
        .map(|path| {
            let ext = Path::new(path)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("");
            let file_type = match toolchain.lookup_type_for_extension(ext) {
                FileType::Invalid => {
                    sink.emit(
                        Diagnostic::warning(
                            DiagnosticCode::UNKNOWN_INPUT_TYPE,
                            "unrecognized input file type",
                        )
                        .with_subject(path.as_str())
                        .with_note("the file is passed to the linker unchanged"),
                    );
                    FileType::Object
                }
                file_type => file_type,
            };
            InputFile {
                path: path.clone(),
                file_type,
            }
        })
        .collect()
}

/// Builds the compilation and one input action per input file.
pub fn build_compilation(
    settings: &Settings,
    request: &PlanRequest,
    inputs: &[InputFile],
    sanitizers: &[String],
) -> (Compilation, Vec<Arc<Action>>) {
    let mut args = ArgList::new();
    let actions: Vec<Arc<Action>> = inputs
        .iter()
        .map(|input| Action::input(args.push_input(input.path.clone()), input.file_type))
        .collect();
    if request.debug {
        args.push_flag(opt::G);
    }
    if !sanitizers.is_empty() {
        args.push_values(opt::SANITIZE, sanitizers.iter().cloned());
    }
    if let Some(dir) = &settings.resource_dir {
        args.push_value(opt::RESOURCE_DIR, dir.display().to_string());
    }

    let mut info = OutputInfo::new(
        request.mode.compiler_mode(),
        request.emit.file_type(),
        request.module_name.clone(),
    );
    if let Some(kind) = request.link {
        info = info.with_link_kind(kind);
    }
    if let Some(sdk) = &settings.sdk {
        info = info.with_sdk(sdk);
    }

    let mut builder = Compilation::builder(args, info)
        .temp_dir(&settings.temp_dir)
        .save_temps(settings.save_temps);
    for input in inputs {
        builder = builder.input(input.file_type, input.path.clone());
    }
    (builder.build(), actions)
}

fn check_sanitizers(
    toolchain: &ToolChain,
    compilation: &Compilation,
    requested: &[String],
    sink: &DiagnosticSink,
) {
    let supported = toolchain.supported_sanitizers(compilation.args());
    for sanitizer in requested {
        if !supported.contains(sanitizer) {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::SANITIZER_UNAVAILABLE,
                    "sanitizer runtime not installed, sanitizer disabled",
                )
                .with_subject(sanitizer.as_str()),
            );
        }
    }
}

/// A compile action with the inputs and outputs of its job.
struct CompileStep {
    action: Arc<Action>,
    inputs: Vec<Arc<Action>>,
    output: CommandOutput,
}

fn file_stem(path: &str) -> &str {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
}

fn compile_steps(request: &PlanRequest, sources: &[Arc<Action>]) -> Vec<CompileStep> {
    if sources.is_empty() {
        return Vec::new();
    }
    let output_type = request.emit.file_type();
    let path_of = |action: &Arc<Action>| {
        action
            .input_arg()
            .and_then(|arg| arg.value())
            .unwrap_or_default()
            .to_string()
    };

    if request.mode == Mode::Wmo {
        let mut output = CommandOutput::new(output_type);
        for source in sources {
            output.add_input(path_of(source));
        }
        if output_type != FileType::Nothing {
            let name = format!("{}.{}", request.module_name, output_type.extension());
            output.add_primary_output("", request.output_path(&name));
        }
        if request.emit_module {
            let name = format!("{}.swiftmodule", request.module_name);
            output.set_whole_module_output(FileType::SwiftModule, request.output_path(&name));
        }
        return vec![CompileStep {
            action: Action::compile(output_type, sources.to_vec()),
            inputs: sources.to_vec(),
            output,
        }];
    }

    sources
        .iter()
        .map(|source| {
            let path = path_of(source);
            let stem = file_stem(&path).to_string();
            let mut output = CommandOutput::new(output_type);
            if output_type == FileType::Nothing {
                output.add_input(path.clone());
            } else {
                let name = format!("{stem}.{}", output_type.extension());
                output.add_primary_output(path.clone(), request.output_path(&name));
            }
            if request.emit_module {
                let name = format!("{stem}~partial.swiftmodule");
                output.set_supplementary_output(path, FileType::SwiftModule, request.output_path(&name));
            }
            CompileStep {
                action: Action::compile(output_type, vec![Arc::clone(source)]),
                inputs: vec![Arc::clone(source)],
                output,
            }
        })
        .collect()
}

fn image_name(triple: &Triple, kind: LinkKind, module: &str) -> String {
    match kind {
        LinkKind::Executable => module.to_string(),
        LinkKind::StaticLibrary => format!("lib{module}.a"),
        LinkKind::DynamicLibrary if triple.is_os_darwin() => format!("lib{module}.dylib"),
        LinkKind::DynamicLibrary if triple.is_os_windows() => format!("{module}.dll"),
        LinkKind::DynamicLibrary => format!("lib{module}.so"),
    }
}

/// Builds every job for `actions`, in dependency order.
pub fn plan_jobs(
    toolchain: &ToolChain,
    compilation: &Compilation,
    request: &PlanRequest,
    actions: &[Arc<Action>],
) -> DriverResult<Vec<Arc<Job>>> {
    let sources: Vec<Arc<Action>> = actions
        .iter()
        .filter(|a| a.output_type().is_part_of_swift_compilation())
        .cloned()
        .collect();
    let objects: Vec<Arc<Action>> = actions
        .iter()
        .filter(|a| a.output_type() == FileType::Object)
        .cloned()
        .collect();

    let steps = compile_steps(request, &sources);
    let compile_actions: Vec<Arc<Action>> = steps.iter().map(|s| Arc::clone(&s.action)).collect();
    let mut compile_jobs: Vec<Arc<Job>> = steps
        .par_iter()
        .map(|step| {
            toolchain
                .construct_job(
                    &step.action,
                    compilation,
                    Vec::new(),
                    &step.inputs,
                    step.output.clone(),
                    compilation.output_info(),
                )
                .map(Arc::new)
        })
        .collect::<DriverResult<_>>()?;
    debug!(jobs = compile_jobs.len(), "constructed compile jobs");

    if request.mode == Mode::Batch {
        compile_jobs = toolchain.form_batch_jobs(compilation, compile_jobs, request.batch_size)?;
    }

    let mut jobs = compile_jobs.clone();
    let module = &request.module_name;

    if request.emit_module && request.mode != Mode::Wmo && !compile_jobs.is_empty() {
        let merge = Action::merge_module(compile_actions.clone());
        let mut output = CommandOutput::new(FileType::SwiftModule);
        output.add_primary_output("", request.output_path(&format!("{module}.swiftmodule")));
        let job = toolchain.construct_job(
            &merge,
            compilation,
            compile_jobs.clone(),
            &[],
            output,
            compilation.output_info(),
        )?;
        jobs.push(Arc::new(job));
    }

    let Some(kind) = request.link else {
        return Ok(jobs);
    };
    if request.emit.file_type() != FileType::Object {
        return Ok(jobs);
    }

    let triple = toolchain.triple();
    let mut link_inputs = compile_actions.clone();
    link_inputs.extend(objects.iter().cloned());
    let mut link_jobs = compile_jobs.clone();

    if !triple.is_os_darwin() && kind != LinkKind::StaticLibrary {
        let mut extract_inputs = compile_actions.clone();
        extract_inputs.extend(objects.iter().cloned());
        let extract = Action::autolink_extract(extract_inputs);
        let mut output = CommandOutput::new(FileType::AutolinkFile);
        output.add_primary_output("", request.output_path(&format!("{module}.autolink")));
        let job = Arc::new(toolchain.construct_job(
            &extract,
            compilation,
            compile_jobs.clone(),
            &objects,
            output,
            compilation.output_info(),
        )?);
        link_inputs.push(extract);
        link_jobs.push(Arc::clone(&job));
        jobs.push(job);
    }

    let link = Action::link(kind, link_inputs);
    let image = request.output_path(&image_name(triple, kind, module));
    let mut output = CommandOutput::new(FileType::Image);
    output.add_primary_output("", image.clone());
    let link_job = Arc::new(toolchain.construct_job(
        &link,
        compilation,
        link_jobs,
        &objects,
        output,
        compilation.output_info(),
    )?);
    jobs.push(Arc::clone(&link_job));

    if request.debug && triple.is_os_darwin() && kind == LinkKind::Executable {
        let dsym = Action::generate_dsym(link);
        let mut output = CommandOutput::new(FileType::DSym);
        output.add_primary_output(image.clone(), format!("{image}.dSYM"));
        let job = toolchain.construct_job(
            &dsym,
            compilation,
            vec![link_job],
            &[],
            output,
            compilation.output_info(),
        )?;
        jobs.push(Arc::new(job));
    }
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiff_driver::ActionKind;
    use std::fs;

    fn install(tools: &[&str]) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let bin = root.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        for tool in tools {
            let path = bin.join(tool);
            fs::write(&path, "#!/bin/sh\n").unwrap();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            }
        }
        root
    }

    fn settings(root: &Path, target: &str) -> Settings {
        Settings {
            target: target.to_string(),
            driver: root.join("bin").join("swift"),
            resource_dir: None,
            sdk: None,
            temp_dir: root.to_path_buf(),
            save_temps: false,
            batch_size: 2,
        }
    }

    fn request(mode: Mode, link: Option<LinkKind>) -> PlanRequest {
        PlanRequest {
            mode,
            emit: Emit::Object,
            emit_module: false,
            link,
            module_name: "App".to_string(),
            output_dir: PathBuf::from("out"),
            debug: false,
            batch_size: 2,
        }
    }

    fn inputs(paths: &[&str]) -> Vec<InputFile> {
        let toolchain = ToolChain::for_triple(Triple::parse("x86_64-unknown-linux-gnu"), "/bin/swift");
        let sink = DiagnosticSink::new();
        let paths: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        classify_inputs(&toolchain, &paths, &sink)
    }

    fn kinds(jobs: &[Arc<Job>]) -> Vec<&'static str> {
        jobs.iter().map(|j| j.source().kind().name()).collect()
    }

    #[test]
    fn unknown_extension_warns_and_links_as_object() {
        let toolchain = ToolChain::for_triple(Triple::parse("x86_64-unknown-linux-gnu"), "/bin/swift");
        let sink = DiagnosticSink::new();
        let classified = classify_inputs(
            &toolchain,
            &[
                "main.swift".to_string(),
                "blob.zzz".to_string(),
                "blob.zzz".to_string(),
            ],
            &sink,
        );
        assert_eq!(classified[0].file_type, FileType::Swift);
        assert_eq!(classified[1].file_type, FileType::Object);
        assert_eq!(classified[2].file_type, FileType::Object);
        assert_eq!(sink.warning_count(), 1);
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UNKNOWN_INPUT_TYPE);
        assert_eq!(diags[0].subject.as_deref(), Some("blob.zzz"));
    }

    #[test]
    fn linux_executable_plan() {
        let root = install(&["swift", "clang", "swift-autolink-extract"]);
        let settings = settings(root.path(), "x86_64-unknown-linux-gnu");
        let request = request(Mode::Standard, Some(LinkKind::Executable));
        let files = inputs(&["a.swift", "b.swift", "extra.o"]);
        let (compilation, actions) = build_compilation(&settings, &request, &files, &[]);
        let toolchain = ToolChain::for_triple(Triple::parse(&settings.target), &settings.driver);

        let jobs = plan_jobs(&toolchain, &compilation, &request, &actions).unwrap();
        assert_eq!(
            kinds(&jobs),
            vec!["compile", "compile", "autolink-extract", "link"]
        );
        let link = &jobs[3];
        assert!(matches!(
            link.source().kind(),
            ActionKind::Link(LinkKind::Executable)
        ));
        let arguments = link.arguments();
        assert!(arguments.contains(&"out/a.o".to_string()));
        assert!(arguments.contains(&"extra.o".to_string()));
        assert!(arguments.contains(&"@out/App.autolink".to_string()));
        assert_eq!(arguments[arguments.len() - 2..], ["-o", "out/App"]);
    }

    #[test]
    fn batch_mode_groups_compiles() {
        let root = install(&["swift"]);
        let settings = settings(root.path(), "x86_64-unknown-linux-gnu");
        let request = request(Mode::Batch, None);
        let files = inputs(&["a.swift", "b.swift", "c.swift", "d.swift", "e.swift"]);
        let (compilation, actions) = build_compilation(&settings, &request, &files, &[]);
        let toolchain = ToolChain::for_triple(Triple::parse(&settings.target), &settings.driver);

        let jobs = plan_jobs(&toolchain, &compilation, &request, &actions).unwrap();
        let sizes: Vec<usize> = jobs.iter().map(|j| j.batched_jobs().len()).collect();
        assert_eq!(sizes, vec![2, 2, 0]);
    }

    #[test]
    fn whole_module_with_module_output() {
        let root = install(&["swift"]);
        let settings = settings(root.path(), "x86_64-unknown-linux-gnu");
        let mut request = request(Mode::Wmo, None);
        request.emit_module = true;
        let files = inputs(&["a.swift", "b.swift"]);
        let (compilation, actions) = build_compilation(&settings, &request, &files, &[]);
        let toolchain = ToolChain::for_triple(Triple::parse(&settings.target), &settings.driver);

        let jobs = plan_jobs(&toolchain, &compilation, &request, &actions).unwrap();
        assert_eq!(kinds(&jobs), vec!["compile"]);
        let arguments = jobs[0].arguments();
        assert!(!arguments.contains(&"-primary-file".to_string()));
        assert!(arguments.contains(&"out/App.o".to_string()));
        assert!(arguments.contains(&"out/App.swiftmodule".to_string()));
    }

    #[test]
    fn standard_mode_merges_partial_modules() {
        let root = install(&["swift"]);
        let settings = settings(root.path(), "x86_64-unknown-linux-gnu");
        let mut request = request(Mode::Standard, None);
        request.emit_module = true;
        let files = inputs(&["a.swift", "b.swift"]);
        let (compilation, actions) = build_compilation(&settings, &request, &files, &[]);
        let toolchain = ToolChain::for_triple(Triple::parse(&settings.target), &settings.driver);

        let jobs = plan_jobs(&toolchain, &compilation, &request, &actions).unwrap();
        assert_eq!(kinds(&jobs), vec!["compile", "compile", "merge-module"]);
        let merge = jobs[2].arguments();
        assert!(merge.contains(&"out/a~partial.swiftmodule".to_string()));
        assert!(merge.contains(&"out/b~partial.swiftmodule".to_string()));
    }

    #[test]
    fn missing_autolink_extract_is_tool_not_found() {
        let root = install(&["swift", "clang"]);
        let settings = settings(root.path(), "x86_64-unknown-linux-gnu");
        let request = request(Mode::Standard, Some(LinkKind::Executable));
        let files = inputs(&["a.swift"]);
        let (compilation, actions) = build_compilation(&settings, &request, &files, &[]);
        let toolchain = ToolChain::for_triple(Triple::parse(&settings.target), &settings.driver);

        match plan_jobs(&toolchain, &compilation, &request, &actions) {
            Err(DriverError::ToolNotFound { name }) => assert_eq!(name, "swift-autolink-extract"),
            other => panic!("expected a missing tool, got {other:?}"),
        }
    }

    #[test]
    fn tool_not_found_diagnostic_names_the_tool() {
        let diag = tool_not_found("ld");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code, DiagnosticCode::TOOL_NOT_FOUND);
        assert_eq!(diag.subject.as_deref(), Some("ld"));
        assert_eq!(diag.help.len(), 1);
    }

    #[test]
    fn darwin_debug_executable_gets_dsym() {
        let root = install(&["swift", "ld", "dsymutil"]);
        let settings = settings(root.path(), "arm64-apple-macosx13.0");
        let mut request = request(Mode::Standard, Some(LinkKind::Executable));
        request.debug = true;
        let files = inputs(&["a.swift"]);
        let (compilation, actions) = build_compilation(&settings, &request, &files, &[]);
        let toolchain = ToolChain::for_triple(Triple::parse(&settings.target), &settings.driver);

        let jobs = plan_jobs(&toolchain, &compilation, &request, &actions).unwrap();
        assert_eq!(kinds(&jobs), vec!["compile", "link", "generate-dSYM"]);
        assert!(jobs[0].arguments().contains(&"-g".to_string()));
        assert_eq!(jobs[2].arguments(), ["out/App", "-o", "out/App.dSYM"]);
    }

    #[test]
    fn dylib_names_follow_the_platform() {
        let linux = Triple::parse("x86_64-unknown-linux-gnu");
        let mac = Triple::parse("arm64-apple-macosx13.0");
        assert_eq!(image_name(&linux, LinkKind::DynamicLibrary, "Kit"), "libKit.so");
        assert_eq!(image_name(&mac, LinkKind::DynamicLibrary, "Kit"), "libKit.dylib");
        assert_eq!(image_name(&mac, LinkKind::StaticLibrary, "Kit"), "libKit.a");
        assert_eq!(image_name(&mac, LinkKind::Executable, "Kit"), "Kit");
    }
}
