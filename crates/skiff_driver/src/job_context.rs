//! Per-construction context and the file-list decisions made from it.

use std::collections::HashSet;
use std::sync::Arc;

use skiff_common::FileType;
use tracing::debug;

use crate::action::{Action, ActionKind};
use crate::args::{Arg, ArgList};
use crate::compilation::{Compilation, InputPair, TemporaryFile};
use crate::error::DriverResult;
use crate::invocation::{FilelistInfo, FilelistKind};
use crate::job::Job;
use crate::output::{CommandOutput, CompilerMode, OutputInfo};
use crate::toolchain::ToolChain;

/// Above this many files of one category, the category is passed through a
/// file list instead of inline arguments.
pub const TOO_MANY_FILES: usize = 128;

/// Everything an invocation rule may look at. Lives for one
/// `construct_job` call.
#[derive(Clone, Copy)]
pub struct JobContext<'a> {
    /// The action being turned into a job.
    pub source: &'a Action,
    /// The compilation the job belongs to.
    pub compilation: &'a Compilation,
    /// Jobs whose outputs this job consumes.
    pub inputs: &'a [Arc<Job>],
    /// Input actions (command-line files) this job consumes.
    pub input_actions: &'a [Arc<Action>],
    /// What the job must produce.
    pub output: &'a CommandOutput,
    /// Output configuration; synthetic for batch jobs.
    pub output_info: &'a OutputInfo,
}

impl<'a> JobContext<'a> {
    /// Bundles the arguments of one construction call.
    pub fn new(
        source: &'a Action,
        compilation: &'a Compilation,
        inputs: &'a [Arc<Job>],
        input_actions: &'a [Arc<Action>],
        output: &'a CommandOutput,
        output_info: &'a OutputInfo,
    ) -> Self {
        Self {
            source,
            compilation,
            inputs,
            input_actions,
            output,
            output_info,
        }
    }

    /// The resolved argument list.
    pub fn args(&self) -> &'a ArgList {
        self.compilation.args()
    }

    /// Forwards to [`Compilation::top_level_input_files`].
    pub fn top_level_input_files(&self) -> &'a [InputPair] {
        self.compilation.top_level_input_files()
    }

    /// Forwards to [`Compilation::all_sources_path`].
    pub fn all_sources_path(&self) -> DriverResult<TemporaryFile> {
        self.compilation.all_sources_path()
    }

    /// Reserves a fresh temporary file owned by the job being built.
    pub fn temporary_file_path(&self, name: &str, suffix: &str) -> DriverResult<TemporaryFile> {
        self.compilation.create_temporary_file(name, suffix)
    }

    /// True when the compilation's inputs are too many to pass inline.
    pub fn should_use_input_file_list(&self) -> bool {
        self.top_level_input_files().len() > TOO_MANY_FILES
    }

    /// True when a multi-primary invocation has too many primaries to pass
    /// inline. Single-primary invocations never list their primary.
    pub fn should_use_primary_input_file_list(&self) -> bool {
        self.output_info.compiler_mode == CompilerMode::BatchModeCompile
            && self.input_actions.len() > TOO_MANY_FILES
    }

    /// True when only compilable inputs are passed to the frontend.
    ///
    /// Whole-module compiles have always received every input unfiltered.
    pub fn should_filter_inputs_by_type(&self) -> bool {
        self.output_info.compiler_mode != CompilerMode::SingleCompile
    }

    /// True when a merge-module job has too many inputs to pass inline.
    pub fn should_use_merge_module_input_file_list(&self) -> bool {
        self.inputs.len() + self.input_actions.len() > TOO_MANY_FILES
    }

    /// True when a link job has too many inputs to pass inline.
    pub fn should_use_link_input_file_list(&self) -> bool {
        self.inputs.len() + self.input_actions.len() > TOO_MANY_FILES
    }

    /// True when there are too many main outputs to pass inline.
    pub fn should_use_main_output_file_list(&self) -> bool {
        self.output.primary_output_filenames().len() > TOO_MANY_FILES
    }

    /// True when there are too many supplementary outputs to pass inline.
    /// In practice only batch jobs get there.
    pub fn should_use_supplementary_output_file_list(&self) -> bool {
        self.output.supplementary_output_count() > TOO_MANY_FILES
    }

    /// Whether this job may mark some of its inputs as primary.
    pub fn may_have_primary_inputs(&self) -> bool {
        matches!(self.source.kind(), ActionKind::Compile | ActionKind::Backend)
            && self.output_info.compiler_mode.may_have_primary_inputs()
    }

    /// The frontend mode flag for a compile job.
    pub fn compute_frontend_mode_for_compile(&self) -> &'static str {
        match self.output_info.compiler_mode {
            CompilerMode::Immediate => return "-interpret",
            CompilerMode::Repl => return "-repl",
            _ => {}
        }
        match self.output_info.compiler_output_type {
            FileType::Object => "-c",
            FileType::Pch => "-emit-pch",
            FileType::AstDump => "-dump-ast",
            FileType::RawSil => "-emit-silgen",
            FileType::Sil => "-emit-sil",
            FileType::RawSib => "-emit-sibgen",
            FileType::Sib => "-emit-sib",
            FileType::LlvmIr => "-emit-ir",
            FileType::LlvmBc => "-emit-bc",
            FileType::Assembly => "-S",
            FileType::SwiftModule => "-emit-module",
            FileType::ImportedModules => "-emit-imported-modules",
            FileType::IndexData => "-typecheck",
            FileType::Remapping => "-update-code",
            _ => "-typecheck",
        }
    }

    fn primary_input_paths(&self) -> HashSet<&'a str> {
        if !self.may_have_primary_inputs() {
            return HashSet::new();
        }
        self.input_actions
            .iter()
            .filter_map(|action| action.input_arg())
            .filter(|arg| ToolChain::can_compile_input_argument_be_primary(self.output, arg))
            .filter_map(Arg::value)
            .collect()
    }

    /// Paths of `file_type` produced by input jobs, followed by input actions
    /// of that type, in order.
    pub fn input_paths_of_type(&self, file_type: FileType) -> Vec<String> {
        let from_jobs = self
            .inputs
            .iter()
            .flat_map(|job| job.output().outputs_of_type(file_type))
            .map(str::to_string);
        let from_actions = self
            .input_actions
            .iter()
            .filter(|action| action.output_type() == file_type)
            .filter_map(|action| action.input_arg().and_then(Arg::value))
            .map(str::to_string);
        from_jobs.chain(from_actions).collect()
    }

    /// Appends `paths` inline, or as a single `@<path>` reference to a fresh
    /// input file list when `use_file_list` is set.
    pub fn add_input_paths(
        &self,
        paths: Vec<String>,
        file_type: FileType,
        use_file_list: bool,
        arguments: &mut Vec<String>,
        filelists: &mut Vec<FilelistInfo>,
    ) -> DriverResult<()> {
        if !use_file_list {
            arguments.extend(paths);
            return Ok(());
        }
        let file = self.temporary_file_path("inputs", "")?;
        debug!(
            count = paths.len(),
            kind = self.source.kind().name(),
            "passing inputs through a file list"
        );
        arguments.push(format!("@{}", file.display_path()));
        filelists.push(FilelistInfo::paths(file, FilelistKind::Input, file_type, paths));
        Ok(())
    }

    /// Appends `-o <path>` for every main output.
    pub fn add_primary_output_arguments(&self, arguments: &mut Vec<String>) {
        for output in self.output.primary_output_filenames() {
            arguments.push("-o".to_string());
            arguments.push(output.to_string());
        }
    }

    /// Appends the frontend's input and output arguments to `arguments`,
    /// recording every file list used in `filelists`.
    ///
    /// Inputs and outputs are decided independently: a job may list its
    /// inputs and pass its outputs inline, or the reverse.
    pub fn add_frontend_input_and_output_arguments(
        &self,
        arguments: &mut Vec<String>,
        filelists: &mut Vec<FilelistInfo>,
    ) -> DriverResult<()> {
        self.add_frontend_input_arguments(arguments, filelists)?;
        self.add_frontend_output_arguments(arguments, filelists)
    }

    fn add_frontend_input_arguments(
        &self,
        arguments: &mut Vec<String>,
        filelists: &mut Vec<FilelistInfo>,
    ) -> DriverResult<()> {
        let use_file_list = self.should_use_input_file_list();
        let use_primary_file_list = self.should_use_primary_input_file_list();
        let filter = self.should_filter_inputs_by_type();
        let primaries = self.primary_input_paths();

        let inputs: Vec<&InputPair> = self
            .top_level_input_files()
            .iter()
            .filter(|input| !filter || input.file_type.is_part_of_swift_compilation())
            .collect();

        if use_file_list {
            let file = self.all_sources_path()?;
            debug!(
                count = inputs.len(),
                path = %file.path().display(),
                "passing inputs through a file list"
            );
            arguments.push(format!("@{}", file.display_path()));
            filelists.push(FilelistInfo::paths(
                file,
                FilelistKind::Input,
                FileType::Swift,
                inputs.iter().map(|input| input.path.clone()).collect(),
            ));
        }

        let mut listed_primaries = Vec::new();
        for input in &inputs {
            let is_primary = primaries.contains(input.path.as_str());
            if is_primary {
                if use_primary_file_list {
                    listed_primaries.push(input.path.clone());
                } else {
                    arguments.push("-primary-file".to_string());
                    arguments.push(input.path.clone());
                }
            }
            if (!is_primary || use_primary_file_list) && !use_file_list {
                arguments.push(input.path.clone());
            }
        }

        if use_primary_file_list {
            let file = self.temporary_file_path("primaryInputs", "")?;
            debug!(
                count = listed_primaries.len(),
                path = %file.path().display(),
                "passing primary inputs through a file list"
            );
            arguments.push("-primary-filelist".to_string());
            arguments.push(format!("@{}", file.display_path()));
            filelists.push(FilelistInfo::paths(
                file,
                FilelistKind::PrimaryInput,
                FileType::Swift,
                listed_primaries,
            ));
        }
        Ok(())
    }

    fn add_frontend_output_arguments(
        &self,
        arguments: &mut Vec<String>,
        filelists: &mut Vec<FilelistInfo>,
    ) -> DriverResult<()> {
        let outputs = self.output.primary_output_filenames();
        if self.should_use_main_output_file_list() {
            let file = self.temporary_file_path("outputs", "")?;
            debug!(count = outputs.len(), "passing outputs through a file list");
            arguments.push("-output-filelist".to_string());
            arguments.push(format!("@{}", file.display_path()));
            filelists.push(FilelistInfo::paths(
                file,
                FilelistKind::Output,
                self.output.primary_output_type(),
                outputs.iter().map(|s| s.to_string()).collect(),
            ));
        } else {
            self.add_primary_output_arguments(arguments);
        }

        if self.should_use_supplementary_output_file_list() {
            let file = self.temporary_file_path("supplementaryOutputs", "")?;
            debug!(
                count = self.output.supplementary_output_count(),
                "passing supplementary outputs through an output file map"
            );
            arguments.push("-supplementary-output-file-map".to_string());
            arguments.push(format!("@{}", file.display_path()));
            filelists.push(FilelistInfo::output_map(
                file,
                self.output.supplementary_output_map(),
            ));
        } else {
            for file_type in FileType::all() {
                let Some(flag) = file_type.supplementary_output_flag() else {
                    continue;
                };
                for path in self.output.supplementary_outputs_of_type(file_type) {
                    arguments.push(flag.to_string());
                    arguments.push(path.to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compilation(mode: CompilerMode, count: usize) -> (Compilation, Vec<Arc<Action>>) {
        let mut args = ArgList::new();
        let mut actions = Vec::new();
        let mut builder_inputs = Vec::new();
        for i in 0..count {
            let path = format!("f{i}.swift");
            actions.push(Action::input(args.push_input(path.clone()), FileType::Swift));
            builder_inputs.push(path);
        }
        let info = OutputInfo::new(mode, FileType::Object, "M");
        let mut builder = Compilation::builder(args, info);
        for path in builder_inputs {
            builder = builder.input(FileType::Swift, path);
        }
        (builder.build(), actions)
    }

    #[test]
    fn input_threshold_boundary() {
        for (count, expected) in [(128, false), (129, true)] {
            let (c, actions) = compilation(CompilerMode::StandardCompile, count);
            let compile = Action::compile(FileType::Object, vec![actions[0].clone()]);
            let output = CommandOutput::new(FileType::Object);
            let ctx = JobContext::new(
                &compile,
                &c,
                &[],
                &actions[..1],
                &output,
                c.output_info(),
            );
            assert_eq!(ctx.should_use_input_file_list(), expected, "count {count}");
        }
    }

    #[test]
    fn primary_list_needs_batch_mode() {
        let (c, actions) = compilation(CompilerMode::StandardCompile, 129);
        let compile = Action::compile(FileType::Object, actions.clone());
        let output = CommandOutput::new(FileType::Object);
        let standard = c.output_info().clone();
        let batch = standard.with_mode(CompilerMode::BatchModeCompile);
        let ctx = JobContext::new(&compile, &c, &[], &actions, &output, &standard);
        assert!(!ctx.should_use_primary_input_file_list());
        let ctx = JobContext::new(&compile, &c, &[], &actions, &output, &batch);
        assert!(ctx.should_use_primary_input_file_list());
        let ctx = JobContext::new(&compile, &c, &[], &actions[..128], &output, &batch);
        assert!(!ctx.should_use_primary_input_file_list());
    }

    #[test]
    fn whole_module_does_not_filter() {
        let (c, actions) = compilation(CompilerMode::SingleCompile, 1);
        let compile = Action::compile(FileType::Object, actions.clone());
        let output = CommandOutput::new(FileType::Object);
        let ctx = JobContext::new(&compile, &c, &[], &actions, &output, c.output_info());
        assert!(!ctx.should_filter_inputs_by_type());
        assert!(!ctx.may_have_primary_inputs());
    }

    #[test]
    fn frontend_modes() {
        let (c, actions) = compilation(CompilerMode::StandardCompile, 1);
        let compile = Action::compile(FileType::Object, actions.clone());
        let output = CommandOutput::new(FileType::Object);
        let cases = [
            (FileType::Object, "-c"),
            (FileType::LlvmBc, "-emit-bc"),
            (FileType::Assembly, "-S"),
            (FileType::SwiftModule, "-emit-module"),
            (FileType::Nothing, "-typecheck"),
        ];
        for (ty, mode) in cases {
            let mut info = c.output_info().clone();
            info.compiler_output_type = ty;
            let ctx = JobContext::new(&compile, &c, &[], &actions, &output, &info);
            assert_eq!(ctx.compute_frontend_mode_for_compile(), mode);
        }
    }

    #[test]
    fn standard_compile_marks_one_primary() {
        let (c, actions) = compilation(CompilerMode::StandardCompile, 3);
        let compile = Action::compile(FileType::Object, vec![actions[1].clone()]);
        let mut output = CommandOutput::new(FileType::Object);
        output.add_primary_output("f1.swift", "f1.o");
        output.set_supplementary_output("f1.swift", FileType::SwiftDeps, "f1.swiftdeps");
        let ctx = JobContext::new(&compile, &c, &[], &actions[1..2], &output, c.output_info());
        let mut args = Vec::new();
        let mut lists = Vec::new();
        ctx.add_frontend_input_and_output_arguments(&mut args, &mut lists)
            .unwrap();
        assert_eq!(
            args,
            vec![
                "f0.swift",
                "-primary-file",
                "f1.swift",
                "f2.swift",
                "-o",
                "f1.o",
                "-emit-reference-dependencies-path",
                "f1.swiftdeps",
            ]
        );
        assert!(lists.is_empty());
    }

    #[test]
    fn filtered_mode_drops_objects() {
        let mut args = ArgList::new();
        let a = Action::input(args.push_input("a.swift"), FileType::Swift);
        args.push_input("b.o");
        let info = OutputInfo::new(CompilerMode::StandardCompile, FileType::Object, "M");
        let c = Compilation::builder(args, info)
            .input(FileType::Swift, "a.swift")
            .input(FileType::Object, "b.o")
            .build();
        let compile = Action::compile(FileType::Object, vec![a.clone()]);
        let output = CommandOutput::new(FileType::Object);
        let actions = [a];
        let ctx = JobContext::new(&compile, &c, &[], &actions, &output, c.output_info());
        let mut out = Vec::new();
        let mut lists = Vec::new();
        ctx.add_frontend_input_and_output_arguments(&mut out, &mut lists)
            .unwrap();
        assert_eq!(out, vec!["-primary-file", "a.swift"]);
    }
}
