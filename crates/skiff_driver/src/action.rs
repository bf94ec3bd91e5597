//! Actions: abstract compilation steps, before anything is known about how to
//! run them.

use std::path::PathBuf;
use std::sync::Arc;

use skiff_common::FileType;

use crate::args::Arg;

/// How a REPL job should be run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReplMode {
    /// Always use the frontend's integrated REPL.
    Integrated,
    /// Use LLDB when it can be found, otherwise the integrated REPL.
    PreferLldb,
    /// Always use LLDB.
    RequireLldb,
}

/// The kind of product a link action creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// An executable image.
    Executable,
    /// A shared library.
    DynamicLibrary,
    /// A static archive.
    StaticLibrary,
}

/// The kind of an [`Action`], one variant per invocation rule plus inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// A file named on the command line. Never becomes a job.
    Input {
        /// The argument that named the file.
        arg: Arg,
    },
    /// Compile sources to the compiler output type.
    Compile,
    /// Run sources immediately.
    Interpret,
    /// Lower LLVM bitcode to native output.
    Backend,
    /// Merge partial modules into one module.
    MergeModule,
    /// Wrap a module into an object file for the debugger.
    ModuleWrap,
    /// Start a REPL.
    Repl(ReplMode),
    /// Produce a debug-symbol bundle from a linked image.
    GenerateDsym,
    /// Verify the debug info in a debug-symbol bundle.
    VerifyDebugInfo,
    /// Precompile a bridging header.
    GeneratePch {
        /// Directory for a persistent PCH; `None` writes a single output file.
        persistent_dir: Option<PathBuf>,
    },
    /// Extract autolink entries from object files.
    AutolinkExtract,
    /// Link objects into an image or archive.
    Link(LinkKind),
}

impl ActionKind {
    /// A short, stable name for messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Input { .. } => "input",
            ActionKind::Compile => "compile",
            ActionKind::Interpret => "interpret",
            ActionKind::Backend => "backend",
            ActionKind::MergeModule => "merge-module",
            ActionKind::ModuleWrap => "modulewrap",
            ActionKind::Repl(_) => "repl",
            ActionKind::GenerateDsym => "generate-dSYM",
            ActionKind::VerifyDebugInfo => "verify-debug-info",
            ActionKind::GeneratePch { .. } => "generate-pch",
            ActionKind::AutolinkExtract => "autolink-extract",
            ActionKind::Link(_) => "link",
        }
    }
}

/// One node of the action graph. Immutable once built and shared through
/// [`Arc`].
#[derive(Debug, PartialEq, Eq)]
pub struct Action {
    kind: ActionKind,
    output_type: FileType,
    inputs: Vec<Arc<Action>>,
}

impl Action {
    /// Creates an action of any kind.
    pub fn new(kind: ActionKind, output_type: FileType, inputs: Vec<Arc<Action>>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            output_type,
            inputs,
        })
    }

    /// An input file of the given type.
    pub fn input(arg: Arg, file_type: FileType) -> Arc<Self> {
        Self::new(ActionKind::Input { arg }, file_type, Vec::new())
    }

    /// A compile producing `output_type`.
    pub fn compile(output_type: FileType, inputs: Vec<Arc<Action>>) -> Arc<Self> {
        Self::new(ActionKind::Compile, output_type, inputs)
    }

    /// An immediate-mode run of `inputs`.
    pub fn interpret(inputs: Vec<Arc<Action>>) -> Arc<Self> {
        Self::new(ActionKind::Interpret, FileType::Nothing, inputs)
    }

    /// A backend job lowering `input` to `output_type`.
    pub fn backend(output_type: FileType, input: Arc<Action>) -> Arc<Self> {
        Self::new(ActionKind::Backend, output_type, vec![input])
    }

    /// A module merge over partial modules.
    pub fn merge_module(inputs: Vec<Arc<Action>>) -> Arc<Self> {
        Self::new(ActionKind::MergeModule, FileType::SwiftModule, inputs)
    }

    /// A module-wrap job over a merged module.
    pub fn module_wrap(input: Arc<Action>) -> Arc<Self> {
        Self::new(ActionKind::ModuleWrap, FileType::Object, vec![input])
    }

    /// A REPL session.
    pub fn repl(mode: ReplMode) -> Arc<Self> {
        Self::new(ActionKind::Repl(mode), FileType::Nothing, Vec::new())
    }

    /// A debug-symbol bundle for a linked image.
    pub fn generate_dsym(input: Arc<Action>) -> Arc<Self> {
        Self::new(ActionKind::GenerateDsym, FileType::DSym, vec![input])
    }

    /// A verification pass over a debug-symbol bundle.
    pub fn verify_debug_info(input: Arc<Action>) -> Arc<Self> {
        Self::new(ActionKind::VerifyDebugInfo, FileType::Nothing, vec![input])
    }

    /// A bridging-header precompile.
    pub fn generate_pch(header: Arc<Action>, persistent_dir: Option<PathBuf>) -> Arc<Self> {
        let output_type = if persistent_dir.is_some() {
            FileType::Nothing
        } else {
            FileType::Pch
        };
        Self::new(
            ActionKind::GeneratePch { persistent_dir },
            output_type,
            vec![header],
        )
    }

    /// Autolink extraction over object files.
    pub fn autolink_extract(inputs: Vec<Arc<Action>>) -> Arc<Self> {
        Self::new(ActionKind::AutolinkExtract, FileType::AutolinkFile, inputs)
    }

    /// A link producing `kind`.
    pub fn link(kind: LinkKind, inputs: Vec<Arc<Action>>) -> Arc<Self> {
        Self::new(ActionKind::Link(kind), FileType::Image, inputs)
    }

    /// The kind of this action.
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The type of file this action produces.
    pub fn output_type(&self) -> FileType {
        self.output_type
    }

    /// The actions this one consumes, in order.
    pub fn inputs(&self) -> &[Arc<Action>] {
        &self.inputs
    }

    /// Returns `true` for actions that become jobs.
    pub fn is_job_action(&self) -> bool {
        !matches!(self.kind, ActionKind::Input { .. })
    }

    /// The command-line argument of an input action.
    pub fn input_arg(&self) -> Option<&Arg> {
        match &self.kind {
            ActionKind::Input { arg } => Some(arg),
            _ => None,
        }
    }

    /// Returns the only source-language input action, or `None` if there are
    /// zero or several.
    pub fn find_single_swift_input(&self) -> Option<&Arc<Action>> {
        let mut found = None;
        for input in &self.inputs {
            if input.input_arg().is_some() && input.output_type.is_source_language() {
                if found.is_some() {
                    return None;
                }
                found = Some(input);
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ArgList;

    fn swift_input(args: &mut ArgList, path: &str) -> Arc<Action> {
        Action::input(args.push_input(path), FileType::Swift)
    }

    #[test]
    fn single_swift_input_found() {
        let mut args = ArgList::new();
        let a = swift_input(&mut args, "a.swift");
        let compile = Action::compile(FileType::Object, vec![a.clone()]);
        let found = compile.find_single_swift_input().unwrap();
        assert!(Arc::ptr_eq(found, &a));
    }

    #[test]
    fn two_swift_inputs_is_none() {
        let mut args = ArgList::new();
        let a = swift_input(&mut args, "a.swift");
        let b = swift_input(&mut args, "b.swift");
        let compile = Action::compile(FileType::Object, vec![a, b]);
        assert!(compile.find_single_swift_input().is_none());
    }

    #[test]
    fn sil_input_is_not_source() {
        let mut args = ArgList::new();
        let sil = Action::input(args.push_input("a.sil"), FileType::Sil);
        let compile = Action::compile(FileType::Object, vec![sil]);
        assert!(compile.find_single_swift_input().is_none());
    }

    #[test]
    fn non_source_inputs_are_ignored() {
        let mut args = ArgList::new();
        let a = swift_input(&mut args, "a.swift");
        let obj = Action::input(args.push_input("b.o"), FileType::Object);
        let compile = Action::compile(FileType::Object, vec![obj, a]);
        assert!(compile.find_single_swift_input().is_some());
    }

    #[test]
    fn kinds_and_names() {
        let mut args = ArgList::new();
        let a = swift_input(&mut args, "a.swift");
        assert!(!a.is_job_action());
        assert_eq!(a.kind().name(), "input");
        let link = Action::link(LinkKind::Executable, vec![a]);
        assert!(link.is_job_action());
        assert_eq!(link.kind().name(), "link");
        assert_eq!(link.output_type(), FileType::Image);
        assert_eq!(Action::repl(ReplMode::Integrated).kind().name(), "repl");
    }

    #[test]
    fn persistent_pch_has_no_output_file() {
        let mut args = ArgList::new();
        let header = Action::input(args.push_input("bridge.h"), FileType::ObjcHeader);
        let pch = Action::generate_pch(header.clone(), Some(PathBuf::from("/tmp/pch")));
        assert_eq!(pch.output_type(), FileType::Nothing);
        assert_eq!(Action::generate_pch(header, None).output_type(), FileType::Pch);
    }
}
