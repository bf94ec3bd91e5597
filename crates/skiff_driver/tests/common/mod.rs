//! Shared fixtures for driver integration tests.
//!
//! A [`Fixture`] lays out a fake toolchain in a temporary directory: a driver
//! at `usr/bin/swift`, stub tools next to it, and a scratch directory for
//! file lists. Nothing is ever executed.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use skiff_common::FileType;
use skiff_driver::{
    Action, ArgList, CommandOutput, Compilation, CompilerMode, FilelistContents, Job, OutputInfo,
    ToolChain, Triple,
};
use tempfile::TempDir;

/// Tools installed next to the fake driver.
pub const STUB_TOOLS: &[&str] = &[
    "clang",
    "ar",
    "ld",
    "libtool",
    "dsymutil",
    "dwarfdump",
    "swift-autolink-extract",
    "lldb",
];

pub struct Fixture {
    pub root: TempDir,
    pub toolchain: ToolChain,
}

impl Fixture {
    pub fn linux() -> Self {
        Self::with_triple("x86_64-unknown-linux-gnu")
    }

    pub fn darwin() -> Self {
        Self::with_triple("arm64-apple-macosx13.0")
    }

    pub fn with_triple(triple: &str) -> Self {
        let root = install_toolchain(STUB_TOOLS);
        let driver = root.path().join("usr").join("bin").join("swift");
        let toolchain = ToolChain::for_triple(Triple::parse(triple), driver);
        Self { root, toolchain }
    }

    /// Lowers the command-line length above which response files are used.
    pub fn with_command_line_limit(self, limit: usize) -> Self {
        let Self { root, toolchain } = self;
        Self {
            root,
            toolchain: toolchain.with_command_line_limit(limit),
        }
    }

    pub fn driver(&self) -> PathBuf {
        self.bin_dir().join("swift")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.path().join("usr").join("bin")
    }

    pub fn tmp(&self) -> PathBuf {
        self.root.path().join("tmp")
    }
}

/// Creates `usr/bin/swift` plus `tools` and a `tmp` directory.
pub fn install_toolchain(tools: &[&str]) -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let bin = root.path().join("usr").join("bin");
    fs::create_dir_all(&bin).unwrap();
    fs::create_dir_all(root.path().join("tmp")).unwrap();
    make_executable(&bin.join("swift"));
    for tool in tools {
        make_executable(&bin.join(tool));
    }
    root
}

pub fn make_executable(path: &Path) {
    fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

/// A compilation over `count` Swift files named `f0.swift`, `f1.swift`, ...
pub struct Sources {
    pub compilation: Compilation,
    pub actions: Vec<Arc<Action>>,
}

impl Sources {
    pub fn new(fixture: &Fixture, count: usize, mode: CompilerMode) -> Self {
        Self::with_args(fixture, count, mode, ArgList::new())
    }

    pub fn with_args(fixture: &Fixture, count: usize, mode: CompilerMode, mut args: ArgList) -> Self {
        let mut actions = Vec::with_capacity(count);
        let mut paths = Vec::with_capacity(count);
        for i in 0..count {
            let path = format!("f{i}.swift");
            actions.push(Action::input(args.push_input(path.clone()), FileType::Swift));
            paths.push(path);
        }
        let info = OutputInfo::new(mode, FileType::Object, "Main");
        let mut builder = Compilation::builder(args, info).temp_dir(fixture.tmp());
        for path in paths {
            builder = builder.input(FileType::Swift, path);
        }
        Self {
            compilation: builder.build(),
            actions,
        }
    }

    pub fn path(&self, index: usize) -> String {
        format!("f{index}.swift")
    }

    /// The single-primary compile job for input `index`, producing
    /// `f<index>.o` and `f<index>.swiftdeps`.
    pub fn compile_job(&self, toolchain: &ToolChain, index: usize) -> Job {
        let input = Arc::clone(&self.actions[index]);
        let action = Action::compile(FileType::Object, vec![Arc::clone(&input)]);
        let mut output = CommandOutput::new(FileType::Object);
        let path = self.path(index);
        output.add_primary_output(path.clone(), format!("f{index}.o"));
        output.set_supplementary_output(path, FileType::SwiftDeps, format!("f{index}.swiftdeps"));
        toolchain
            .construct_job(
                &action,
                &self.compilation,
                Vec::new(),
                &[input],
                output,
                self.compilation.output_info(),
            )
            .unwrap()
    }

    pub fn compile_jobs(&self, toolchain: &ToolChain) -> Vec<Arc<Job>> {
        (0..self.actions.len())
            .map(|i| Arc::new(self.compile_job(toolchain, i)))
            .collect()
    }
}

/// The paths of a line-format file list.
pub fn listed_paths(contents: &FilelistContents) -> &[String] {
    match contents {
        FilelistContents::Paths(paths) => paths,
        FilelistContents::OutputMap(_) => panic!("expected a path list, got an output file map"),
    }
}

/// Arguments that reference a file through `@`.
pub fn at_references(arguments: &[String]) -> Vec<&String> {
    arguments.iter().filter(|a| a.starts_with('@')).collect()
}

/// The argument following the first occurrence of `flag`.
pub fn value_after<'a>(arguments: &'a [String], flag: &str) -> Option<&'a str> {
    arguments
        .iter()
        .position(|a| a == flag)
        .and_then(|i| arguments.get(i + 1))
        .map(String::as_str)
}
