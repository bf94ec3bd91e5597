//! Job construction for the Skiff compiler driver.
//!
//! A [`ToolChain`] turns abstract [`Action`]s (compile, merge-module, link, ...)
//! into concrete [`Job`]s: an executable, an argument vector, environment
//! overrides, and the file lists that must exist on disk before the process
//! is spawned. The toolchain also decides when single-file compile jobs can be
//! merged into one batch job.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use skiff_driver::{
//!     Action, ArgList, CommandOutput, Compilation, CompilerMode, OutputInfo, ToolChain, Triple,
//! };
//! use skiff_common::FileType;
//!
//! let triple = Triple::parse("x86_64-unknown-linux-gnu");
//! let toolchain = ToolChain::for_triple(triple, "/usr/bin/swift");
//!
//! let mut args = ArgList::new();
//! let input = args.push_input("main.swift");
//! let info = OutputInfo::new(CompilerMode::StandardCompile, FileType::Object, "main");
//! let compilation = Compilation::builder(args, info)
//!     .input(FileType::Swift, "main.swift")
//!     .build();
//!
//! let source = Action::input(input, FileType::Swift);
//! let compile = Action::compile(FileType::Object, vec![source.clone()]);
//! let mut output = CommandOutput::new(FileType::Object);
//! output.add_primary_output("main.swift", "main.o");
//!
//! let job = toolchain
//!     .construct_job(&compile, &compilation, Vec::new(), &[source], output, compilation.output_info())
//!     .unwrap();
//! println!("{}", job.command_line());
//! ```

#![warn(missing_docs)]

pub mod action;
pub mod args;
pub mod compilation;
pub mod error;
pub mod filelist;
pub mod invocation;
pub mod job;
pub mod job_context;
pub mod output;
pub mod platform;
pub mod toolchain;
pub mod triple;

pub use action::{Action, ActionKind, LinkKind, ReplMode};
pub use args::{Arg, ArgList};
pub use compilation::{Compilation, CompilationBuilder, InputPair, TemporaryFile};
pub use error::{DriverError, DriverResult};
pub use filelist::{write_filelist, write_job_filelists};
pub use invocation::{FilelistContents, FilelistFormat, FilelistInfo, FilelistKind, InvocationInfo};
pub use job::{escape_argument, Job, ResponseFileInfo};
pub use job_context::{JobContext, TOO_MANY_FILES};
pub use output::{CommandInputPair, CommandOutput, CompilerMode, DebugInfoLevel, OutputInfo};
pub use platform::{platform_for_triple, Darwin, GenericUnix, Platform, Unsupported};
pub use toolchain::{ToolChain, SWIFT_EXECUTABLE_NAME};
pub use triple::Triple;
