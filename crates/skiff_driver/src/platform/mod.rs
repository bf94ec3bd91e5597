//! Target platform specializations.
//!
//! The [`Platform`] trait holds everything the generic toolchain cannot know:
//! how to link, where to look for tools that are not next to the driver, and
//! where sanitizer runtimes live. Use [`platform_for_triple`] to pick one.

pub mod darwin;
pub mod search;
pub mod unix;

use std::fmt;
use std::path::{Path, PathBuf};

use skiff_common::InternalError;

use crate::action::LinkKind;
use crate::error::DriverResult;
use crate::invocation::InvocationInfo;
use crate::job_context::JobContext;
use crate::toolchain::ToolChain;
use crate::triple::Triple;

pub use darwin::Darwin;
pub use unix::GenericUnix;

/// Platform-specific parts of job construction.
pub trait Platform: fmt::Debug + Send + Sync {
    /// Short platform name for logs.
    fn name(&self) -> &str;

    /// Builds the link invocation. Platforms without a linker model report a
    /// fatal "not implemented" error.
    fn construct_link_invocation(
        &self,
        context: &JobContext<'_>,
        kind: LinkKind,
        toolchain: &ToolChain,
    ) -> DriverResult<InvocationInfo> {
        let _ = (context, kind, toolchain);
        Err(InternalError::not_implemented("link").into())
    }

    /// Looks for a tool that is not next to the driver.
    fn resolve_program_fallback(&self, name: &str, driver_dir: &Path) -> Option<PathBuf> {
        let _ = driver_dir;
        search::find_executable_in_path(name)
    }

    /// Where the runtime library for `sanitizer` would be, if this platform
    /// has sanitizer runtimes at all.
    fn sanitizer_runtime_lib_path(
        &self,
        triple: &Triple,
        resource_dir: &Path,
        sanitizer: &str,
        shared: bool,
    ) -> Option<PathBuf> {
        let _ = (triple, resource_dir, sanitizer, shared);
        None
    }

    /// Returns `true` if the runtime library for `sanitizer` is installed.
    fn sanitizer_runtime_lib_exists(
        &self,
        triple: &Triple,
        resource_dir: &Path,
        sanitizer: &str,
        shared: bool,
    ) -> bool {
        self.sanitizer_runtime_lib_path(triple, resource_dir, sanitizer, shared)
            .is_some_and(|path| path.exists())
    }

    /// Environment variable the dynamic loader searches for libraries.
    fn library_path_env_var(&self) -> Option<&'static str> {
        None
    }
}

/// A platform with no specialization. Everything but linking works.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl Platform for Unsupported {
    fn name(&self) -> &str {
        "unsupported"
    }
}

/// Short runtime name of a `-sanitize=` value (`address` is `asan`).
pub fn sanitizer_runtime_name(sanitizer: &str) -> &str {
    match sanitizer {
        "address" => "asan",
        "thread" => "tsan",
        "undefined" => "ubsan",
        other => other,
    }
}

/// Picks the platform specialization for `triple`.
pub fn platform_for_triple(triple: &Triple) -> Box<dyn Platform> {
    if triple.is_os_darwin() {
        return Box::new(Darwin);
    }
    match triple.os_name() {
        "linux" | "freebsd" | "openbsd" | "netbsd" | "android" | "haiku" | "cygwin" => {
            Box::new(GenericUnix)
        }
        _ => Box::new(Unsupported),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_by_triple() {
        let name = |t: &str| platform_for_triple(&Triple::parse(t)).name().to_string();
        assert_eq!(name("arm64-apple-macosx13.0"), "darwin");
        assert_eq!(name("x86_64-unknown-linux-gnu"), "unix");
        assert_eq!(name("wasm32-unknown-wasi"), "unsupported");
    }

    #[test]
    fn unsupported_has_no_sanitizers() {
        let dir = tempfile::tempdir().unwrap();
        let triple = Triple::parse("wasm32-unknown-wasi");
        assert!(!Unsupported.sanitizer_runtime_lib_exists(&triple, dir.path(), "address", true));
        assert_eq!(Unsupported.library_path_env_var(), None);
    }

    #[test]
    fn runtime_names() {
        assert_eq!(sanitizer_runtime_name("address"), "asan");
        assert_eq!(sanitizer_runtime_name("fuzzer"), "fuzzer");
    }
}
