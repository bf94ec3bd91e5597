//! Linux and other ELF platforms, linked through `clang`.

use std::path::{Path, PathBuf};

use skiff_common::FileType;

use crate::action::LinkKind;
use crate::args::opt;
use crate::error::DriverResult;
use crate::invocation::InvocationInfo;
use crate::job_context::JobContext;
use crate::toolchain::ToolChain;
use crate::triple::Triple;

use super::{sanitizer_runtime_name, Platform};

/// ELF platforms: `clang` as the link driver, `ar` for archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericUnix;

impl GenericUnix {
    fn construct_static_link(&self, context: &JobContext<'_>) -> DriverResult<InvocationInfo> {
        let mut invocation = InvocationInfo::new("ar");
        let arguments = &mut invocation.arguments;
        arguments.push("crs".to_string());
        if let Some(output) = context.output.primary_output_filename() {
            arguments.push(output.to_string());
        }
        context.add_input_paths(
            context.input_paths_of_type(FileType::Object),
            FileType::Object,
            context.should_use_link_input_file_list(),
            arguments,
            &mut invocation.filelist_infos,
        )?;
        Ok(invocation)
    }
}

impl Platform for GenericUnix {
    fn name(&self) -> &str {
        "unix"
    }

    fn construct_link_invocation(
        &self,
        context: &JobContext<'_>,
        kind: LinkKind,
        toolchain: &ToolChain,
    ) -> DriverResult<InvocationInfo> {
        if kind == LinkKind::StaticLibrary {
            return self.construct_static_link(context);
        }

        let args = context.args();
        let triple = toolchain.triple();
        let mut invocation = InvocationInfo::new("clang").allowing_response_files();
        let arguments = &mut invocation.arguments;

        if kind == LinkKind::DynamicLibrary {
            arguments.push("-shared".to_string());
        }
        if let Some(linker) = args.last_arg_value(opt::USE_LD) {
            arguments.push(format!("-fuse-ld={linker}"));
        }
        arguments.push(format!("--target={triple}"));

        context.add_input_paths(
            context.input_paths_of_type(FileType::Object),
            FileType::Object,
            context.should_use_link_input_file_list(),
            arguments,
            &mut invocation.filelist_infos,
        )?;
        for autolink in context.input_paths_of_type(FileType::AutolinkFile) {
            arguments.push(format!("@{autolink}"));
        }

        args.add_all_args(arguments, &[opt::XLINKER, opt::L_LIB, opt::FRAMEWORK]);
        args.add_all_args(arguments, &[opt::F, opt::FSYSTEM]);

        let static_stdlib = args.has_arg(opt::STATIC_STDLIB);
        let runtime_dir = toolchain.runtime_library_path(args, static_stdlib);
        arguments.push("-L".to_string());
        arguments.push(runtime_dir.display().to_string());
        if !static_stdlib && !args.has_arg(opt::NO_TOOLCHAIN_STDLIB_RPATH) {
            for value in ["-Xlinker", "-rpath", "-Xlinker"] {
                arguments.push(value.to_string());
            }
            arguments.push(runtime_dir.display().to_string());
        }
        arguments.push(
            runtime_dir
                .join(triple.arch())
                .join("swiftrt.o")
                .display()
                .to_string(),
        );

        let resource_dir = toolchain.resource_dir(args);
        for sanitizer in toolchain.supported_sanitizers(args) {
            if let Some(lib) = self.sanitizer_runtime_lib_path(triple, &resource_dir, &sanitizer, false)
            {
                arguments.push(lib.display().to_string());
            }
        }
        if args.has_arg(opt::PROFILE_GENERATE) {
            arguments.push(
                clang_runtime_dir(&resource_dir, triple)
                    .join(format!("libclang_rt.profile-{}.a", triple.arch()))
                    .display()
                    .to_string(),
            );
        }

        args.add_all_args(arguments, &[opt::L_PATH]);
        if let Some(sdk) = &context.output_info.sdk_path {
            arguments.push("--sysroot".to_string());
            arguments.push(sdk.display().to_string());
        }
        if static_stdlib {
            arguments.push(format!(
                "@{}",
                runtime_dir.join("static-stdlib-args.lnk").display()
            ));
        }
        context.add_primary_output_arguments(arguments);
        Ok(invocation)
    }

    fn sanitizer_runtime_lib_path(
        &self,
        triple: &Triple,
        resource_dir: &Path,
        sanitizer: &str,
        _shared: bool,
    ) -> Option<PathBuf> {
        let name = format!(
            "libclang_rt.{}-{}.a",
            sanitizer_runtime_name(sanitizer),
            triple.arch()
        );
        Some(clang_runtime_dir(resource_dir, triple).join(name))
    }

    fn library_path_env_var(&self) -> Option<&'static str> {
        Some("LD_LIBRARY_PATH")
    }
}

fn clang_runtime_dir(resource_dir: &Path, triple: &Triple) -> PathBuf {
    resource_dir.join("clang").join("lib").join(triple.os_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn sanitizer_runtime_lookup_uses_arch_name() {
        let dir = tempfile::tempdir().unwrap();
        let triple = Triple::parse("x86_64-unknown-linux-gnu");
        let lib_dir = dir.path().join("clang").join("lib").join("linux");
        fs::create_dir_all(&lib_dir).unwrap();
        fs::write(lib_dir.join("libclang_rt.asan-x86_64.a"), "").unwrap();

        assert!(GenericUnix.sanitizer_runtime_lib_exists(&triple, dir.path(), "address", true));
        assert!(!GenericUnix.sanitizer_runtime_lib_exists(&triple, dir.path(), "thread", true));
    }

    #[test]
    fn loader_variable() {
        assert_eq!(GenericUnix.library_path_env_var(), Some("LD_LIBRARY_PATH"));
    }
}
