//! Apple platforms, linked with `ld` and archived with `libtool`.

use std::path::{Path, PathBuf};

use skiff_common::FileType;

use crate::action::LinkKind;
use crate::args::opt;
use crate::error::DriverResult;
use crate::invocation::InvocationInfo;
use crate::job_context::JobContext;
use crate::toolchain::ToolChain;
use crate::triple::Triple;

use super::{sanitizer_runtime_name, search, Platform};

/// macOS, iOS, tvOS and watchOS.
#[derive(Debug, Clone, Copy, Default)]
pub struct Darwin;

impl Darwin {
    fn construct_static_link(&self, context: &JobContext<'_>) -> DriverResult<InvocationInfo> {
        let mut invocation = InvocationInfo::new("libtool").allowing_response_files();
        let arguments = &mut invocation.arguments;
        arguments.push("-static".to_string());
        context.add_input_paths(
            context.input_paths_of_type(FileType::Object),
            FileType::Object,
            context.should_use_link_input_file_list(),
            arguments,
            &mut invocation.filelist_infos,
        )?;
        context.add_primary_output_arguments(arguments);
        Ok(invocation)
    }
}

/// The linker's minimum-deployment flag and the version to pass with it.
fn version_min(triple: &Triple) -> (&'static str, String) {
    let (flag, default) = match (triple.os_name(), triple.is_simulator()) {
        ("ios", false) => ("-ios_version_min", "7.0"),
        ("ios", true) => ("-ios_simulator_version_min", "7.0"),
        ("tvos", false) => ("-tvos_version_min", "9.0"),
        ("tvos", true) => ("-tvos_simulator_version_min", "9.0"),
        ("watchos", false) => ("-watchos_version_min", "2.0"),
        ("watchos", true) => ("-watchos_simulator_version_min", "2.0"),
        _ => ("-macosx_version_min", "10.9"),
    };
    let version = triple.os_version().unwrap_or(default).to_string();
    (flag, version)
}

impl Platform for Darwin {
    fn name(&self) -> &str {
        "darwin"
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
        let mut invocation = InvocationInfo::new("ld").allowing_response_files();
        let arguments = &mut invocation.arguments;

        context.add_input_paths(
            context.input_paths_of_type(FileType::Object),
            FileType::Object,
            context.should_use_link_input_file_list(),
            arguments,
            &mut invocation.filelist_infos,
        )?;

        args.add_all_arg_values(arguments, &[opt::XLINKER]);
        for lib in args.all_values(opt::L_LIB) {
            arguments.push(format!("-l{lib}"));
        }
        args.add_all_args(arguments, &[opt::FRAMEWORK, opt::F, opt::FSYSTEM]);

        if kind == LinkKind::DynamicLibrary {
            arguments.push("-dylib".to_string());
        }
        arguments.push("-arch".to_string());
        arguments.push(triple.arch().to_string());

        let resource_dir = toolchain.resource_dir(args);
        for sanitizer in toolchain.supported_sanitizers(args) {
            if let Some(lib) = self.sanitizer_runtime_lib_path(triple, &resource_dir, &sanitizer, true)
            {
                if let Some(dir) = lib.parent() {
                    arguments.push("-rpath".to_string());
                    arguments.push(dir.display().to_string());
                }
                arguments.push(lib.display().to_string());
            }
        }

        if let Some(sdk) = &context.output_info.sdk_path {
            arguments.push("-syslibroot".to_string());
            arguments.push(sdk.display().to_string());
        }
        arguments.push("-lobjc".to_string());
        arguments.push("-lSystem".to_string());

        let static_stdlib = args.has_arg(opt::STATIC_STDLIB);
        let runtime_dir = toolchain.runtime_library_path(args, static_stdlib);
        arguments.push("-L".to_string());
        arguments.push(runtime_dir.display().to_string());
        if !static_stdlib && !args.has_arg(opt::NO_TOOLCHAIN_STDLIB_RPATH) {
            arguments.push("-rpath".to_string());
            arguments.push(runtime_dir.display().to_string());
        }
        args.add_all_args(arguments, &[opt::L_PATH]);

        let (flag, version) = version_min(triple);
        arguments.push(flag.to_string());
        arguments.push(version);
        arguments.push("-no_objc_category_merging".to_string());

        context.add_primary_output_arguments(arguments);
        Ok(invocation)
    }

    /// Tools not next to the driver are looked up in the developer directory
    /// of the Xcode that contains the driver's toolchain, then on `PATH`.
    fn resolve_program_fallback(&self, name: &str, driver_dir: &Path) -> Option<PathBuf> {
        let toolchain_root = driver_dir.ancestors().find(|dir| {
            dir.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xctoolchain"))
        });
        if let Some(developer) = toolchain_root
            .and_then(Path::parent)
            .and_then(Path::parent)
        {
            let dirs = [developer.join("usr").join("bin")];
            if let Some(found) = search::find_executable_in_dirs(name, &dirs) {
                return Some(found);
            }
        }
        search::find_executable_in_path(name)
    }

    fn sanitizer_runtime_lib_path(
        &self,
        triple: &Triple,
        resource_dir: &Path,
        sanitizer: &str,
        shared: bool,
    ) -> Option<PathBuf> {
        let suffix = if shared { "_dynamic.dylib" } else { ".a" };
        let name = format!(
            "libclang_rt.{}_{}{}",
            sanitizer_runtime_name(sanitizer),
            triple.darwin_library_suffix(),
            suffix
        );
        Some(
            resource_dir
                .join("clang")
                .join("lib")
                .join("darwin")
                .join(name),
        )
    }

    fn library_path_env_var(&self) -> Option<&'static str> {
        Some("DYLD_LIBRARY_PATH")
    }
}
