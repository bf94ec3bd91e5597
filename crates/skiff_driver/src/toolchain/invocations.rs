//! Invocation rules shared by every platform, one per action kind.
//! Linking is left to the platform.

use std::path::Path;

use skiff_common::FileType;

use crate::action::{ActionKind, LinkKind, ReplMode};
use crate::args::opt;
use crate::error::{DriverError, DriverResult};
use crate::invocation::InvocationInfo;
use crate::job::escape_argument;
use crate::job_context::JobContext;

use super::{ToolChain, SWIFT_EXECUTABLE_NAME};

fn push(arguments: &mut Vec<String>, values: &[&str]) {
    arguments.extend(values.iter().map(|v| v.to_string()));
}

/// Frontend options every frontend invocation receives.
fn add_common_frontend_args(toolchain: &ToolChain, context: &JobContext<'_>, out: &mut Vec<String>) {
    let args = context.args();
    let triple = toolchain.triple();

    push(out, &["-target", triple.as_str()]);
    if triple.is_os_darwin() {
        push(out, &["-enable-objc-interop"]);
    } else {
        push(out, &["-disable-objc-interop"]);
    }
    args.add_last_arg(out, &[opt::TARGET_CPU]);

    match (&context.output_info.sdk_path, args.last_arg_value(opt::SDK)) {
        (Some(sdk), _) => {
            out.push("-sdk".to_string());
            out.push(sdk.display().to_string());
        }
        (None, Some(sdk)) => push(out, &["-sdk", sdk]),
        (None, None) => {}
    }

    args.add_all_args(out, &[opt::I, opt::F, opt::FSYSTEM]);
    args.add_last_arg(out, opt::G_GROUP);
    args.add_last_arg(out, &[opt::DEBUG_INFO_FORMAT]);
    args.add_all_args(out, &[opt::DEBUG_PREFIX_MAP]);
    args.add_last_arg(out, &[opt::ENABLE_TESTING]);
    args.add_last_arg(out, &[opt::MODULE_CACHE_PATH]);
    args.add_last_arg(out, &[opt::MODULE_LINK_NAME]);
    args.add_last_arg(out, &[opt::SWIFT_VERSION]);
    args.add_last_arg(out, &[opt::WARNINGS_AS_ERRORS]);
    args.add_last_arg(out, &[opt::SUPPRESS_WARNINGS]);
    args.add_last_arg(out, &[opt::COLOR_DIAGNOSTICS]);
    args.add_last_arg(out, &[opt::PARSE_STDLIB]);
    args.add_last_arg(out, &[opt::ENFORCE_EXCLUSIVITY]);
    args.add_last_arg(out, &[opt::PROFILE_GENERATE]);
    args.add_all_args(out, &[opt::SANITIZE]);
    args.add_last_arg(out, &[opt::SANITIZE_COVERAGE]);
    args.add_last_arg(out, &[opt::INDEX_STORE_PATH]);
    args.add_last_arg(out, &[opt::WORKING_DIRECTORY]);
    args.add_last_arg(out, &[opt::RESOURCE_DIR]);
    args.add_all_args(out, &[opt::D]);
    args.add_last_arg(out, opt::O_GROUP);
    args.add_all_args(out, &[opt::XLLVM, opt::XCC]);
    args.add_all_arg_values(out, &[opt::XFRONTEND]);
}

fn add_module_name(context: &JobContext<'_>, out: &mut Vec<String>) {
    out.push("-module-name".to_string());
    out.push(context.output_info.module_name.clone());
}

fn frontend_invocation() -> InvocationInfo {
    InvocationInfo::new(SWIFT_EXECUTABLE_NAME).allowing_response_files()
}

/// `swift -frontend <mode> <inputs> <outputs> <common> -module-name M`.
pub(super) fn compile(toolchain: &ToolChain, context: &JobContext<'_>) -> DriverResult<InvocationInfo> {
    let args = context.args();
    let mut invocation = frontend_invocation();
    let out = &mut invocation.arguments;

    push(out, &["-frontend", context.compute_frontend_mode_for_compile()]);
    context.add_frontend_input_and_output_arguments(out, &mut invocation.filelist_infos)?;

    let building_library = matches!(
        context.output_info.link_kind,
        Some(LinkKind::DynamicLibrary | LinkKind::StaticLibrary)
    );
    if args.has_arg(opt::PARSE_AS_LIBRARY) || building_library {
        push(out, &["-parse-as-library"]);
    }
    args.add_last_arg(out, &[opt::PARSE_SIL]);
    add_common_frontend_args(toolchain, context, out);

    if let Some(header) = args.last_arg_value(opt::IMPORT_OBJC_HEADER) {
        out.push("-import-objc-header".to_string());
        let pch_job = context
            .inputs
            .iter()
            .find(|job| matches!(job.source().kind(), ActionKind::GeneratePch { .. }));
        match pch_job {
            Some(job) => match job.source().kind() {
                ActionKind::GeneratePch {
                    persistent_dir: Some(dir),
                } => {
                    out.push(header.to_string());
                    out.push("-pch-output-dir".to_string());
                    out.push(dir.display().to_string());
                }
                _ => {
                    let pch = job.output().primary_output_filename().unwrap_or(header);
                    out.push(pch.to_string());
                }
            },
            None => out.push(header.to_string()),
        }
    }

    add_module_name(context, out);
    Ok(invocation)
}

/// `swift -frontend -interpret`, with the loader pointed at `-L` paths and
/// the runtime.
pub(super) fn interpret(
    toolchain: &ToolChain,
    context: &JobContext<'_>,
) -> DriverResult<InvocationInfo> {
    let args = context.args();
    let mut invocation = frontend_invocation();
    let out = &mut invocation.arguments;

    push(out, &["-frontend", "-interpret"]);
    out.extend(context.input_paths_of_type(FileType::Swift));
    add_common_frontend_args(toolchain, context, out);
    add_module_name(context, out);
    args.add_all_args(out, &[opt::L_LIB, opt::FRAMEWORK]);
    // Arguments for the program being run go last.
    args.add_last_arg(out, &[opt::DASH_DASH]);

    if let Some(var) = toolchain.platform().library_path_env_var() {
        let mut paths: Vec<String> = args
            .all_values(opt::L_PATH)
            .into_iter()
            .map(str::to_string)
            .collect();
        paths.push(
            toolchain
                .runtime_library_path(args, false)
                .display()
                .to_string(),
        );
        invocation
            .extra_environment
            .push((var.to_string(), paths.join(":")));
    }
    Ok(invocation)
}

/// `swift -frontend <mode> -primary-file <bitcode> ... -embed-bitcode`.
pub(super) fn backend(toolchain: &ToolChain, context: &JobContext<'_>) -> DriverResult<InvocationInfo> {
    let bitcode = context
        .inputs
        .first()
        .and_then(|job| job.output().primary_output_filename())
        .ok_or_else(|| DriverError::internal("backend job needs a bitcode-producing input job"))?;

    let mut invocation = frontend_invocation();
    let out = &mut invocation.arguments;
    push(
        out,
        &[
            "-frontend",
            context.compute_frontend_mode_for_compile(),
            "-primary-file",
            bitcode,
        ],
    );
    add_common_frontend_args(toolchain, context, out);
    push(out, &["-embed-bitcode"]);
    add_module_name(context, out);
    context.add_primary_output_arguments(out);
    Ok(invocation)
}

/// `swift -frontend -merge-modules -emit-module <partial modules> ...`.
pub(super) fn merge_module(
    toolchain: &ToolChain,
    context: &JobContext<'_>,
) -> DriverResult<InvocationInfo> {
    let mut invocation = frontend_invocation();
    let out = &mut invocation.arguments;

    push(out, &["-frontend", "-merge-modules", "-emit-module"]);
    context.add_input_paths(
        context.input_paths_of_type(FileType::SwiftModule),
        FileType::SwiftModule,
        context.should_use_merge_module_input_file_list(),
        out,
        &mut invocation.filelist_infos,
    )?;
    // Partial modules are loaded as serialized ASTs and were already
    // optimized one by one.
    push(
        out,
        &[
            "-parse-as-library",
            "-disable-diagnostic-passes",
            "-disable-sil-perf-optzns",
        ],
    );
    add_common_frontend_args(toolchain, context, out);

    for file_type in [
        FileType::SwiftModuleDoc,
        FileType::SwiftModuleInterface,
        FileType::ObjcHeader,
        FileType::SerializedDiagnostics,
    ] {
        if let Some(flag) = file_type.supplementary_output_flag() {
            for path in context.output.supplementary_outputs_of_type(file_type) {
                push(out, &[flag, path]);
            }
        }
    }
    add_module_name(context, out);
    context.add_primary_output_arguments(out);
    Ok(invocation)
}

/// `swift -modulewrap <module> -target <triple> -o <object>`.
pub(super) fn module_wrap(
    toolchain: &ToolChain,
    context: &JobContext<'_>,
) -> DriverResult<InvocationInfo> {
    let mut invocation = frontend_invocation();
    let out = &mut invocation.arguments;
    out.push("-modulewrap".to_string());
    out.extend(context.input_paths_of_type(FileType::SwiftModule));
    push(out, &["-target", toolchain.triple().as_str()]);
    context.add_primary_output_arguments(out);
    Ok(invocation)
}

/// The integrated REPL, or LLDB with the frontend options squashed into a
/// single `--repl=` argument.
pub(super) fn repl(
    toolchain: &ToolChain,
    context: &JobContext<'_>,
    mode: ReplMode,
) -> DriverResult<InvocationInfo> {
    if !context.inputs.is_empty() || !context.input_actions.is_empty() {
        return Err(DriverError::internal("REPL jobs take no inputs"));
    }
    let use_lldb = match mode {
        ReplMode::Integrated => false,
        ReplMode::RequireLldb => true,
        ReplMode::PreferLldb => toolchain.find_program_relative_to_swift("lldb").is_ok(),
    };

    let args = context.args();
    let mut frontend_args = Vec::new();
    add_common_frontend_args(toolchain, context, &mut frontend_args);
    args.add_all_args(&mut frontend_args, &[opt::L_LIB, opt::FRAMEWORK, opt::L_PATH]);

    if !use_lldb {
        let mut arguments = vec!["-frontend".to_string(), "-repl".to_string()];
        arguments.append(&mut frontend_args);
        add_module_name(context, &mut arguments);
        return Ok(InvocationInfo::with_arguments(SWIFT_EXECUTABLE_NAME, arguments));
    }

    let squashed: Vec<String> = frontend_args.iter().map(|a| escape_argument(a)).collect();
    Ok(InvocationInfo::with_arguments(
        "lldb",
        vec![format!("--repl={}", squashed.join(" "))],
    ))
}

fn expect_single_input_job(context: &JobContext<'_>, what: &str) -> DriverResult<()> {
    if context.inputs.len() != 1 || !context.input_actions.is_empty() {
        return Err(DriverError::internal(format!(
            "{what} expects exactly one input job and no input files, got {} and {}",
            context.inputs.len(),
            context.input_actions.len()
        )));
    }
    Ok(())
}

/// `dsymutil <image> -o <bundle>`.
pub(super) fn generate_dsym(context: &JobContext<'_>) -> DriverResult<InvocationInfo> {
    expect_single_input_job(context, "generate-dSYM")?;
    let mut arguments = context.input_paths_of_type(FileType::Image);
    context.add_primary_output_arguments(&mut arguments);
    Ok(InvocationInfo::with_arguments("dsymutil", arguments))
}

/// `dwarfdump --verify --debug-info --eh-frame --quiet <bundle>`.
pub(super) fn verify_debug_info(context: &JobContext<'_>) -> DriverResult<InvocationInfo> {
    expect_single_input_job(context, "verify-debug-info")?;
    let mut arguments = Vec::new();
    push(
        &mut arguments,
        &["--verify", "--debug-info", "--eh-frame", "--quiet"],
    );
    arguments.extend(context.input_paths_of_type(FileType::DSym));
    Ok(InvocationInfo::with_arguments("dwarfdump", arguments))
}

/// `swift -frontend <common> <header> -emit-pch (-pch-output-dir D | -o P)`.
pub(super) fn generate_pch(
    toolchain: &ToolChain,
    context: &JobContext<'_>,
    persistent_dir: Option<&Path>,
) -> DriverResult<InvocationInfo> {
    let mut invocation = frontend_invocation();
    let out = &mut invocation.arguments;
    out.push("-frontend".to_string());
    add_common_frontend_args(toolchain, context, out);
    out.extend(context.input_paths_of_type(FileType::ObjcHeader));
    out.push("-emit-pch".to_string());
    match persistent_dir {
        Some(dir) => {
            out.push("-pch-output-dir".to_string());
            out.push(dir.display().to_string());
        }
        None => context.add_primary_output_arguments(out),
    }
    Ok(invocation)
}

/// `swift-autolink-extract <objects> -o <autolink file>`.
pub(super) fn autolink_extract(context: &JobContext<'_>) -> DriverResult<InvocationInfo> {
    let mut arguments = context.input_paths_of_type(FileType::Object);
    context.add_primary_output_arguments(&mut arguments);
    Ok(InvocationInfo::with_arguments("swift-autolink-extract", arguments).allowing_response_files())
}
