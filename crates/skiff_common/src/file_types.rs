//! The table of file kinds the driver knows how to consume and produce.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A kind of file flowing through a compilation.
///
/// Every input and output the driver reasons about has exactly one
/// `FileType`. [`FileType::Invalid`] is the sentinel returned for extensions
/// the driver does not recognize; it is an ordinary value, not an error.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileType {
    /// Swift source code.
    Swift,
    /// Canonical SIL in textual form.
    Sil,
    /// Canonical SIL in binary form.
    Sib,
    /// Raw (pre-mandatory-passes) SIL in textual form.
    RawSil,
    /// Raw SIL in binary form.
    RawSib,
    /// A linked image (executable or library).
    Image,
    /// A native object file.
    Object,
    /// Native assembly.
    Assembly,
    /// Textual LLVM IR.
    LlvmIr,
    /// LLVM bitcode.
    LlvmBc,
    /// A serialized module.
    SwiftModule,
    /// Module documentation.
    SwiftModuleDoc,
    /// A textual module interface.
    SwiftModuleInterface,
    /// Make-style dependency file.
    Dependencies,
    /// Reference dependencies for incremental builds.
    SwiftDeps,
    /// A generated or imported Objective-C header.
    ObjcHeader,
    /// A precompiled bridging header.
    Pch,
    /// Text-based dylib stub.
    Tbd,
    /// Serialized diagnostics.
    SerializedDiagnostics,
    /// Trace of loaded modules.
    ModuleTrace,
    /// Debug symbol bundle.
    DSym,
    /// Linker flags extracted from object files.
    AutolinkFile,
    /// Index store data.
    IndexData,
    /// Migrator remapping file.
    Remapping,
    /// AST dump output.
    AstDump,
    /// List of imported modules.
    ImportedModules,
    /// The compiler was asked to produce nothing.
    Nothing,
    /// Sentinel for unrecognized extensions.
    Invalid,
}

/// Every recognized type, in table order. Extension lookup returns the first
/// match in this order.
const ALL_TYPES: &[FileType] = &[
    FileType::Swift,
    FileType::Sil,
    FileType::Sib,
    FileType::RawSil,
    FileType::RawSib,
    FileType::Image,
    FileType::Object,
    FileType::Assembly,
    FileType::LlvmIr,
    FileType::LlvmBc,
    FileType::SwiftModule,
    FileType::SwiftModuleDoc,
    FileType::SwiftModuleInterface,
    FileType::Dependencies,
    FileType::SwiftDeps,
    FileType::ObjcHeader,
    FileType::Pch,
    FileType::Tbd,
    FileType::SerializedDiagnostics,
    FileType::ModuleTrace,
    FileType::DSym,
    FileType::AutolinkFile,
    FileType::IndexData,
    FileType::Remapping,
    FileType::AstDump,
    FileType::ImportedModules,
    FileType::Nothing,
];

impl FileType {
    /// Returns the canonical name, as used in output file maps.
    pub fn name(self) -> &'static str {
        match self {
            FileType::Swift => "swift",
            FileType::Sil => "sil",
            FileType::Sib => "sib",
            FileType::RawSil => "raw-sil",
            FileType::RawSib => "raw-sib",
            FileType::Image => "image",
            FileType::Object => "object",
            FileType::Assembly => "assembly",
            FileType::LlvmIr => "llvm-ir",
            FileType::LlvmBc => "llvm-bc",
            FileType::SwiftModule => "swiftmodule",
            FileType::SwiftModuleDoc => "swiftdoc",
            FileType::SwiftModuleInterface => "swiftinterface",
            FileType::Dependencies => "dependencies",
            FileType::SwiftDeps => "swift-dependencies",
            FileType::ObjcHeader => "objc-header",
            FileType::Pch => "pch",
            FileType::Tbd => "tbd",
            FileType::SerializedDiagnostics => "diagnostics",
            FileType::ModuleTrace => "module-trace",
            FileType::DSym => "dSYM",
            FileType::AutolinkFile => "autolink",
            FileType::IndexData => "index-data",
            FileType::Remapping => "remap",
            FileType::AstDump => "ast-dump",
            FileType::ImportedModules => "imported-modules",
            FileType::Nothing => "nothing",
            FileType::Invalid => "invalid",
        }
    }

    /// Returns the preferred file extension, or `""` for types that are not
    /// stored in a single file.
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Swift => "swift",
            FileType::Sil => "sil",
            FileType::Sib => "sib",
            FileType::RawSil => "raw.sil",
            FileType::RawSib => "raw.sib",
            FileType::Image => "out",
            FileType::Object => "o",
            FileType::Assembly => "s",
            FileType::LlvmIr => "ll",
            FileType::LlvmBc => "bc",
            FileType::SwiftModule => "swiftmodule",
            FileType::SwiftModuleDoc => "swiftdoc",
            FileType::SwiftModuleInterface => "swiftinterface",
            FileType::Dependencies => "d",
            FileType::SwiftDeps => "swiftdeps",
            FileType::ObjcHeader => "h",
            FileType::Pch => "pch",
            FileType::Tbd => "tbd",
            FileType::SerializedDiagnostics => "dia",
            FileType::ModuleTrace => "trace.json",
            FileType::DSym => "dSYM",
            FileType::AutolinkFile => "autolink",
            FileType::Remapping => "remap",
            FileType::AstDump => "ast",
            FileType::ImportedModules => "importedmodules",
            FileType::IndexData | FileType::Nothing | FileType::Invalid => "",
        }
    }

    /// Returns `true` for the inputs the frontend accepts in a compile job:
    /// source files and SIL in either form.
    pub fn is_part_of_swift_compilation(self) -> bool {
        matches!(
            self,
            FileType::Swift | FileType::Sil | FileType::Sib | FileType::RawSil | FileType::RawSib
        )
    }

    /// Returns `true` only for source-language input. Intermediate forms such
    /// as SIL are excluded.
    pub fn is_source_language(self) -> bool {
        self == FileType::Swift
    }

    /// Returns `true` for types that hold human-readable text.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            FileType::Swift
                | FileType::Sil
                | FileType::RawSil
                | FileType::Assembly
                | FileType::LlvmIr
                | FileType::SwiftModuleInterface
                | FileType::Dependencies
                | FileType::SwiftDeps
                | FileType::ObjcHeader
                | FileType::Tbd
                | FileType::ModuleTrace
                | FileType::AutolinkFile
                | FileType::Remapping
                | FileType::AstDump
                | FileType::ImportedModules
        )
    }

    /// Returns the frontend flag that names a supplementary output of this
    /// type, or `None` if the type is never a supplementary output.
    pub fn supplementary_output_flag(self) -> Option<&'static str> {
        match self {
            FileType::SwiftModule => Some("-emit-module-path"),
            FileType::SwiftModuleDoc => Some("-emit-module-doc-path"),
            FileType::SwiftModuleInterface => Some("-emit-module-interface-path"),
            FileType::Dependencies => Some("-emit-dependencies-path"),
            FileType::SwiftDeps => Some("-emit-reference-dependencies-path"),
            FileType::ObjcHeader => Some("-emit-objc-header-path"),
            FileType::Tbd => Some("-emit-tbd-path"),
            FileType::SerializedDiagnostics => Some("-serialize-diagnostics-path"),
            FileType::ModuleTrace => Some("-emit-loaded-module-trace-path"),
            _ => None,
        }
    }

    /// Iterates over every recognized type (excluding [`FileType::Invalid`]).
    pub fn all() -> impl Iterator<Item = FileType> {
        ALL_TYPES.iter().copied()
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the type for a file extension (without the leading dot).
///
/// Empty or unrecognized extensions yield [`FileType::Invalid`].
pub fn lookup_type_for_extension(ext: &str) -> FileType {
    if ext.is_empty() {
        return FileType::Invalid;
    }
    FileType::all()
        .find(|ty| ty.extension() == ext)
        .unwrap_or(FileType::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_extensions() {
        assert_eq!(lookup_type_for_extension("swift"), FileType::Swift);
        assert_eq!(lookup_type_for_extension("o"), FileType::Object);
        assert_eq!(lookup_type_for_extension("swiftmodule"), FileType::SwiftModule);
        assert_eq!(lookup_type_for_extension("h"), FileType::ObjcHeader);
    }

    #[test]
    fn lookup_empty_and_unknown_is_invalid() {
        assert_eq!(lookup_type_for_extension(""), FileType::Invalid);
        assert_eq!(lookup_type_for_extension("zzz_unknown"), FileType::Invalid);
    }

    #[test]
    fn extensionless_types_never_match() {
        assert_ne!(lookup_type_for_extension("index-data"), FileType::IndexData);
        assert!(FileType::all().all(|ty| ty != FileType::Invalid));
    }

    #[test]
    fn compilation_inputs() {
        assert!(FileType::Swift.is_part_of_swift_compilation());
        assert!(FileType::Sib.is_part_of_swift_compilation());
        assert!(!FileType::Object.is_part_of_swift_compilation());
        assert!(FileType::Swift.is_source_language());
        assert!(!FileType::Sil.is_source_language());
    }

    #[test]
    fn supplementary_flags() {
        assert_eq!(
            FileType::SwiftDeps.supplementary_output_flag(),
            Some("-emit-reference-dependencies-path")
        );
        assert_eq!(FileType::Object.supplementary_output_flag(), None);
    }

    #[test]
    fn serde_uses_kebab_names() {
        let json = serde_json::to_string(&FileType::RawSil).unwrap();
        assert_eq!(json, "\"raw-sil\"");
        let back: FileType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FileType::RawSil);
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(format!("{}", FileType::SwiftDeps), "swift-dependencies");
    }
}
