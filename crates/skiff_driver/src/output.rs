//! Output descriptors: what one job must produce, and how the whole
//! compilation is configured.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;
use skiff_common::FileType;

use crate::action::LinkKind;

/// How the compiler frontend is driven for a compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilerMode {
    /// One frontend invocation per source file.
    StandardCompile,
    /// One frontend invocation for the whole module.
    SingleCompile,
    /// Several primary files per frontend invocation.
    BatchModeCompile,
    /// Compile and run the sources immediately.
    Immediate,
    /// Interactive session.
    Repl,
}

impl CompilerMode {
    /// Returns `true` if a compile job in this mode may mark inputs as primary.
    pub fn may_have_primary_inputs(self) -> bool {
        matches!(
            self,
            CompilerMode::StandardCompile | CompilerMode::BatchModeCompile
        )
    }

    /// Returns `true` if the whole module is handled by one frontend job.
    pub fn is_single_compilation(self) -> bool {
        !self.may_have_primary_inputs()
    }
}

/// Requested debug information.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DebugInfoLevel {
    /// No debug info.
    #[default]
    None,
    /// Line tables only.
    LineTables,
    /// Full debug info described through the AST.
    AstTypes,
    /// Full debug info with DWARF types.
    DwarfTypes,
}

/// Compilation-wide output configuration, shared by every job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputInfo {
    /// How the frontend is driven.
    pub compiler_mode: CompilerMode,
    /// The type compile jobs produce.
    pub compiler_output_type: FileType,
    /// The final link product, if any.
    pub link_kind: Option<LinkKind>,
    /// Name of the module being built.
    pub module_name: String,
    /// SDK root, forwarded to the frontend and the linker.
    pub sdk_path: Option<PathBuf>,
    /// Requested debug information.
    pub debug_info_level: DebugInfoLevel,
}

impl OutputInfo {
    /// Creates a configuration with no link step, no SDK and no debug info.
    pub fn new(mode: CompilerMode, output_type: FileType, module_name: impl Into<String>) -> Self {
        Self {
            compiler_mode: mode,
            compiler_output_type: output_type,
            link_kind: None,
            module_name: module_name.into(),
            sdk_path: None,
            debug_info_level: DebugInfoLevel::None,
        }
    }

    /// Sets the link product.
    pub fn with_link_kind(mut self, kind: LinkKind) -> Self {
        self.link_kind = Some(kind);
        self
    }

    /// Sets the SDK root.
    pub fn with_sdk(mut self, sdk: impl Into<PathBuf>) -> Self {
        self.sdk_path = Some(sdk.into());
        self
    }

    /// A copy of this configuration with a different compiler mode.
    pub fn with_mode(&self, mode: CompilerMode) -> Self {
        Self {
            compiler_mode: mode,
            ..self.clone()
        }
    }
}

/// The input a job output belongs to.
///
/// `base` is the file the user named; `primary` is what this job actually
/// reads (the same file for compiles, an intermediate for backend jobs).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CommandInputPair {
    /// The originating top-level input.
    pub base: String,
    /// The input consumed by this job.
    pub primary: String,
}

impl CommandInputPair {
    /// A pair whose base and primary input are the same file.
    pub fn same(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            base: path.clone(),
            primary: path,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct OutputEntry {
    input: CommandInputPair,
    primary: Option<String>,
    supplementary: BTreeMap<FileType, String>,
}

/// Everything one job must produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    primary_output_type: FileType,
    entries: Vec<OutputEntry>,
    whole_module: BTreeMap<FileType, String>,
    index_file_path: Option<String>,
}

impl CommandOutput {
    /// An empty output whose primary outputs are of `primary_output_type`.
    pub fn new(primary_output_type: FileType) -> Self {
        Self {
            primary_output_type,
            entries: Vec::new(),
            whole_module: BTreeMap::new(),
            index_file_path: None,
        }
    }

    /// The type of the main outputs.
    pub fn primary_output_type(&self) -> FileType {
        self.primary_output_type
    }

    fn entry_mut(&mut self, input: &CommandInputPair) -> &mut OutputEntry {
        let pos = match self.entries.iter().position(|e| e.input == *input) {
            Some(pos) => pos,
            None => {
                self.entries.push(OutputEntry {
                    input: input.clone(),
                    primary: None,
                    supplementary: BTreeMap::new(),
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos]
    }

    /// Records the main output produced for `input`.
    pub fn add_primary_output(&mut self, input: impl Into<String>, output: impl Into<String>) {
        self.add_primary_output_for(CommandInputPair::same(input), output);
    }

    /// Records the main output produced for an explicit input pair.
    pub fn add_primary_output_for(&mut self, input: CommandInputPair, output: impl Into<String>) {
        self.entry_mut(&input).primary = Some(output.into());
    }

    /// Records an input that produces no main output file (type-checking).
    pub fn add_input(&mut self, input: impl Into<String>) {
        self.entry_mut(&CommandInputPair::same(input));
    }

    /// Records a supplementary output produced for `input`.
    pub fn set_supplementary_output(
        &mut self,
        input: impl Into<String>,
        file_type: FileType,
        path: impl Into<String>,
    ) {
        let input = CommandInputPair::same(input);
        self.entry_mut(&input)
            .supplementary
            .insert(file_type, path.into());
    }

    /// Records a supplementary output that belongs to the whole module.
    pub fn set_whole_module_output(&mut self, file_type: FileType, path: impl Into<String>) {
        self.whole_module.insert(file_type, path.into());
    }

    /// Sets the file an index-data job treats as primary.
    pub fn set_index_file_path(&mut self, path: impl Into<String>) {
        self.index_file_path = Some(path.into());
    }

    /// The file an index-data job treats as primary.
    pub fn index_file_path(&self) -> Option<&str> {
        self.index_file_path.as_deref()
    }

    /// The input pairs this output covers, in insertion order.
    pub fn inputs(&self) -> impl Iterator<Item = &CommandInputPair> {
        self.entries.iter().map(|e| &e.input)
    }

    /// All main output paths, in input order.
    pub fn primary_output_filenames(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| e.primary.as_deref())
            .collect()
    }

    /// The first main output path.
    pub fn primary_output_filename(&self) -> Option<&str> {
        self.entries.iter().find_map(|e| e.primary.as_deref())
    }

    /// The whole-module output of the given type.
    pub fn whole_module_output(&self, file_type: FileType) -> Option<&str> {
        self.whole_module.get(&file_type).map(String::as_str)
    }

    /// Number of supplementary outputs, per-input and whole-module.
    pub fn supplementary_output_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.supplementary.len())
            .sum::<usize>()
            + self.whole_module.len()
    }

    /// Every supplementary path of `file_type`: per-input ones in input
    /// order, then the whole-module one.
    pub fn supplementary_outputs_of_type(&self, file_type: FileType) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| e.supplementary.get(&file_type))
            .chain(self.whole_module.get(&file_type))
            .map(String::as_str)
            .collect()
    }

    /// Every path of `file_type`, main outputs first.
    pub fn outputs_of_type(&self, file_type: FileType) -> Vec<&str> {
        let mut paths = Vec::new();
        if self.primary_output_type == file_type {
            paths.extend(self.primary_output_filenames());
        }
        paths.extend(self.supplementary_outputs_of_type(file_type));
        paths
    }

    /// The types of supplementary outputs, per-input and whole-module.
    pub fn supplementary_output_types(&self) -> BTreeSet<FileType> {
        self.entries
            .iter()
            .flat_map(|e| e.supplementary.keys().copied())
            .chain(self.whole_module.keys().copied())
            .collect()
    }

    /// The set of all requested output types, main and supplementary.
    pub fn output_types(&self) -> BTreeSet<FileType> {
        let mut types = self.supplementary_output_types();
        if self.primary_output_type != FileType::Nothing {
            types.insert(self.primary_output_type);
        }
        types
    }

    /// The output file map for supplementary outputs, keyed by input path.
    /// Whole-module outputs are stored under the empty key.
    pub fn supplementary_output_map(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        let mut map = BTreeMap::new();
        for entry in &self.entries {
            if entry.supplementary.is_empty() {
                continue;
            }
            let outputs = entry
                .supplementary
                .iter()
                .map(|(ty, path)| (ty.name().to_string(), path.clone()))
                .collect();
            map.insert(entry.input.primary.clone(), outputs);
        }
        if !self.whole_module.is_empty() {
            let outputs = self
                .whole_module
                .iter()
                .map(|(ty, path)| (ty.name().to_string(), path.clone()))
                .collect();
            map.insert(String::new(), outputs);
        }
        map
    }

    /// Merges another job's outputs into this one, as batching does.
    ///
    /// Entries are appended in order; whole-module outputs already present
    /// are kept.
    pub fn add_outputs(&mut self, other: &CommandOutput) {
        for entry in &other.entries {
            let target = self.entry_mut(&entry.input);
            if entry.primary.is_some() {
                target.primary = entry.primary.clone();
            }
            for (ty, path) in &entry.supplementary {
                target.supplementary.insert(*ty, path.clone());
            }
        }
        for (ty, path) in &other.whole_module {
            self.whole_module
                .entry(*ty)
                .or_insert_with(|| path.clone());
        }
        if self.index_file_path.is_none() {
            self.index_file_path = other.index_file_path.clone();
        }
    }
}
