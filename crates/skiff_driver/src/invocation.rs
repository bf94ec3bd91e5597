//! Plain descriptors of what an invocation rule produced.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use skiff_common::FileType;

use crate::compilation::TemporaryFile;
use crate::error::{DriverError, DriverResult};

/// What a file list enumerates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilelistKind {
    /// Plain (non-primary) inputs.
    Input,
    /// Primary inputs of a multi-primary invocation.
    PrimaryInput,
    /// Main outputs.
    Output,
    /// Supplementary outputs, as an output file map.
    SupplementaryOutput,
}

/// How a file list is written to disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilelistFormat {
    /// One path per line, final newline.
    Lines,
    /// A JSON object mapping input paths to `{type name: path}`.
    OutputFileMap,
}

/// The entries of a file list, resolved when the job is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilelistContents {
    /// Paths in list order.
    Paths(Vec<String>),
    /// Supplementary outputs keyed by input path.
    OutputMap(BTreeMap<String, BTreeMap<String, String>>),
}

/// A file list a job needs on disk before it runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilelistInfo {
    /// The reserved list file.
    pub file: TemporaryFile,
    /// What the list enumerates.
    pub kind: FilelistKind,
    /// The type of the listed files.
    pub file_type: FileType,
    /// The entries to write.
    pub contents: FilelistContents,
}

impl FilelistInfo {
    /// A list of paths.
    pub fn paths(
        file: TemporaryFile,
        kind: FilelistKind,
        file_type: FileType,
        paths: Vec<String>,
    ) -> Self {
        Self {
            file,
            kind,
            file_type,
            contents: FilelistContents::Paths(paths),
        }
    }

    /// A supplementary output file map.
    pub fn output_map(
        file: TemporaryFile,
        map: BTreeMap<String, BTreeMap<String, String>>,
    ) -> Self {
        Self {
            file,
            kind: FilelistKind::SupplementaryOutput,
            file_type: FileType::Nothing,
            contents: FilelistContents::OutputMap(map),
        }
    }

    /// Where the list is written.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The on-disk format.
    pub fn format(&self) -> FilelistFormat {
        match self.contents {
            FilelistContents::Paths(_) => FilelistFormat::Lines,
            FilelistContents::OutputMap(_) => FilelistFormat::OutputFileMap,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        match &self.contents {
            FilelistContents::Paths(paths) => paths.len(),
            FilelistContents::OutputMap(map) => map.values().map(BTreeMap::len).sum(),
        }
    }

    /// Returns `true` if the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the text written to disk.
    pub fn render(&self) -> DriverResult<String> {
        match &self.contents {
            FilelistContents::Paths(paths) => {
                let mut text = String::new();
                for path in paths {
                    text.push_str(path);
                    text.push('\n');
                }
                Ok(text)
            }
            FilelistContents::OutputMap(map) => {
                let mut text =
                    serde_json::to_string_pretty(map).map_err(|e| DriverError::Serialization {
                        reason: e.to_string(),
                    })?;
                text.push('\n');
                Ok(text)
            }
        }
    }
}

/// What an invocation rule returns: the tool to run and how to run it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationInfo {
    /// Executable name, resolved to a path later.
    pub executable: String,
    /// Arguments in order.
    pub arguments: Vec<String>,
    /// Environment overrides.
    pub extra_environment: Vec<(String, String)>,
    /// File lists to materialize before spawning.
    pub filelist_infos: Vec<FilelistInfo>,
    /// Whether the tool understands `@file` response files.
    pub allows_response_files: bool,
}

impl InvocationInfo {
    /// An invocation of `executable` with no arguments.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            arguments: Vec::new(),
            extra_environment: Vec::new(),
            filelist_infos: Vec::new(),
            allows_response_files: false,
        }
    }

    /// An invocation of `executable` with the given arguments.
    pub fn with_arguments(executable: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            arguments,
            ..Self::new(executable)
        }
    }

    /// Marks the tool as accepting response files.
    pub fn allowing_response_files(mut self) -> Self {
        self.allows_response_files = true;
        self
    }
}
