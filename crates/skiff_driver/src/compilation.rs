//! The per-compilation context that job construction reads from.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use skiff_common::FileType;
use tempfile::TempPath;

use crate::args::ArgList;
use crate::error::{DriverError, DriverResult};
use crate::output::OutputInfo;

/// A top-level input file and its type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputPair {
    /// The type of the file.
    pub file_type: FileType,
    /// The path as given on the command line.
    pub path: String,
}

#[derive(Debug)]
enum TempInner {
    Scoped(TempPath),
    Kept(PathBuf),
}

/// An owned handle to a reserved temporary file.
///
/// Clones share the same file. The file is removed when the last clone is
/// dropped unless the compilation keeps its temporaries.
#[derive(Clone)]
pub struct TemporaryFile {
    inner: Arc<TempInner>,
}

impl TemporaryFile {
    /// The reserved path.
    pub fn path(&self) -> &Path {
        match &*self.inner {
            TempInner::Scoped(path) => path.as_ref(),
            TempInner::Kept(path) => path.as_path(),
        }
    }

    /// Returns `true` if the file outlives its handles.
    pub fn is_kept(&self) -> bool {
        matches!(&*self.inner, TempInner::Kept(_))
    }

    /// The path as a command-line string.
    pub fn display_path(&self) -> String {
        self.path().display().to_string()
    }
}

impl fmt::Debug for TemporaryFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TemporaryFile").field(&self.path()).finish()
    }
}

impl PartialEq for TemporaryFile {
    fn eq(&self, other: &Self) -> bool {
        self.path() == other.path()
    }
}

impl Eq for TemporaryFile {}

/// Resolved state of one compilation: arguments, inputs, output
/// configuration and temporary-file policy.
///
/// Owned by whoever schedules jobs; the toolchain only borrows it.
#[derive(Debug)]
pub struct Compilation {
    args: ArgList,
    output_info: OutputInfo,
    inputs: Vec<InputPair>,
    temp_dir: PathBuf,
    save_temps: bool,
    all_sources: Mutex<Option<TemporaryFile>>,
}

impl Compilation {
    /// Starts building a compilation.
    pub fn builder(args: ArgList, output_info: OutputInfo) -> CompilationBuilder {
        CompilationBuilder {
            args,
            output_info,
            inputs: Vec::new(),
            temp_dir: None,
            save_temps: false,
        }
    }

    /// The resolved argument list.
    pub fn args(&self) -> &ArgList {
        &self.args
    }

    /// Compilation-wide output configuration.
    pub fn output_info(&self) -> &OutputInfo {
        &self.output_info
    }

    /// Every input file named on the command line, in order.
    pub fn top_level_input_files(&self) -> &[InputPair] {
        &self.inputs
    }

    /// Directory temporary files are reserved in.
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Whether temporaries are kept after use.
    pub fn save_temps(&self) -> bool {
        self.save_temps
    }

    /// Reserves a fresh file named `<name>-XXXXXX[.suffix]`.
    pub fn create_temporary_file(&self, name: &str, suffix: &str) -> DriverResult<TemporaryFile> {
        let prefix = format!("{name}-");
        let suffix = if suffix.is_empty() {
            String::new()
        } else {
            format!(".{suffix}")
        };
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .tempfile_in(&self.temp_dir)
            .map_err(|source| DriverError::Io {
                path: self.temp_dir.clone(),
                source,
            })?;
        let path = file.into_temp_path();
        let inner = if self.save_temps {
            let kept = path.keep().map_err(|e| DriverError::Io {
                path: e.path.to_path_buf(),
                source: e.error,
            })?;
            TempInner::Kept(kept)
        } else {
            TempInner::Scoped(path)
        };
        Ok(TemporaryFile {
            inner: Arc::new(inner),
        })
    }

    /// The list file naming every source of the compilation. Reserved on
    /// first use and shared by every job afterwards.
    pub fn all_sources_path(&self) -> DriverResult<TemporaryFile> {
        let mut slot = self
            .all_sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = slot.as_ref() {
            return Ok(file.clone());
        }
        let file = self.create_temporary_file("sources", "")?;
        *slot = Some(file.clone());
        Ok(file)
    }
}

/// Builder for [`Compilation`].
#[derive(Debug)]
pub struct CompilationBuilder {
    args: ArgList,
    output_info: OutputInfo,
    inputs: Vec<InputPair>,
    temp_dir: Option<PathBuf>,
    save_temps: bool,
}

impl CompilationBuilder {
    /// Adds a top-level input.
    pub fn input(mut self, file_type: FileType, path: impl Into<String>) -> Self {
        self.inputs.push(InputPair {
            file_type,
            path: path.into(),
        });
        self
    }

    /// Sets the temporary directory. Defaults to the system one.
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Keeps temporary files after the jobs referencing them are dropped.
    pub fn save_temps(mut self, save: bool) -> Self {
        self.save_temps = save;
        self
    }

    /// Finishes the compilation.
    pub fn build(self) -> Compilation {
        Compilation {
            args: self.args,
            output_info: self.output_info,
            inputs: self.inputs,
            temp_dir: self.temp_dir.unwrap_or_else(std::env::temp_dir),
            save_temps: self.save_temps,
            all_sources: Mutex::new(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::CompilerMode;

    fn compilation(dir: &Path, save: bool) -> Compilation {
        let info = OutputInfo::new(CompilerMode::StandardCompile, FileType::Object, "M");
        Compilation::builder(ArgList::new(), info)
            .input(FileType::Swift, "a.swift")
            .temp_dir(dir)
            .save_temps(save)
            .build()
    }

    #[test]
    fn temporary_file_naming() {
        let dir = tempfile::tempdir().unwrap();
        let c = compilation(dir.path(), false);
        let file = c.create_temporary_file("outputs", "txt").unwrap();
        let name = file.path().file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("outputs-"));
        assert!(name.ends_with(".txt"));
        assert!(file.path().starts_with(dir.path()));
        assert!(file.path().exists());
    }

    #[test]
    fn scoped_file_removed_with_last_clone() {
        let dir = tempfile::tempdir().unwrap();
        let c = compilation(dir.path(), false);
        let file = c.create_temporary_file("inputs", "").unwrap();
        let path = file.path().to_path_buf();
        let clone = file.clone();
        drop(file);
        assert!(path.exists());
        drop(clone);
        assert!(!path.exists());
    }

    #[test]
    fn kept_file_survives() {
        let dir = tempfile::tempdir().unwrap();
        let c = compilation(dir.path(), true);
        let file = c.create_temporary_file("inputs", "").unwrap();
        assert!(file.is_kept());
        let path = file.path().to_path_buf();
        drop(file);
        assert!(path.exists());
    }

    #[test]
    fn all_sources_path_is_shared() {
        let dir = tempfile::tempdir().unwrap();
        let c = compilation(dir.path(), false);
        let first = c.all_sources_path().unwrap();
        let second = c.all_sources_path().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_temp_dir_is_io_error() {
        let c = compilation(Path::new("/nonexistent/skiff-temps"), false);
        let err = c.create_temporary_file("x", "").unwrap_err();
        assert!(matches!(err, DriverError::Io { .. }));
    }
}
