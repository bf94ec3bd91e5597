//! Writing file lists and response files before a job is spawned.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::invocation::FilelistInfo;
use crate::job::Job;

fn write_text(path: &Path, text: &str) -> DriverResult<()> {
    fs::write(path, text).map_err(|source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes one file list to its reserved path.
pub fn write_filelist(info: &FilelistInfo) -> DriverResult<()> {
    let text = info.render()?;
    debug!(
        path = %info.path().display(),
        kind = ?info.kind,
        entries = info.len(),
        "writing file list"
    );
    write_text(info.path(), &text)
}

/// Writes every file list of `job`, and its response file if it has one.
///
/// Batch jobs carry their own lists; the jobs they replace are not touched.
pub fn write_job_filelists(job: &Job) -> DriverResult<()> {
    for info in job.filelist_infos() {
        write_filelist(info)?;
    }
    if let Some(response) = job.response_file() {
        debug!(path = %response.file.path().display(), "writing response file");
        write_text(response.file.path(), &response.render())?;
    }
    Ok(())
}
