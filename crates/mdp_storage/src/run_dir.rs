//! The run artifacts directory: the pipeline's sole persistent state.
//!
//! Every file is written via temp-file-then-rename so a reader never
//! observes a partially written artifact, satisfying the "no partial
//! output on cancellation" requirement for `output.md` and friends.

use crate::error::StorageError;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

pub struct RunArtifacts {
    dir: PathBuf,
}

impl RunArtifacts {
    /// Creates `<runs_base>/<run_id>/` if it does not already exist.
    pub fn create(runs_base: &Path, run_id: &str) -> Result<Self, StorageError> {
        let dir = runs_base.join(run_id);
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::Io { path: dir.display().to_string(), source })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn write_text(&self, name: &str, contents: &str) -> Result<PathBuf, StorageError> {
        let target = self.path(name);
        write_atomic(&target, contents.as_bytes())?;
        Ok(target)
    }

    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, StorageError> {
        let body = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Serialize { what: name.to_string(), source })?;
        let target = self.path(name);
        write_atomic(&target, &body)?;
        Ok(target)
    }
}

/// Writes `contents` to a sibling temp file, syncs it, then renames it into
/// place. On Unix the temp file is created with owner-only permissions
/// before any bytes are written.
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let tmp_path = parent.join(format!(".{}.tmp", target.file_name().and_then(|n| n.to_str()).unwrap_or("artifact")));

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(&tmp_path).map_err(|source| StorageError::Io { path: tmp_path.display().to_string(), source })?;
    file.write_all(contents).map_err(|source| StorageError::Io { path: tmp_path.display().to_string(), source })?;
    file.sync_all().map_err(|source| StorageError::Io { path: tmp_path.display().to_string(), source })?;
    drop(file);

    std::fs::rename(&tmp_path, target).map_err(|source| StorageError::Io { path: target.display().to_string(), source })?;
    Ok(())
}
