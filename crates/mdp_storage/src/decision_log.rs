//! Append-only NDJSON decision log. The file handle is the one piece of
//! run-scoped global state the pipeline carries; it is guaranteed to flush
//! and close on every exit path via `Drop`.

use crate::error::StorageError;
use fs2::FileExt;
use mdp_domain::decision::DecisionRecord;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct DecisionLogger {
    file: File,
    path: PathBuf,
}

impl DecisionLogger {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| StorageError::Io { path: path.display().to_string(), source })?;
        file.lock_exclusive().map_err(|_| StorageError::Lock { path: path.display().to_string() })?;
        Ok(Self { file, path: path.to_path_buf() })
    }

    pub fn append(&mut self, record: &DecisionRecord) -> Result<(), StorageError> {
        let line = record
            .to_ndjson_line()
            .map_err(|source| StorageError::Serialize { what: "decision record".to_string(), source })?;
        writeln!(self.file, "{line}").map_err(|source| StorageError::Io { path: self.path.display().to_string(), source })?;
        self.file.flush().map_err(|source| StorageError::Io { path: self.path.display().to_string(), source })?;
        Ok(())
    }
}

impl Drop for DecisionLogger {
    fn drop(&mut self) {
        let _ = self.file.flush();
        let _ = fs2::FileExt::unlock(&self.file);
    }
}
