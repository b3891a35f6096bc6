use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error writing {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("failed to serialize {what}: {source}")]
    Serialize { what: String, #[source] source: serde_json::Error },
    #[error("failed to acquire lock on {path}")]
    Lock { path: String },
}
