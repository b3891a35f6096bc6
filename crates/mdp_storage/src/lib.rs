pub mod decision_log;
pub mod error;
pub mod run_dir;

pub use decision_log::DecisionLogger;
pub use error::StorageError;
pub use run_dir::{write_atomic, RunArtifacts};
