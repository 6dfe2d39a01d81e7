use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Dataset root must be a JSON array of entity records")]
    NotAnArray,
    #[error("Checkpoint file {} is corrupt", .0.display())]
    CheckpointCorrupt(PathBuf),
    #[error("Checkpoint has no backing path")]
    CheckpointPathUnset,
    #[error("Checkpoint persist error: {0}")]
    Persist(#[from] tempfile::PersistError),
}
