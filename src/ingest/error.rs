//! Ingestion error types

use std::path::PathBuf;

/// Errors raised while loading raw files
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid file pattern: {0}")]
    InvalidPattern(String),

    #[error("source path does not exist: {0}")]
    SourceNotFound(PathBuf),

    #[error("failed to parse {path}: {error}")]
    JsonParse { path: PathBuf, error: String },

    #[error("failed to archive {path}: {error}")]
    Archive {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}
