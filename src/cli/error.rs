//! CLI-specific error types

use crate::api::ApiError;
use crate::project::{ConfigError, RunError};
use crate::storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Config file already exists: {0}. Use --force to overwrite.")]
    ConfigExists(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("{0}")]
    RunError(#[from] RunError),

    #[error("API error: {0}")]
    ApiError(#[from] ApiError),

    #[error("{0} model(s) failed")]
    ModelsFailed(usize),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(String),
}
