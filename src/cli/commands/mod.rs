//! CLI command implementations

pub mod fetch;
pub mod ingest;
pub mod init;
pub mod run;
pub mod show;

use std::path::Path;

use crate::cli::error::CliError;
use crate::project::{ProjectConfig, Runner};
use crate::storage::FileSystemStore;

/// Load the project configuration and open its warehouse
pub(crate) fn open_project(project: &Path) -> Result<Runner<FileSystemStore>, CliError> {
    if !project.is_dir() {
        return Err(CliError::PathNotFound(project.to_path_buf()));
    }
    let config = ProjectConfig::load(project)?;
    let store = FileSystemStore::open(config.warehouse_path(project))?;
    Ok(Runner::new(store, config))
}
