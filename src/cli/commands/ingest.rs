//! Raw ingestion command
//!
//! Loads saved API responses into the raw table of one endpoint.

use std::path::PathBuf;

use crate::api::{Endpoint, endpoint_dir};
use crate::cli::commands::open_project;
use crate::cli::error::CliError;

/// Ingest command arguments
#[derive(Debug, Clone)]
pub struct IngestArgs {
    /// Project directory
    pub project: PathBuf,
    /// Endpoint whose responses are loaded
    pub endpoint: Endpoint,
    /// Directory or file to load; defaults to the endpoint's raw directory
    pub path: Option<PathBuf>,
}

/// Load raw files into the endpoint's source table
pub fn handle_ingest(args: &IngestArgs) -> Result<(), CliError> {
    let mut runner = open_project(&args.project)?;
    let path = match &args.path {
        Some(path) => path.clone(),
        None => endpoint_dir(&runner.config().data_dir(&args.project), args.endpoint),
    };

    let stats = runner.ingest(args.endpoint.staging_model(), &path)?;

    println!(
        "Loaded {} file(s) from {} ({} skipped, {} archived, {} bytes) in {}",
        stats.files_processed,
        path.display(),
        stats.files_skipped,
        stats.files_archived,
        stats.bytes_processed,
        stats.duration_string()
    );
    if stats.has_errors() {
        eprintln!("{} file(s) could not be loaded:", stats.errors_count);
        for error in &stats.errors {
            eprintln!("  {}", error);
        }
    }
    Ok(())
}
