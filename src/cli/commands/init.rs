//! Project initialization command

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::project::config::{CONFIG_FILENAME, sample_config};

/// Init command arguments
#[derive(Debug, Clone)]
pub struct InitArgs {
    /// Project directory
    pub project: PathBuf,
    /// Overwrite an existing configuration file
    pub force: bool,
}

/// Write a sample configuration file into the project directory
pub fn handle_init(args: &InitArgs) -> Result<(), CliError> {
    std::fs::create_dir_all(&args.project).map_err(|e| {
        CliError::IoError(format!(
            "Failed to create {}: {}",
            args.project.display(),
            e
        ))
    })?;

    let config_path = args.project.join(CONFIG_FILENAME);
    if config_path.exists() && !args.force {
        return Err(CliError::ConfigExists(config_path));
    }

    std::fs::write(&config_path, sample_config())
        .map_err(|e| CliError::IoError(format!("Failed to write config: {}", e)))?;

    println!("Created {}", config_path.display());
    Ok(())
}
