//! API fetch command

use std::path::PathBuf;

use crate::api::{DocApiClient, Endpoint};
use crate::cli::error::CliError;
use crate::project::ProjectConfig;

/// Fetch command arguments
#[derive(Debug, Clone)]
pub struct FetchArgs {
    /// Project directory
    pub project: PathBuf,
    /// Endpoint to fetch
    pub endpoint: Endpoint,
    /// Asset id of a single campsite detail
    pub id: Option<i64>,
    /// Saved listing whose campsites are fetched one detail at a time
    pub listing: Option<PathBuf>,
}

/// Fetch an endpoint and save the response below the raw data directory
pub fn handle_fetch(args: &FetchArgs) -> Result<(), CliError> {
    let config = ProjectConfig::load(&args.project)?;
    let client = DocApiClient::from_env(config.api.clone(), config.data_dir(&args.project))?;

    match (args.endpoint, args.id, &args.listing) {
        (Endpoint::CampsitesDetail, Some(id), None) => {
            let path = client.fetch(Endpoint::CampsitesDetail, Some(id))?;
            println!("Saved {}", path.display());
        }
        (Endpoint::CampsitesDetail, None, Some(listing)) => {
            if !listing.exists() {
                return Err(CliError::PathNotFound(listing.clone()));
            }
            let stats = client.fetch_details(listing)?;
            println!(
                "Saved {} of {} campsite detail(s)",
                stats.saved.len(),
                stats.requested
            );
            for (id, error) in &stats.failed {
                eprintln!("  {}: {}", id, error);
            }
        }
        (Endpoint::CampsitesDetail, _, _) => {
            return Err(CliError::InvalidArgument(
                "campsite detail needs exactly one of --id or --listing".to_string(),
            ));
        }
        (endpoint, None, None) => {
            let path = client.fetch(endpoint, None)?;
            println!("Saved {}", path.display());
        }
        (endpoint, _, _) => {
            return Err(CliError::InvalidArgument(format!(
                "--id and --listing only apply to campsite detail, not {}",
                endpoint
            )));
        }
    }
    Ok(())
}
