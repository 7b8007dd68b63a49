//! Campsite API client
//!
//! Fetches the campsite listing, campsite alerts and per-campsite detail
//! documents and saves each response as pretty-printed JSON under
//! `<data_dir>/doc/<endpoint>/YYYY/MM/DD/`, ready for raw ingestion.
//!
//! Requests authenticate with an `x-api-key` header read from the
//! environment, and are retried on throttling and server errors with
//! exponential backoff.

mod client;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::staging::{StagingModel, extract};

pub use client::{DocApiClient, FetchDetailsStats, RETRY_STATUSES, retry_schedule};

/// API name used as the first directory below the data directory
pub const API_NAME: &str = "doc";

/// API client errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("API key not found in environment variable: {0}")]
    MissingApiKey(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid campsite listing {path}: {reason}")]
    InvalidListing { path: PathBuf, reason: String },
}

/// API endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Campsites,
    CampsitesAlerts,
    CampsitesDetail,
}

impl Endpoint {
    pub const ALL: [Endpoint; 3] = [
        Endpoint::Campsites,
        Endpoint::CampsitesAlerts,
        Endpoint::CampsitesDetail,
    ];

    /// Directory name below `<data_dir>/doc`
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Campsites => "campsites",
            Endpoint::CampsitesAlerts => "campsites_alerts",
            Endpoint::CampsitesDetail => "campsites_detail",
        }
    }

    /// Staging model reading this endpoint's responses
    pub fn staging_model(self) -> StagingModel {
        match self {
            Endpoint::Campsites => StagingModel::Campsites,
            Endpoint::CampsitesAlerts => StagingModel::CampsiteAlerts,
            Endpoint::CampsitesDetail => StagingModel::CampsiteDetails,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "campsites" => Ok(Endpoint::Campsites),
            "campsites_alerts" | "alerts" => Ok(Endpoint::CampsitesAlerts),
            "campsites_detail" | "detail" | "details" => Ok(Endpoint::CampsitesDetail),
            _ => Err(format!(
                "Unknown endpoint: {}. Use 'campsites', 'alerts' or 'detail'.",
                s
            )),
        }
    }
}

/// Directory holding an endpoint's responses
pub fn endpoint_dir(data_dir: &Path, endpoint: Endpoint) -> PathBuf {
    data_dir.join(API_NAME).join(endpoint.name())
}

/// File a response fetched at `at` is saved to
///
/// Detail responses carry the asset id in the file name so that details
/// fetched within the same second do not overwrite each other.
pub fn response_path(
    data_dir: &Path,
    endpoint: Endpoint,
    at: NaiveDateTime,
    asset_id: Option<i64>,
) -> PathBuf {
    let stamp = at.format("%Y_%m_%d_%H_%M_%S");
    let file_name = match asset_id {
        Some(id) => format!("{}_{}.json", stamp, id),
        None => format!("{}.json", stamp),
    };
    endpoint_dir(data_dir, endpoint)
        .join(at.format("%Y").to_string())
        .join(at.format("%m").to_string())
        .join(at.format("%d").to_string())
        .join(file_name)
}

/// Write a response as pretty JSON, creating parent directories
pub fn save_response(path: &Path, response: &Json) -> Result<(), ApiError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(response)?)?;
    tracing::info!("Response data saved to {}", path.display());
    Ok(())
}

/// Asset ids of a campsite listing document
///
/// Entries without an `assetId` are ignored.
pub fn listing_asset_ids(listing: &Json) -> Result<Vec<i64>, String> {
    let documents = extract::documents(listing).map_err(|e| e.to_string())?;
    let mut ids = Vec::new();
    for doc in documents {
        if let Some(id) = extract::integer(doc, "assetId").map_err(|e| e.to_string())? {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Read asset ids from a saved listing file
pub fn read_listing(path: &Path) -> Result<Vec<i64>, ApiError> {
    let content = fs::read(path)?;
    let listing: Json = serde_json::from_slice(&content)?;
    listing_asset_ids(&listing).map_err(|reason| ApiError::InvalidListing {
        path: path.to_path_buf(),
        reason,
    })
}
