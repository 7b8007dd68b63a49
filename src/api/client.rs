//! Blocking HTTP client with retry

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::Local;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tokio_retry::strategy::ExponentialBackoff;

use super::{ApiError, Endpoint, read_listing, response_path, save_response};
use crate::project::config::ApiSection;

/// Status codes that are retried
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Delays between attempts: 1s, 2s, 4s, ... for at most `max_retries` retries
pub fn retry_schedule(max_retries: u32) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(500)
        .take(max_retries as usize)
}

fn is_retryable(status: StatusCode) -> bool {
    RETRY_STATUSES.contains(&status.as_u16())
}

/// Statistics from a detail fan-out
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchDetailsStats {
    pub requested: usize,
    pub saved: Vec<PathBuf>,
    /// Asset ids whose detail could not be fetched, with the error
    pub failed: Vec<(i64, String)>,
}

/// Client for the campsite API
#[derive(Debug, Clone)]
pub struct DocApiClient {
    client: Client,
    settings: ApiSection,
    data_dir: PathBuf,
}

impl DocApiClient {
    /// Create a client, reading the API key from the configured variable
    pub fn from_env(settings: ApiSection, data_dir: impl Into<PathBuf>) -> Result<Self, ApiError> {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ApiError::MissingApiKey(settings.api_key_env.clone()))?;
        Self::new(settings, &api_key, data_dir)
    }

    pub fn new(
        settings: ApiSection,
        api_key: &str,
        data_dir: impl Into<PathBuf>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &settings.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| ApiError::InvalidHeader("x-api-key".to_string()))?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            settings,
            data_dir: data_dir.into(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// URL of an endpoint; `{id}` is replaced by the asset id
    pub fn url(&self, endpoint: Endpoint, asset_id: Option<i64>) -> String {
        let urls = &self.settings.urls;
        let template = match endpoint {
            Endpoint::Campsites => &urls.campsites,
            Endpoint::CampsitesAlerts => &urls.campsites_alerts,
            Endpoint::CampsitesDetail => &urls.campsites_detail,
        };
        match asset_id {
            Some(id) => template.replace("{id}", &urlencoding::encode(&id.to_string())),
            None => template.clone(),
        }
    }

    /// GET a JSON document, retrying throttled and failed requests
    pub fn get_json(&self, url: &str) -> Result<Json, ApiError> {
        let mut delays = retry_schedule(self.settings.max_retries);
        let mut retry = 0;
        loop {
            tracing::debug!("Sending GET request to {}", url);
            let outcome = self.client.get(url).send();

            let retryable = match &outcome {
                Ok(response) => is_retryable(response.status()),
                Err(e) => e.is_timeout() || e.is_connect(),
            };
            if retryable && let Some(delay) = delays.next() {
                retry += 1;
                tracing::warn!(
                    "Request to {} failed, retry {}/{} in {:?}",
                    url,
                    retry,
                    self.settings.max_retries,
                    delay
                );
                thread::sleep(delay);
                continue;
            }

            let response = outcome?;
            let status = response.status();
            tracing::info!("Response status code: {}", status.as_u16());
            if !status.is_success() {
                return Err(ApiError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            return Ok(response.json()?);
        }
    }

    /// Fetch an endpoint and save the response, returning the saved path
    pub fn fetch(&self, endpoint: Endpoint, asset_id: Option<i64>) -> Result<PathBuf, ApiError> {
        let response = self.get_json(&self.url(endpoint, asset_id))?;
        let path = response_path(
            &self.data_dir,
            endpoint,
            Local::now().naive_local(),
            asset_id,
        );
        save_response(&path, &response)?;
        Ok(path)
    }

    /// Fetch the detail of every campsite in a saved listing file
    ///
    /// A failed detail is recorded and the fan-out continues.
    pub fn fetch_details(&self, listing: &Path) -> Result<FetchDetailsStats, ApiError> {
        let ids = read_listing(listing)?;
        tracing::info!("Found {} campsites to process", ids.len());

        let mut stats = FetchDetailsStats {
            requested: ids.len(),
            ..Default::default()
        };
        for id in ids {
            tracing::info!("Getting details for campsite {}", id);
            match self.fetch(Endpoint::CampsitesDetail, Some(id)) {
                Ok(path) => stats.saved.push(path),
                Err(e) => {
                    tracing::error!("Failed to fetch campsite {}: {}", id, e);
                    stats.failed.push((id, e.to_string()));
                }
            }
        }
        Ok(stats)
    }
}
