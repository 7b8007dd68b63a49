//! Project configuration file support
//!
//! Handles parsing of `.campsites.toml` (or `campsites.yml`) configuration
//! files and environment variable overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingest::{DedupStrategy, IngestOptions};
use crate::mart::{MartConfig, MartModel, Materialization, OnSchemaChange};
use crate::staging::{DedupMode, StagingModel};

/// Default configuration filename
pub const CONFIG_FILENAME: &str = ".campsites.toml";

/// Alternative YAML configuration filename
pub const YAML_CONFIG_FILENAME: &str = "campsites.yml";

/// Default warehouse directory
pub const DEFAULT_WAREHOUSE_PATH: &str = ".campsites";

/// Environment variable for the warehouse directory
pub const ENV_WAREHOUSE_PATH: &str = "CAMPSITES_WAREHOUSE_PATH";

/// Environment variable for the raw data directory
pub const ENV_DATA_DIR: &str = "CAMPSITES_DATA_DIR";

/// Environment variable naming the variable that holds the API key
pub const ENV_API_KEY_ENV: &str = "CAMPSITES_API_KEY_ENV";

static RE_TABLE_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").expect("Invalid regex")
});
static RE_COLUMN_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid regex"));

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid table identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Unknown model '{0}' in [models]")]
    UnknownModel(String),

    #[error("Model '{0}' has an empty unique_key")]
    EmptyUniqueKey(String),
}

/// Warehouse section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseSection {
    /// Warehouse directory (relative to the project, or absolute)
    #[serde(default = "default_warehouse_path")]
    pub path: String,
}

fn default_warehouse_path() -> String {
    DEFAULT_WAREHOUSE_PATH.to_string()
}

impl Default for WarehouseSection {
    fn default() -> Self {
        Self {
            path: default_warehouse_path(),
        }
    }
}

/// Raw ingestion section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSection {
    /// Root of the raw file tree the API client writes into
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_pattern")]
    pub pattern: String,

    #[serde(default = "default_true")]
    pub truncate: bool,

    #[serde(default = "default_true")]
    pub archive: bool,

    #[serde(default)]
    pub dedup: DedupStrategy,
}

fn default_data_dir() -> String {
    "data/raw".to_string()
}

fn default_pattern() -> String {
    crate::ingest::DEFAULT_PATTERN.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            pattern: default_pattern(),
            truncate: true,
            archive: true,
            dedup: DedupStrategy::None,
        }
    }
}

/// Campsite API section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSection {
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub urls: ApiUrls,
}

fn default_api_key_env() -> String {
    "DOC_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            headers: BTreeMap::new(),
            urls: ApiUrls::default(),
        }
    }
}

/// Endpoint URLs; `{id}` in the detail URL is replaced by the asset id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUrls {
    #[serde(default = "default_campsites_url")]
    pub campsites: String,

    #[serde(default = "default_alerts_url")]
    pub campsites_alerts: String,

    #[serde(default = "default_detail_url")]
    pub campsites_detail: String,
}

fn default_campsites_url() -> String {
    "https://api.doc.govt.nz/v2/campsites".to_string()
}

fn default_alerts_url() -> String {
    "https://api.doc.govt.nz/v2/campsites/alerts".to_string()
}

fn default_detail_url() -> String {
    "https://api.doc.govt.nz/v2/campsites/{id}/detail".to_string()
}

impl Default for ApiUrls {
    fn default() -> Self {
        Self {
            campsites: default_campsites_url(),
            campsites_alerts: default_alerts_url(),
            campsites_detail: default_detail_url(),
        }
    }
}

/// Raw source tables read by the staging models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesSection {
    #[serde(default = "default_campsites_source")]
    pub campsites: String,

    #[serde(default = "default_detail_source")]
    pub campsites_detail: String,

    #[serde(default = "default_alerts_source")]
    pub campsites_alerts: String,
}

fn default_campsites_source() -> String {
    StagingModel::Campsites.default_source().to_string()
}

fn default_detail_source() -> String {
    StagingModel::CampsiteDetails.default_source().to_string()
}

fn default_alerts_source() -> String {
    StagingModel::CampsiteAlerts.default_source().to_string()
}

impl Default for SourcesSection {
    fn default() -> Self {
        Self {
            campsites: default_campsites_source(),
            campsites_detail: default_detail_source(),
            campsites_alerts: default_alerts_source(),
        }
    }
}

impl SourcesSection {
    pub fn for_model(&self, model: StagingModel) -> &str {
        match model {
            StagingModel::Campsites => &self.campsites,
            StagingModel::CampsiteDetails => &self.campsites_detail,
            StagingModel::CampsiteAlerts => &self.campsites_alerts,
        }
    }

    fn all(&self) -> [&str; 3] {
        [&self.campsites, &self.campsites_detail, &self.campsites_alerts]
    }
}

/// Per-model overrides; unset fields keep the model's defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materialized: Option<Materialization>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_key: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_schema_change: Option<OnSchemaChange>,

    /// Raw row selection, staging models only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedup: Option<DedupMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Main configuration structure
///
/// Represents the `.campsites.toml` configuration file format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub warehouse: WarehouseSection,

    #[serde(default)]
    pub ingest: IngestSection,

    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub sources: SourcesSection,

    /// Overrides keyed by model name
    #[serde(default)]
    pub models: BTreeMap<String, ModelOverride>,
}

impl ProjectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a project directory
    ///
    /// Looks for `.campsites.toml`, then `campsites.yml`, and falls back to
    /// defaults. Environment overrides are applied last.
    pub fn load(project_path: &Path) -> Result<Self, ConfigError> {
        let toml_path = project_path.join(CONFIG_FILENAME);
        let yaml_path = project_path.join(YAML_CONFIG_FILENAME);

        let mut config = if toml_path.exists() {
            Self::parse(&read_config(&toml_path)?)?
        } else if yaml_path.exists() {
            Self::parse_yaml(&read_config(&yaml_path)?)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Parse configuration from YAML string
    pub fn parse_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a project directory
    pub fn save(&self, project_path: &Path) -> Result<(), ConfigError> {
        let config_path = project_path.join(CONFIG_FILENAME);
        std::fs::write(&config_path, self.to_toml()?)
            .map_err(|e| ConfigError::IoError(format!("Failed to write config: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to serialize config: {}", e))
        })
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_WAREHOUSE_PATH) {
            self.warehouse.path = path;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.ingest.data_dir = dir;
        }
        if let Some(var) = lookup(ENV_API_KEY_ENV) {
            self.api.api_key_env = var;
        }
    }

    /// Check identifiers and model names
    pub fn validate(&self) -> Result<(), ConfigError> {
        for table in self.sources.all() {
            if !RE_TABLE_IDENTIFIER.is_match(table) {
                return Err(ConfigError::InvalidIdentifier(table.to_string()));
            }
        }

        for (name, model) in &self.models {
            if StagingModel::from_name(name).is_none() && MartModel::from_name(name).is_none() {
                return Err(ConfigError::UnknownModel(name.clone()));
            }
            if let Some(key) = &model.unique_key {
                if key.is_empty() {
                    return Err(ConfigError::EmptyUniqueKey(name.clone()));
                }
                if let Some(bad) = key.iter().find(|c| !RE_COLUMN_IDENTIFIER.is_match(c)) {
                    return Err(ConfigError::InvalidIdentifier(bad.clone()));
                }
            }
        }
        Ok(())
    }

    /// Warehouse directory resolved against the project directory
    pub fn warehouse_path(&self, project_path: &Path) -> PathBuf {
        resolve(project_path, &self.warehouse.path)
    }

    /// Raw data directory resolved against the project directory
    pub fn data_dir(&self, project_path: &Path) -> PathBuf {
        resolve(project_path, &self.ingest.data_dir)
    }

    /// Directory load options
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions::default()
            .pattern(self.ingest.pattern.clone())
            .truncate(self.ingest.truncate)
            .archive(self.ingest.archive)
            .dedup(self.ingest.dedup)
    }

    /// Whether a model runs
    pub fn is_enabled(&self, name: &str) -> bool {
        self.models
            .get(name)
            .and_then(|m| m.enabled)
            .unwrap_or(true)
    }

    /// Raw row selection of a staging model
    pub fn staging_dedup(&self, model: StagingModel) -> DedupMode {
        self.models
            .get(model.name())
            .and_then(|m| m.dedup)
            .unwrap_or_else(|| model.default_dedup())
    }

    /// Effective materialization of a mart
    pub fn mart_config(&self, model: MartModel) -> MartConfig {
        let mut config = model.default_config();
        if let Some(overrides) = self.models.get(model.name()) {
            if let Some(materialized) = overrides.materialized {
                config.materialized = materialized;
            }
            if let Some(key) = &overrides.unique_key {
                config.unique_key = key.clone();
            }
            if let Some(policy) = overrides.on_schema_change {
                config.on_schema_change = policy;
            }
            if let Some(enabled) = overrides.enabled {
                config.enabled = enabled;
            }
        }
        config
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path)
        .map_err(|e| ConfigError::IoError(format!("Failed to read config: {}", e)))
}

fn resolve(project_path: &Path, value: &str) -> PathBuf {
    if Path::new(value).is_absolute() {
        PathBuf::from(value)
    } else {
        project_path.join(value)
    }
}

/// Generate a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# Campsite warehouse configuration

[warehouse]
# Directory holding raw and mart table snapshots
path = ".campsites"

[ingest]
# Root of the raw file tree; loaded files move to the sibling "archive" tree
data_dir = "data/raw"
pattern = "**/*.json"
# Drop existing raw rows before the first file of a load
truncate = true
archive = true
# Skip already loaded files: "none", "by_path", "by_content" or "both"
dedup = "none"

[api]
# Environment variable holding the API key
api_key_env = "DOC_API_KEY"
timeout_secs = 30
max_retries = 3

[api.urls]
campsites = "https://api.doc.govt.nz/v2/campsites"
campsites_alerts = "https://api.doc.govt.nz/v2/campsites/alerts"
campsites_detail = "https://api.doc.govt.nz/v2/campsites/{id}/detail"

[sources]
campsites = "raw.doc_campsites"
campsites_detail = "raw.doc_campsites_detail"
campsites_alerts = "raw.doc_campsites_alerts"

[models.stg_doc_campsite_alerts]
dedup = "latest_per_file"

[models.campsites]
materialized = "incremental"
unique_key = ["asset_id"]
# "ignore", "fail", "append_new_columns" or "sync_all_columns"
on_schema_change = "sync_all_columns"

[models.campsite_alerts]
enabled = true
"#
}
