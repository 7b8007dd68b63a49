//! Per-model materialization settings

use serde::{Deserialize, Serialize};

/// How a mart is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Materialization {
    /// Rebuilt from scratch on every run
    Table,
    /// Merged into the persisted table by unique key
    #[default]
    Incremental,
}

impl std::fmt::Display for Materialization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Materialization::Table => write!(f, "table"),
            Materialization::Incremental => write!(f, "incremental"),
        }
    }
}

impl std::str::FromStr for Materialization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Materialization::Table),
            "incremental" => Ok(Materialization::Incremental),
            _ => Err(format!(
                "Unknown materialization: {}. Use 'table' or 'incremental'.",
                s
            )),
        }
    }
}

/// What an incremental merge does when the incoming columns differ from the
/// persisted table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnSchemaChange {
    /// Keep the persisted schema; new columns are dropped, missing ones null
    Ignore,
    /// Abort the merge on any difference
    Fail,
    /// Add new columns and widen changed ones, never drop
    AppendNewColumns,
    /// Add, widen and drop so the table matches the incoming columns
    #[default]
    SyncAllColumns,
}

impl std::fmt::Display for OnSchemaChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OnSchemaChange::Ignore => write!(f, "ignore"),
            OnSchemaChange::Fail => write!(f, "fail"),
            OnSchemaChange::AppendNewColumns => write!(f, "append_new_columns"),
            OnSchemaChange::SyncAllColumns => write!(f, "sync_all_columns"),
        }
    }
}

/// How many rows a mart keeps per unique key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grain {
    /// Exactly one row per key; the last row of the latest load wins
    #[default]
    Entity,
    /// All rows of the latest load for the key replace the previous set
    Child,
}

/// Materialization settings of one mart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MartConfig {
    #[serde(default)]
    pub materialized: Materialization,

    /// Columns identifying a key group
    #[serde(default = "default_unique_key")]
    pub unique_key: Vec<String>,

    #[serde(default)]
    pub on_schema_change: OnSchemaChange,

    #[serde(default)]
    pub grain: Grain,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_unique_key() -> Vec<String> {
    vec!["asset_id".to_string()]
}

fn default_enabled() -> bool {
    true
}

impl Default for MartConfig {
    fn default() -> Self {
        Self {
            materialized: Materialization::default(),
            unique_key: default_unique_key(),
            on_schema_change: OnSchemaChange::default(),
            grain: Grain::default(),
            enabled: default_enabled(),
        }
    }
}

impl MartConfig {
    /// Incremental entity mart keyed by `asset_id`
    pub fn entity() -> Self {
        Self::default()
    }

    /// Incremental child mart keyed by `asset_id`
    pub fn child() -> Self {
        Self {
            grain: Grain::Child,
            ..Self::default()
        }
    }

    pub fn with_materialization(mut self, materialized: Materialization) -> Self {
        self.materialized = materialized;
        self
    }

    pub fn with_on_schema_change(mut self, policy: OnSchemaChange) -> Self {
        self.on_schema_change = policy;
        self
    }

    pub fn with_unique_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_key = columns.into_iter().map(Into::into).collect();
        self
    }
}
