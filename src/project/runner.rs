//! Model execution
//!
//! A run stages every selected raw source, then merges each mart from its
//! staging output, in dependency order. A failing model marks everything
//! downstream of it as skipped; unrelated branches still run. Each mart is
//! persisted only after its merge succeeds.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::ProjectConfig;
use super::graph::{ModelGraph, ModelRef};
use crate::ingest::{IngestError, IngestStats, archive_loaded, load_directory};
use crate::mart::{self, MartError, MartModel, MartTable, MergeStats};
use crate::models::TableSchema;
use crate::staging::{StagingError, StagingModel, StagingOutput};
use crate::storage::{StorageError, WarehouseStore};

/// Errors that stop a single model or an ingestion
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Mart(#[from] MartError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("no staging output for {0}")]
    MissingInput(StagingModel),
}

/// Outcome of one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Success,
    Error,
    /// Not run because an upstream model failed or is disabled
    Skipped,
    Disabled,
}

impl std::fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelStatus::Success => write!(f, "OK"),
            ModelStatus::Error => write!(f, "ERROR"),
            ModelStatus::Skipped => write!(f, "SKIP"),
            ModelStatus::Disabled => write!(f, "DISABLED"),
        }
    }
}

/// Result of one model within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResult {
    pub model: ModelRef,
    pub status: ModelStatus,
    /// Rows emitted by a staging model, or rows in the mart after the merge
    pub rows: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub duration_ms: u64,
}

impl ModelResult {
    fn new(model: ModelRef, status: ModelStatus) -> Self {
        Self {
            model,
            status,
            rows: 0,
            merge: None,
            message: None,
            duration_ms: 0,
        }
    }
}

/// Result of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub full_refresh: bool,
    pub models: Vec<ModelResult>,
    pub duration_ms: u64,
}

impl RunResult {
    fn new(full_refresh: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            full_refresh,
            models: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Check if every model that ran succeeded
    pub fn is_success(&self) -> bool {
        self.models.iter().all(|m| m.status != ModelStatus::Error)
    }

    pub fn count(&self, status: ModelStatus) -> usize {
        self.models.iter().filter(|m| m.status == status).count()
    }

    pub fn get(&self, model: ModelRef) -> Option<&ModelResult> {
        self.models.iter().find(|m| m.model == model)
    }
}

/// Options of a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Models to run, with their upstream models; empty runs everything
    pub select: Vec<ModelRef>,
    /// Rebuild incremental marts from scratch
    pub full_refresh: bool,
}

/// Executes project models against a warehouse store
pub struct Runner<S: WarehouseStore> {
    store: S,
    config: ProjectConfig,
    graph: ModelGraph,
}

impl<S: WarehouseStore> Runner<S> {
    pub fn new(store: S, config: ProjectConfig) -> Self {
        Self {
            store,
            config,
            graph: ModelGraph::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Load a directory of raw files into a staging model's source table
    ///
    /// Files are archived only after the table has been saved, so a failed
    /// save leaves them in place for the next ingest.
    pub fn ingest(&mut self, source: StagingModel, path: &Path) -> Result<IngestStats, RunError> {
        let name = self.config.sources.for_model(source).to_string();
        let options = self.config.ingest_options();
        let mut table = self.store.load_raw_or_new(&name)?;
        let mut stats = load_directory(&mut table, path, &options)?;
        if stats.files_processed > 0 {
            self.store.save_raw(&table)?;
            if options.archive {
                archive_loaded(&mut stats);
            }
        }
        Ok(stats)
    }

    /// Run the selected models
    pub fn run(&mut self, options: &RunOptions) -> RunResult {
        let start = Instant::now();
        let mut result = RunResult::new(options.full_refresh);
        let mut outputs: HashMap<StagingModel, StagingOutput> = HashMap::new();
        let mut blocked: BTreeSet<ModelRef> = BTreeSet::new();

        tracing::info!("Starting run {}", result.run_id);

        for model in self.graph.plan(&options.select) {
            if !self.config.is_enabled(model.name()) {
                tracing::info!("{} is disabled", model);
                blocked.extend(self.graph.downstream(model));
                result.models.push(ModelResult::new(model, ModelStatus::Disabled));
                continue;
            }
            if blocked.contains(&model) {
                tracing::warn!("Skipping {}: an upstream model did not run", model);
                result.models.push(ModelResult::new(model, ModelStatus::Skipped));
                continue;
            }

            let model_start = Instant::now();
            let outcome = match model {
                ModelRef::Staging(staging) => self.stage(staging).map(|output| {
                    let rows = output.len();
                    outputs.insert(staging, output);
                    (rows, None)
                }),
                ModelRef::Mart(mart) => self
                    .run_mart(mart, &outputs, options.full_refresh)
                    .map(|stats| (stats.rows_total, Some(stats))),
            };

            let mut model_result = match outcome {
                Ok((rows, merge)) => {
                    let mut r = ModelResult::new(model, ModelStatus::Success);
                    r.rows = rows;
                    r.merge = merge;
                    r
                }
                Err(e) => {
                    tracing::error!("{} failed: {}", model, e);
                    blocked.extend(self.graph.downstream(model));
                    let mut r = ModelResult::new(model, ModelStatus::Error);
                    r.message = Some(e.to_string());
                    r
                }
            };
            model_result.duration_ms = model_start.elapsed().as_millis() as u64;
            result.models.push(model_result);
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Run {} finished: {} ok, {} errors, {} skipped",
            result.run_id,
            result.count(ModelStatus::Success),
            result.count(ModelStatus::Error),
            result.count(ModelStatus::Skipped)
        );
        result
    }

    /// Compute a staging view from its raw source table
    pub fn stage(&self, model: StagingModel) -> Result<StagingOutput, RunError> {
        let source = self.config.sources.for_model(model);
        let table = self.store.load_raw_or_new(source)?;
        Ok(model.run(&table, self.config.staging_dedup(model))?)
    }

    fn run_mart(
        &mut self,
        model: MartModel,
        outputs: &HashMap<StagingModel, StagingOutput>,
        full_refresh: bool,
    ) -> Result<MergeStats, RunError> {
        let input = outputs
            .get(&model.upstream())
            .ok_or(RunError::MissingInput(model.upstream()))?;
        let config = self.config.mart_config(model);

        let mut table = match self.store.load_mart(model.name())? {
            Some(table) => table,
            None => MartTable::new(model.name(), TableSchema::default(), config.unique_key.clone()),
        };
        let stats = mart::materialize(model, &mut table, input, &config, full_refresh)?;
        self.store.save_mart(&table)?;
        Ok(stats)
    }
}
