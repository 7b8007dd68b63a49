//! Campsite Warehouse - flatten campsite API documents into warehouse tables
//!
//! Provides:
//! - Raw ingestion of saved JSON responses, with archiving and deduplication
//! - Staging views that pick the latest load of each file and cast fields
//! - Incremental marts merged by unique key, with schema drift handling
//! - Project configuration and dependency-ordered model runs
//! - A client for the campsite API (feature `api-client`)

#[cfg(feature = "api-client")]
pub mod api;
#[cfg(feature = "cli")]
pub mod cli;
pub mod ingest;
pub mod mart;
pub mod models;
pub mod project;
pub mod staging;
pub mod storage;

// Re-export commonly used types
pub use ingest::{
    DedupStrategy, IngestError, IngestOptions, IngestStats, archive_loaded, load_directory,
};
pub use mart::{
    Grain, MartConfig, MartError, MartModel, MartTable, Materialization, MergeStats,
    OnSchemaChange, SchemaChange,
};
pub use models::{
    Batch, CampsiteAlert, CampsiteAttribute, CampsiteDetail, CampsiteSummary, ColumnDef,
    ColumnType, RawRecord, RawTable, Row, TableSchema, Value,
};
pub use project::{ModelRef, ProjectConfig, RunOptions, RunResult, Runner};
pub use staging::{DedupMode, StagingError, StagingModel, StagingOutput};
pub use storage::{FileSystemStore, MemoryStore, StorageError, WarehouseStore};

#[cfg(feature = "api-client")]
pub use api::{ApiError, DocApiClient, Endpoint};
