//! Mart layer
//!
//! Marts read staging output and maintain persisted tables keyed by an
//! entity identifier. An incremental merge replaces every key present in the
//! incoming batch and keeps the rest; keys that disappear upstream are never
//! deleted. Schema drift between the batch and the persisted table is
//! reconciled explicitly before any row is touched.

pub mod config;
mod error;
pub mod models;
pub mod schema;
pub mod table;

pub use config::{Grain, MartConfig, Materialization, OnSchemaChange};
pub use error::MartError;
pub use models::MartModel;
pub use schema::{Reconciliation, SchemaChange, SchemaError, reconcile};
pub use table::{KeyPart, MartTable, MergeStats, RowKey};

use crate::staging::StagingOutput;

/// Build a mart's batch and merge it into `table`
pub fn materialize(
    model: MartModel,
    table: &mut MartTable,
    input: &StagingOutput,
    config: &MartConfig,
    full_refresh: bool,
) -> Result<MergeStats, MartError> {
    let batch = model.build_batch(input)?;
    tracing::debug!("{} built {} rows from {}", model, batch.len(), model.upstream());
    table.merge(&batch, config, full_refresh)
}
