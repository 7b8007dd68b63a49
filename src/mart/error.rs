//! Mart error types

use super::schema::SchemaError;
use crate::models::CoerceError;
use crate::staging::ExtractError;

/// Errors raised while building or merging a mart
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MartError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{table}: unique key column '{column}' is null")]
    NullKey { table: String, column: String },

    #[error("{table}: unique key column '{column}' has unkeyable type {data_type}")]
    UnkeyableColumn {
        table: String,
        column: String,
        data_type: String,
    },

    #[error("{table}: unique key column '{column}' is not in the schema")]
    MissingKeyColumn { table: String, column: String },

    #[error("{table}: column '{column}': {source}")]
    Coerce {
        table: String,
        column: String,
        #[source]
        source: CoerceError,
    },

    #[error("{model}: failed to expand raw row {load_id}: {source}")]
    Expand {
        model: &'static str,
        load_id: u64,
        #[source]
        source: ExtractError,
    },
}
