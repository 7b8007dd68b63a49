//! Staged records and row batches passed from staging to marts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::column::{ColumnDef, ColumnType};
use super::table::TableSchema;
use super::value::{Row, Value};
use super::Record;

/// Name of the ingestion-time column appended to every staged row
pub const LOADED_AT: &str = "loaded_at";

/// A typed record together with the raw load it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staged<T> {
    /// Identity id of the raw row
    pub load_id: u64,
    /// Ingestion time of the raw row
    pub loaded_at: DateTime<Utc>,
    pub record: T,
}

impl<T> Staged<T> {
    pub fn new(load_id: u64, loaded_at: DateTime<Utc>, record: T) -> Self {
        Self {
            load_id,
            loaded_at,
            record,
        }
    }
}

/// One row of a batch, tagged with the raw load that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    pub load_id: u64,
    pub row: Row,
}

/// Rows emitted by a model, with the schema they conform to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub schema: TableSchema,
    pub rows: Vec<BatchRow>,
}

impl Batch {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Build a batch from staged records, appending `loaded_at`
    pub fn from_staged<T: Record + Clone>(staged: &[Staged<T>]) -> Self {
        let mut batch = Self::new(with_loaded_at(T::schema()));
        for item in staged {
            batch.push(item.load_id, item.loaded_at, item.record.clone().into_row());
        }
        batch
    }

    /// Append a row, stamping its `loaded_at`
    pub fn push(&mut self, load_id: u64, loaded_at: DateTime<Utc>, mut row: Row) {
        row.insert(LOADED_AT.to_string(), Value::Timestamp(loaded_at));
        self.rows.push(BatchRow { load_id, row });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Append the `loaded_at` column to a schema
pub fn with_loaded_at(schema: TableSchema) -> TableSchema {
    schema.with(ColumnDef::new(LOADED_AT, ColumnType::Timestamp))
}
