//! Keyed mart tables and the incremental merge

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::config::{Grain, Materialization, MartConfig};
use super::error::MartError;
use super::schema::{Reconciliation, SchemaChange, reconcile};
use crate::models::{Batch, Row, TableSchema, Value};

/// One component of a unique key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyPart {
    Integer(i64),
    Boolean(bool),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl std::fmt::Display for KeyPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyPart::Integer(v) => write!(f, "{}", v),
            KeyPart::Boolean(v) => write!(f, "{}", v),
            KeyPart::Text(v) => write!(f, "{}", v),
            KeyPart::Date(v) => write!(f, "{}", v),
            KeyPart::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

/// Value of a row's unique key columns
pub type RowKey = Vec<KeyPart>;

/// Statistics from one merge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStats {
    /// Keys not present before the merge
    pub keys_inserted: usize,
    /// Keys whose rows were replaced
    pub keys_updated: usize,
    /// Rows written by the merge
    pub rows_written: usize,
    /// Incoming rows superseded by a later load of the same key
    pub rows_superseded: usize,
    /// Rows in the table after the merge
    pub rows_total: usize,
    /// Whether the table was rebuilt instead of merged
    pub rebuilt: bool,
    /// Schema changes applied
    pub schema_changes: Vec<SchemaChange>,
}

/// A persisted mart table
///
/// Rows are grouped by unique key. A key maps to exactly one row for entity
/// marts and to the row set of the latest load for child marts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredMartTable", into = "StoredMartTable")]
pub struct MartTable {
    pub name: String,
    pub schema: TableSchema,
    pub unique_key: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
    rows: BTreeMap<RowKey, Vec<Row>>,
}

impl MartTable {
    /// An empty table with the given schema
    pub fn new(name: impl Into<String>, schema: TableSchema, unique_key: Vec<String>) -> Self {
        Self {
            name: name.into(),
            schema,
            unique_key,
            updated_at: None,
            rows: BTreeMap::new(),
        }
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    /// Number of distinct keys
    pub fn key_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in key order
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values().flatten()
    }

    /// Rows stored under a key
    pub fn get(&self, key: &[KeyPart]) -> Option<&[Row]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    /// Rows stored under a single integer key
    pub fn get_by_id(&self, id: i64) -> Option<&[Row]> {
        self.get(&[KeyPart::Integer(id)])
    }

    /// Merge a batch into the table
    ///
    /// Either the whole batch is applied or the table is left untouched.
    pub fn merge(
        &mut self,
        batch: &Batch,
        config: &MartConfig,
        full_refresh: bool,
    ) -> Result<MergeStats, MartError> {
        let rebuild = full_refresh
            || config.materialized == Materialization::Table
            || self.schema.is_empty()
            || self.unique_key != config.unique_key;

        let reconciliation = if rebuild {
            Reconciliation::unchanged(batch.schema.clone())
        } else {
            reconcile(&self.schema, &batch.schema, config.on_schema_change)?
        };
        let target = &reconciliation.schema;

        for column in &config.unique_key {
            if !target.contains(column) {
                return Err(MartError::MissingKeyColumn {
                    table: self.name.clone(),
                    column: column.clone(),
                });
            }
        }

        let mut rows = if rebuild {
            BTreeMap::new()
        } else {
            self.migrate_rows(target)?
        };

        let mut stats = MergeStats {
            rebuilt: rebuild,
            schema_changes: reconciliation.changes.clone(),
            ..MergeStats::default()
        };

        // key -> (load id, rows of that load)
        let mut incoming: BTreeMap<RowKey, (u64, Vec<Row>)> = BTreeMap::new();
        for batch_row in &batch.rows {
            let row = project_row(&self.name, &batch_row.row, target)?;
            let key = row_key(&self.name, &row, &config.unique_key)?;

            match incoming.get_mut(&key) {
                None => {
                    incoming.insert(key, (batch_row.load_id, vec![row]));
                }
                Some((load_id, group)) => {
                    if batch_row.load_id > *load_id {
                        stats.rows_superseded += group.len();
                        *load_id = batch_row.load_id;
                        *group = vec![row];
                    } else if batch_row.load_id < *load_id {
                        stats.rows_superseded += 1;
                    } else if config.grain == Grain::Entity {
                        stats.rows_superseded += group.len();
                        *group = vec![row];
                    } else {
                        group.push(row);
                    }
                }
            }
        }

        for (key, (_, group)) in incoming {
            stats.rows_written += group.len();
            if rows.insert(key, group).is_some() {
                stats.keys_updated += 1;
            } else {
                stats.keys_inserted += 1;
            }
        }

        self.schema = reconciliation.schema;
        self.unique_key = config.unique_key.clone();
        self.rows = rows;
        self.updated_at = Some(Utc::now());
        stats.rows_total = self.row_count();

        tracing::info!(
            "Merged {} rows into {} ({} inserted, {} updated, {} total)",
            stats.rows_written,
            self.name,
            stats.keys_inserted,
            stats.keys_updated,
            stats.rows_total
        );
        for change in &stats.schema_changes {
            tracing::info!("{}: {}", self.name, change);
        }

        Ok(stats)
    }

    /// Existing rows rewritten onto the target schema
    fn migrate_rows(&self, target: &TableSchema) -> Result<BTreeMap<RowKey, Vec<Row>>, MartError> {
        let mut migrated = BTreeMap::new();
        for (key, group) in &self.rows {
            let rows = group
                .iter()
                .map(|row| project_row(&self.name, row, target))
                .collect::<Result<Vec<_>, _>>()?;
            migrated.insert(key.clone(), rows);
        }
        Ok(migrated)
    }

    fn from_rows(
        name: String,
        schema: TableSchema,
        unique_key: Vec<String>,
        updated_at: Option<DateTime<Utc>>,
        rows: Vec<Row>,
    ) -> Result<Self, MartError> {
        let mut table = Self::new(name, schema, unique_key);
        table.updated_at = updated_at;
        for row in rows {
            let key = row_key(&table.name, &row, &table.unique_key)?;
            table.rows.entry(key).or_default().push(row);
        }
        Ok(table)
    }
}

/// Conform a row to a schema: drop unknown columns, null-fill missing ones,
/// widen values to the column type
fn project_row(table: &str, row: &Row, schema: &TableSchema) -> Result<Row, MartError> {
    let mut projected = Row::new();
    for column in &schema.columns {
        let value = row.get(&column.name).cloned().unwrap_or(Value::Null);
        let value = value
            .coerce_to(column.data_type)
            .map_err(|source| MartError::Coerce {
                table: table.to_string(),
                column: column.name.clone(),
                source,
            })?;
        projected.insert(column.name.clone(), value);
    }
    Ok(projected)
}

/// Extract the unique key of a row
pub fn row_key(table: &str, row: &Row, unique_key: &[String]) -> Result<RowKey, MartError> {
    unique_key
        .iter()
        .map(|column| {
            let value = row.get(column).unwrap_or(&Value::Null);
            match value {
                Value::Integer(v) => Ok(KeyPart::Integer(*v)),
                Value::Boolean(v) => Ok(KeyPart::Boolean(*v)),
                Value::Text(v) => Ok(KeyPart::Text(v.clone())),
                Value::Date(v) => Ok(KeyPart::Date(*v)),
                Value::Timestamp(v) => Ok(KeyPart::Timestamp(*v)),
                Value::Null => Err(MartError::NullKey {
                    table: table.to_string(),
                    column: column.clone(),
                }),
                other => Err(MartError::UnkeyableColumn {
                    table: table.to_string(),
                    column: column.clone(),
                    data_type: other.column_type().map(|t| t.to_string()).unwrap_or_default(),
                }),
            }
        })
        .collect()
}

/// On-disk form of a mart table
#[derive(Serialize, Deserialize)]
struct StoredMartTable {
    name: String,
    schema: TableSchema,
    unique_key: Vec<String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    rows: Vec<Row>,
}

impl From<MartTable> for StoredMartTable {
    fn from(table: MartTable) -> Self {
        Self {
            name: table.name,
            schema: table.schema,
            unique_key: table.unique_key,
            updated_at: table.updated_at,
            rows: table.rows.into_values().flatten().collect(),
        }
    }
}

impl TryFrom<StoredMartTable> for MartTable {
    type Error = MartError;

    fn try_from(stored: StoredMartTable) -> Result<Self, Self::Error> {
        MartTable::from_rows(
            stored.name,
            stored.schema,
            stored.unique_key,
            stored.updated_at,
            stored.rows,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnDef, ColumnType};
    use crate::mart::config::OnSchemaChange;

    fn schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnDef::required("asset_id", ColumnType::Integer),
            ColumnDef::new("status", ColumnType::Text),
        ])
    }

    fn row(id: i64, status: &str) -> Row {
        Row::from([
            ("asset_id".to_string(), Value::Integer(id)),
            ("status".to_string(), Value::Text(status.to_string())),
        ])
    }

    fn batch(rows: &[(u64, Row)]) -> Batch {
        let mut batch = Batch::new(schema());
        for (load_id, r) in rows {
            batch.rows.push(crate::models::BatchRow {
                load_id: *load_id,
                row: r.clone(),
            });
        }
        batch
    }

    #[test]
    fn test_entity_merge_replaces_by_key() {
        let mut table = MartTable::new("campsites", TableSchema::default(), vec![]);
        let config = MartConfig::entity();

        let stats = table
            .merge(&batch(&[(1, row(5, "OPEN")), (1, row(6, "OPEN"))]), &config, false)
            .unwrap();
        assert!(stats.rebuilt);
        assert_eq!(stats.keys_inserted, 2);

        let stats = table
            .merge(&batch(&[(2, row(5, "CLOSED"))]), &config, false)
            .unwrap();
        assert!(!stats.rebuilt);
        assert_eq!(stats.keys_updated, 1);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.get_by_id(5).unwrap()[0]["status"],
            Value::Text("CLOSED".into())
        );
    }

    #[test]
    fn test_latest_load_wins_within_batch() {
        let mut table = MartTable::new("campsites", TableSchema::default(), vec![]);
        let stats = table
            .merge(
                &batch(&[(2, row(5, "CLOSED")), (1, row(5, "OPEN"))]),
                &MartConfig::entity(),
                false,
            )
            .unwrap();
        assert_eq!(stats.rows_superseded, 1);
        assert_eq!(table.row_count(), 1);
        assert_eq!(
            table.get_by_id(5).unwrap()[0]["status"],
            Value::Text("CLOSED".into())
        );
    }

    #[test]
    fn test_child_merge_replaces_row_set() {
        let mut table = MartTable::new("campsite_facilities", TableSchema::default(), vec![]);
        let config = MartConfig::child();

        table
            .merge(&batch(&[(1, row(5, "a")), (1, row(5, "b"))]), &config, false)
            .unwrap();
        assert_eq!(table.row_count(), 2);

        table
            .merge(&batch(&[(2, row(5, "c"))]), &config, false)
            .unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.get_by_id(5).unwrap()[0]["status"], Value::Text("c".into()));
    }

    #[test]
    fn test_null_key_is_rejected_without_partial_write() {
        let mut table = MartTable::new("campsites", TableSchema::default(), vec![]);
        let config = MartConfig::entity();
        table.merge(&batch(&[(1, row(5, "OPEN"))]), &config, false).unwrap();

        let mut bad = row(6, "OPEN");
        bad.insert("asset_id".into(), Value::Null);
        let err = table
            .merge(&batch(&[(2, row(5, "CLOSED")), (2, bad)]), &config, false)
            .unwrap_err();
        assert!(matches!(err, MartError::NullKey { .. }));
        assert_eq!(
            table.get_by_id(5).unwrap()[0]["status"],
            Value::Text("OPEN".into())
        );
    }

    #[test]
    fn test_schema_drift_migrates_existing_rows() {
        let mut table = MartTable::new("campsites", TableSchema::default(), vec![]);
        let config = MartConfig::entity().with_on_schema_change(OnSchemaChange::SyncAllColumns);
        table.merge(&batch(&[(1, row(5, "OPEN"))]), &config, false).unwrap();

        let wider = schema().with(ColumnDef::new("bookable", ColumnType::Boolean));
        let mut incoming = Batch::new(wider);
        let mut r = row(6, "OPEN");
        r.insert("bookable".into(), Value::Boolean(true));
        incoming.rows.push(crate::models::BatchRow { load_id: 2, row: r });

        let stats = table.merge(&incoming, &config, false).unwrap();
        assert_eq!(stats.schema_changes.len(), 1);
        assert_eq!(table.get_by_id(5).unwrap()[0]["bookable"], Value::Null);
        assert_eq!(table.get_by_id(6).unwrap()[0]["bookable"], Value::Boolean(true));
    }

    #[test]
    fn test_serde_round_trip_rebuilds_index() {
        let mut table = MartTable::new("campsites", TableSchema::default(), vec![]);
        table
            .merge(&batch(&[(1, row(5, "OPEN"))]), &MartConfig::entity(), false)
            .unwrap();

        let json = serde_json::to_string(&table).unwrap();
        let restored: MartTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, table);
        assert!(restored.get_by_id(5).is_some());
    }
}
