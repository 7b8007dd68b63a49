//! Schema drift reconciliation
//!
//! Compares the columns a model emits with the columns of the persisted
//! table and decides, per [`OnSchemaChange`] policy, what the table's schema
//! becomes. The merge then migrates existing rows and projects incoming rows
//! onto that target schema.

use serde::{Deserialize, Serialize};

use super::config::OnSchemaChange;
use crate::models::{ColumnDef, ColumnType, TableSchema};

/// One difference applied to a persisted table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum SchemaChange {
    Added {
        column: String,
        data_type: ColumnType,
    },
    Removed {
        column: String,
    },
    Widened {
        column: String,
        from: ColumnType,
        to: ColumnType,
    },
}

impl std::fmt::Display for SchemaChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaChange::Added { column, data_type } => {
                write!(f, "add column {} {}", column, data_type)
            }
            SchemaChange::Removed { column } => write!(f, "drop column {}", column),
            SchemaChange::Widened { column, from, to } => {
                write!(f, "alter column {} {} -> {}", column, from, to)
            }
        }
    }
}

/// Schema conflicts that stop a merge
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema changed under on_schema_change = fail: {}", describe(.0))]
    DriftNotAllowed(Vec<SchemaChange>),

    #[error("column '{column}' changed from {existing} to {incoming}, which cannot be widened")]
    IncompatibleType {
        column: String,
        existing: ColumnType,
        incoming: ColumnType,
    },
}

fn describe(changes: &[SchemaChange]) -> String {
    changes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of reconciling an incoming schema with a persisted one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Schema of the table after the merge
    pub schema: TableSchema,
    /// Changes applied to the persisted table
    pub changes: Vec<SchemaChange>,
}

impl Reconciliation {
    pub fn unchanged(schema: TableSchema) -> Self {
        Self {
            schema,
            changes: Vec::new(),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Reconcile `incoming` against the persisted `existing` schema
pub fn reconcile(
    existing: &TableSchema,
    incoming: &TableSchema,
    policy: OnSchemaChange,
) -> Result<Reconciliation, SchemaError> {
    let added: Vec<&ColumnDef> = incoming
        .columns
        .iter()
        .filter(|c| !existing.contains(&c.name))
        .collect();
    let removed: Vec<&ColumnDef> = existing
        .columns
        .iter()
        .filter(|c| !incoming.contains(&c.name))
        .collect();
    let retyped: Vec<(&ColumnDef, ColumnType)> = existing
        .columns
        .iter()
        .filter_map(|c| {
            incoming
                .column_type(&c.name)
                .filter(|t| *t != c.data_type)
                .map(|t| (c, t))
        })
        .collect();

    if added.is_empty() && removed.is_empty() && retyped.is_empty() {
        return Ok(Reconciliation::unchanged(existing.clone()));
    }

    match policy {
        OnSchemaChange::Ignore => Ok(Reconciliation::unchanged(existing.clone())),
        OnSchemaChange::Fail => {
            let mut changes: Vec<SchemaChange> = added.iter().map(|c| added_change(c)).collect();
            changes.extend(removed.iter().map(|c| SchemaChange::Removed {
                column: c.name.clone(),
            }));
            changes.extend(retyped.iter().map(|(c, to)| SchemaChange::Widened {
                column: c.name.clone(),
                from: c.data_type,
                to: *to,
            }));
            Err(SchemaError::DriftNotAllowed(changes))
        }
        OnSchemaChange::AppendNewColumns | OnSchemaChange::SyncAllColumns => {
            let drop_removed = policy == OnSchemaChange::SyncAllColumns;
            let mut columns = Vec::with_capacity(existing.len() + added.len());
            let mut changes = Vec::new();

            for column in &existing.columns {
                let Some(incoming_type) = incoming.column_type(&column.name) else {
                    if drop_removed {
                        changes.push(SchemaChange::Removed {
                            column: column.name.clone(),
                        });
                    } else {
                        columns.push(column.clone());
                    }
                    continue;
                };

                let data_type = resolve_type(&column.name, column.data_type, incoming_type)?;
                if data_type != column.data_type {
                    changes.push(SchemaChange::Widened {
                        column: column.name.clone(),
                        from: column.data_type,
                        to: data_type,
                    });
                }
                columns.push(ColumnDef {
                    data_type,
                    ..column.clone()
                });
            }

            for column in added {
                changes.push(added_change(column));
                columns.push(column.clone());
            }

            Ok(Reconciliation {
                schema: TableSchema::new(columns),
                changes,
            })
        }
    }
}

fn added_change(column: &ColumnDef) -> SchemaChange {
    SchemaChange::Added {
        column: column.name.clone(),
        data_type: column.data_type,
    }
}

/// Pick the wider of two column types
fn resolve_type(
    column: &str,
    existing: ColumnType,
    incoming: ColumnType,
) -> Result<ColumnType, SchemaError> {
    if incoming.widens_to(existing) {
        Ok(existing)
    } else if existing.widens_to(incoming) {
        Ok(incoming)
    } else {
        Err(SchemaError::IncompatibleType {
            column: column.to_string(),
            existing,
            incoming,
        })
    }
}
