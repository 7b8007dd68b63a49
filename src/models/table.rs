//! Table schema model

use serde::{Deserialize, Serialize};

use super::column::{ColumnDef, ColumnType};

/// Ordered list of columns describing a staging view or mart table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Type of a column, if present
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column(name).map(|c| c.data_type)
    }

    /// Column names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Append a column, returning a new schema
    pub fn with(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_preserves_order() {
        let schema = TableSchema::new(vec![
            ColumnDef::required("asset_id", ColumnType::Integer),
            ColumnDef::new("name", ColumnType::Text),
        ])
        .with(ColumnDef::new("loaded_at", ColumnType::Timestamp));

        assert_eq!(schema.names(), vec!["asset_id", "name", "loaded_at"]);
        assert_eq!(schema.column_type("name"), Some(ColumnType::Text));
        assert!(!schema.contains("status"));
        assert!(!schema.column("asset_id").unwrap().nullable);
    }
}
