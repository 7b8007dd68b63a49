//! In-memory store

use std::collections::BTreeMap;

use super::{StorageError, WarehouseStore, validate_table_name};
use crate::mart::MartTable;
use crate::models::RawTable;

/// Keeps tables in process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    raw: BTreeMap<String, RawTable>,
    marts: BTreeMap<String, MartTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WarehouseStore for MemoryStore {
    fn load_raw(&self, name: &str) -> Result<Option<RawTable>, StorageError> {
        Ok(self.raw.get(name).cloned())
    }

    fn save_raw(&mut self, table: &RawTable) -> Result<(), StorageError> {
        validate_table_name(&table.name)?;
        self.raw.insert(table.name.clone(), table.clone());
        Ok(())
    }

    fn load_mart(&self, name: &str) -> Result<Option<MartTable>, StorageError> {
        Ok(self.marts.get(name).cloned())
    }

    fn save_mart(&mut self, table: &MartTable) -> Result<(), StorageError> {
        validate_table_name(&table.name)?;
        self.marts.insert(table.name.clone(), table.clone());
        Ok(())
    }

    fn raw_tables(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.raw.keys().cloned().collect())
    }

    fn mart_tables(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.marts.keys().cloned().collect())
    }
}
