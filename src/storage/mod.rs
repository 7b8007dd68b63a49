//! Warehouse persistence
//!
//! Raw tables and mart tables are persisted through a [`WarehouseStore`].
//! Staging views are computed on every run and never stored.
//!
//! - [`MemoryStore`] keeps everything in process, for tests and dry runs.
//! - [`FileSystemStore`] writes one JSON snapshot per table below a
//!   warehouse directory. A snapshot is written to a temporary file and
//!   renamed into place, so a failed write never leaves a partial table.

mod filesystem;
mod memory;

use crate::mart::MartTable;
use crate::models::RawTable;

pub use filesystem::FileSystemStore;
pub use memory::MemoryStore;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),
}

/// Persistence backend for raw and mart tables
pub trait WarehouseStore {
    /// Load a raw table, `None` if it was never written
    fn load_raw(&self, name: &str) -> Result<Option<RawTable>, StorageError>;

    fn save_raw(&mut self, table: &RawTable) -> Result<(), StorageError>;

    /// Load a mart table, `None` if it was never written
    fn load_mart(&self, name: &str) -> Result<Option<MartTable>, StorageError>;

    fn save_mart(&mut self, table: &MartTable) -> Result<(), StorageError>;

    /// Names of the persisted raw tables
    fn raw_tables(&self) -> Result<Vec<String>, StorageError>;

    /// Names of the persisted mart tables
    fn mart_tables(&self) -> Result<Vec<String>, StorageError>;

    /// Load a raw table or start an empty one
    fn load_raw_or_new(&self, name: &str) -> Result<RawTable, StorageError> {
        Ok(self.load_raw(name)?.unwrap_or_else(|| RawTable::new(name)))
    }
}

/// Reject names that would escape the warehouse directory
pub(crate) fn validate_table_name(name: &str) -> Result<(), StorageError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidTableName(name.to_string()))
    }
}
