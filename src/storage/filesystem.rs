//! File system store
//!
//! Layout below the warehouse directory:
//! - `raw/<table>.json` - raw table snapshots
//! - `marts/<table>.json` - mart table snapshots

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{StorageError, WarehouseStore, validate_table_name};
use crate::mart::MartTable;
use crate::models::RawTable;

const RAW_DIR: &str = "raw";
const MART_DIR: &str = "marts";

/// Stores tables as JSON files below a root directory
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    /// Open a store, creating the directory layout if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(root.join(RAW_DIR))?;
        fs::create_dir_all(root.join(MART_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_path(&self, dir: &str, name: &str) -> Result<PathBuf, StorageError> {
        validate_table_name(name)?;
        Ok(self.root.join(dir).join(format!("{}.json", name)))
    }

    fn read<T: DeserializeOwned>(&self, dir: &str, name: &str) -> Result<Option<T>, StorageError> {
        let path = self.table_path(dir, name)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read(&path)?;
        serde_json::from_slice(&content).map(Some).map_err(|e| {
            StorageError::SerializationError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn write<T: Serialize>(&self, dir: &str, name: &str, value: &T) -> Result<(), StorageError> {
        let path = self.table_path(dir, name)?;
        let content = serde_json::to_vec(value).map_err(|e| {
            StorageError::SerializationError(format!("Failed to serialize {}: {}", name, e))
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }

    fn list(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.root.join(dir))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl WarehouseStore for FileSystemStore {
    fn load_raw(&self, name: &str) -> Result<Option<RawTable>, StorageError> {
        self.read(RAW_DIR, name)
    }

    fn save_raw(&mut self, table: &RawTable) -> Result<(), StorageError> {
        self.write(RAW_DIR, &table.name, table)
    }

    fn load_mart(&self, name: &str) -> Result<Option<MartTable>, StorageError> {
        self.read(MART_DIR, name)
    }

    fn save_mart(&mut self, table: &MartTable) -> Result<(), StorageError> {
        self.write(MART_DIR, &table.name, table)
    }

    fn raw_tables(&self) -> Result<Vec<String>, StorageError> {
        self.list(RAW_DIR)
    }

    fn mart_tables(&self) -> Result<Vec<String>, StorageError> {
        self.list(MART_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableSchema;
    use chrono::Utc;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_raw_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = FileSystemStore::open(dir.path()).unwrap();
        assert!(store.load_raw("raw.doc_campsites").unwrap().is_none());

        let mut table = RawTable::new("raw.doc_campsites");
        table.insert("data/raw", "a.json", json!([{"assetId": 1}]), Utc::now());
        store.save_raw(&table).unwrap();

        assert_eq!(store.load_raw("raw.doc_campsites").unwrap(), Some(table));
        assert_eq!(store.raw_tables().unwrap(), vec!["raw.doc_campsites"]);
        assert!(!dir.path().join("raw/raw.doc_campsites.json.tmp").exists());
    }

    #[test]
    fn test_mart_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = FileSystemStore::open(dir.path()).unwrap();

        let table = MartTable::new("campsites", TableSchema::default(), vec!["asset_id".into()]);
        store.save_mart(&table).unwrap();
        assert_eq!(store.load_mart("campsites").unwrap(), Some(table));
        assert_eq!(store.mart_tables().unwrap(), vec!["campsites"]);
    }

    #[test]
    fn test_corrupt_snapshot_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = FileSystemStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("marts/campsites.json"), "{").unwrap();
        assert!(matches!(
            store.load_mart("campsites"),
            Err(StorageError::SerializationError(_))
        ));
    }
}
