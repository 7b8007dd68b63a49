//! Raw source tables
//!
//! A raw table holds one row per ingested JSON document, in load order. Each
//! row gets a monotonically increasing identity `id`, which the staging layer
//! uses to decide which load of a file is the latest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ingested document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Identity column, starts at 1 and never repeats within a table generation
    pub id: u64,
    /// Directory the source file was read from
    pub file_path: String,
    /// Source file name, used as the deduplication partition
    pub file_name: String,
    /// Ingestion time
    pub loaded_at: DateTime<Utc>,
    /// SHA-256 of the file content, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    /// The parsed document
    pub raw_data: serde_json::Value,
}

impl RawRecord {
    /// Full source path (`file_path/file_name`)
    pub fn source_path(&self) -> String {
        if self.file_path.is_empty() {
            self.file_name.clone()
        } else {
            format!("{}/{}", self.file_path, self.file_name)
        }
    }
}

/// An append-only raw table with an identity sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Qualified table name, e.g. `raw.doc_campsites_alerts`
    pub name: String,
    next_id: u64,
    records: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_id: 1,
            records: Vec::new(),
        }
    }

    /// Append a document and return its identity id
    pub fn insert(
        &mut self,
        file_path: impl Into<String>,
        file_name: impl Into<String>,
        raw_data: serde_json::Value,
        loaded_at: DateTime<Utc>,
    ) -> u64 {
        self.insert_with_hash(file_path, file_name, raw_data, loaded_at, None)
    }

    pub fn insert_with_hash(
        &mut self,
        file_path: impl Into<String>,
        file_name: impl Into<String>,
        raw_data: serde_json::Value,
        loaded_at: DateTime<Utc>,
        content_hash: Option<String>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.records.push(RawRecord {
            id,
            file_path: file_path.into(),
            file_name: file_name.into(),
            loaded_at,
            content_hash,
            raw_data,
        });
        id
    }

    /// Drop all rows and restart the identity sequence
    pub fn truncate(&mut self) {
        self.records.clear();
        self.next_id = 1;
    }

    /// Rows in ascending id order
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a file with this source path has been loaded
    pub fn contains_path(&self, source_path: &str) -> bool {
        self.records.iter().any(|r| r.source_path() == source_path)
    }

    /// Whether a file with this content hash has been loaded
    pub fn contains_hash(&self, hash: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.content_hash.as_deref() == Some(hash))
    }
}
