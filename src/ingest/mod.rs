//! Raw JSON ingestion
//!
//! Loads JSON files saved by the API client into raw tables, one raw row per
//! file. Once the table has been saved, [`archive_loaded`] moves each loaded
//! file from the `raw` tree into the mirrored `archive` tree.
//!
//! A bad file never stops a directory load: its error is recorded in
//! [`IngestStats`] and the next file is processed.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use campsite_warehouse::ingest::{IngestOptions, archive_loaded, load_directory};
//! use campsite_warehouse::models::RawTable;
//!
//! let mut table = RawTable::new("raw.doc_campsites");
//! let options = IngestOptions::default().truncate(true);
//! let mut stats = load_directory(&mut table, Path::new("data/raw/doc/campsites"), &options)?;
//! // persist `table` here, then
//! archive_loaded(&mut stats);
//! println!("Loaded {} files in {}", stats.files_processed, stats.duration_string());
//! # Ok::<(), campsite_warehouse::ingest::IngestError>(())
//! ```

mod archive;
mod error;
mod files;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::RawTable;

pub use archive::{archive_file, archive_path};
pub use error::IngestError;
pub use files::{DiscoveredFile, SourceFile, content_hash, discover_files, read_file};

/// Default pattern for raw files
pub const DEFAULT_PATTERN: &str = "**/*.json";

const MAX_ERRORS: usize = 100;

/// How already-loaded files are detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Load every file, even if loaded before
    #[default]
    None,
    /// Skip files whose source path is already in the table
    ByPath,
    /// Skip files whose content hash is already in the table
    ByContent,
    /// Skip on either match
    Both,
}

impl std::str::FromStr for DedupStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(DedupStrategy::None),
            "by_path" | "path" => Ok(DedupStrategy::ByPath),
            "by_content" | "content" => Ok(DedupStrategy::ByContent),
            "both" => Ok(DedupStrategy::Both),
            _ => Err(format!(
                "Unknown dedup strategy: {}. Use 'none', 'path', 'content' or 'both'.",
                s
            )),
        }
    }
}

/// Options for a directory load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Glob pattern relative to the source directory
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Drop existing rows before the first file is loaded
    #[serde(default)]
    pub truncate: bool,
    /// Move loaded files from `raw` to `archive` after the table is saved
    #[serde(default)]
    pub archive: bool,
    #[serde(default)]
    pub dedup: DedupStrategy,
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            truncate: false,
            archive: false,
            dedup: DedupStrategy::None,
        }
    }
}

impl IngestOptions {
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    pub fn archive(mut self, archive: bool) -> Self {
        self.archive = archive;
        self
    }

    pub fn dedup(mut self, dedup: DedupStrategy) -> Self {
        self.dedup = dedup;
        self
    }
}

/// Statistics from an ingestion run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    /// Files loaded into the table
    pub files_processed: usize,
    /// Files skipped as already loaded
    pub files_skipped: usize,
    /// Files moved to the archive tree
    pub files_archived: usize,
    /// Total bytes loaded
    pub bytes_processed: u64,
    /// Identity ids assigned, in load order
    pub loaded_ids: Vec<u64>,
    /// Files loaded, in load order
    pub loaded_paths: Vec<PathBuf>,
    pub errors_count: usize,
    /// Error messages (limited to the first 100)
    pub errors: Vec<String>,
    #[serde(skip)]
    pub duration: Duration,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error (limited to 100)
    pub fn add_error(&mut self, error: String) {
        self.errors_count += 1;
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors_count > 0
    }

    /// Format duration as human-readable string
    pub fn duration_string(&self) -> String {
        let secs = self.duration.as_secs();
        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else {
            format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }
}

/// Whether a file was already loaded under the given strategy
pub fn should_skip(file: &SourceFile, dedup: DedupStrategy, table: &RawTable) -> bool {
    let by_path = || table.contains_path(&file.source_path());
    let by_hash = || table.contains_hash(&file.content_hash);
    match dedup {
        DedupStrategy::None => false,
        DedupStrategy::ByPath => by_path(),
        DedupStrategy::ByContent => by_hash(),
        DedupStrategy::Both => by_path() || by_hash(),
    }
}

/// Load a single parsed file as one raw row, returning its identity id
pub fn load_file(table: &mut RawTable, file: SourceFile) -> u64 {
    let id = table.insert_with_hash(
        file.file_path,
        file.file_name,
        file.document,
        Utc::now(),
        Some(file.content_hash),
    );
    tracing::debug!("Loaded {} into {} as id {}", file.path.display(), table.name, id);
    id
}

/// Load every matching file under `base_path` into `table`
///
/// Truncation happens once, right before the first file that parses
/// successfully, so a directory with no loadable files leaves the table
/// as it was.
pub fn load_directory(
    table: &mut RawTable,
    base_path: &Path,
    options: &IngestOptions,
) -> Result<IngestStats, IngestError> {
    let start = Instant::now();
    let mut stats = IngestStats::new();
    let mut truncate_pending = options.truncate;

    tracing::info!("Loading {} from {}", table.name, base_path.display());
    let files = discover_files(base_path, &options.pattern)?;

    for discovered in files {
        let file = match read_file(&discovered.path) {
            Ok(file) => file,
            Err(e) => {
                tracing::error!("Error processing file {}: {}", discovered.path.display(), e);
                stats.add_error(e.to_string());
                continue;
            }
        };

        if !truncate_pending && should_skip(&file, options.dedup, table) {
            tracing::debug!("Skipping already loaded {}", file.path.display());
            stats.files_skipped += 1;
            continue;
        }

        if truncate_pending {
            tracing::info!("Truncating {}", table.name);
            table.truncate();
            truncate_pending = false;
        }

        stats.bytes_processed += file.size;
        stats.loaded_paths.push(file.path.clone());
        stats.loaded_ids.push(load_file(table, file));
        stats.files_processed += 1;
    }

    stats.duration = start.elapsed();
    tracing::info!(
        "Loaded {} files into {} ({} skipped, {} errors) in {}",
        stats.files_processed,
        table.name,
        stats.files_skipped,
        stats.errors_count,
        stats.duration_string()
    );
    Ok(stats)
}

/// Move every file of a finished load into the archive tree
///
/// Call only after the loaded table has been persisted. A file that cannot
/// be moved is recorded as an error and stays where it is.
pub fn archive_loaded(stats: &mut IngestStats) {
    let paths = stats.loaded_paths.clone();
    for path in &paths {
        match archive_file(path) {
            Ok(Some(_)) => stats.files_archived += 1,
            Ok(None) => {}
            Err(e) => {
                tracing::error!("{}", e);
                stats.add_error(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_list_is_capped() {
        let mut stats = IngestStats::new();
        for i in 0..150 {
            stats.add_error(format!("error {}", i));
        }
        assert_eq!(stats.errors_count, 150);
        assert_eq!(stats.errors.len(), 100);
    }

    #[test]
    fn test_duration_formatting() {
        let mut stats = IngestStats::new();
        stats.duration = Duration::from_secs(90);
        assert_eq!(stats.duration_string(), "1m 30s");
        stats.duration = Duration::from_secs(3661);
        assert_eq!(stats.duration_string(), "1h 1m 1s");
    }

    #[test]
    fn test_dedup_strategy_from_str() {
        assert_eq!("path".parse::<DedupStrategy>().unwrap(), DedupStrategy::ByPath);
        assert_eq!("BOTH".parse::<DedupStrategy>().unwrap(), DedupStrategy::Both);
        assert!("sometimes".parse::<DedupStrategy>().is_err());
    }
}
