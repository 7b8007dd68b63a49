//! Latest-load-per-file deduplication of raw rows

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::RawRecord;

/// How a staging model selects raw rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupMode {
    /// Every raw row is staged
    #[default]
    None,
    /// Only the most recent load of each source file is staged
    LatestPerFile,
}

impl DedupMode {
    /// Apply the mode, returning rows in ascending id order
    pub fn apply(self, records: &[RawRecord]) -> Vec<&RawRecord> {
        match self {
            DedupMode::None => records.iter().collect(),
            DedupMode::LatestPerFile => latest_per_file(records),
        }
    }
}

/// Ordering of two loads of the same file; `Greater` means `a` wins.
///
/// Highest id wins; equal ids fall back to the lexicographically smallest
/// file path so the choice never depends on input order.
fn load_precedence(a: &RawRecord, b: &RawRecord) -> Ordering {
    a.id.cmp(&b.id).then_with(|| b.file_path.cmp(&a.file_path))
}

/// Keep the most recent load of each file name
pub fn latest_per_file(records: &[RawRecord]) -> Vec<&RawRecord> {
    let mut latest: HashMap<&str, &RawRecord> = HashMap::new();

    for record in records {
        match latest.get(record.file_name.as_str()) {
            Some(current) => {
                if current.id == record.id {
                    tracing::debug!(
                        "Duplicate load id {} for file '{}', resolving by file path",
                        record.id,
                        record.file_name
                    );
                }
                if load_precedence(record, current) == Ordering::Greater {
                    latest.insert(record.file_name.as_str(), record);
                }
            }
            None => {
                latest.insert(record.file_name.as_str(), record);
            }
        }
    }

    let mut kept: Vec<&RawRecord> = latest.into_values().collect();
    kept.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.file_name.cmp(&b.file_name)));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn record(id: u64, path: &str, name: &str) -> RawRecord {
        RawRecord {
            id,
            file_path: path.to_string(),
            file_name: name.to_string(),
            loaded_at: Utc::now(),
            content_hash: None,
            raw_data: json!({"id": id}),
        }
    }

    #[test]
    fn test_keeps_highest_id_per_file() {
        let records = vec![
            record(1, "raw", "2025_04_30.json"),
            record(2, "raw", "2025_05_01.json"),
            record(3, "raw", "2025_04_30.json"),
        ];

        let kept = latest_per_file(&records);
        let ids: Vec<u64> = kept.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_tie_prefers_smallest_path() {
        let records = vec![
            record(7, "raw/b", "alerts.json"),
            record(7, "raw/a", "alerts.json"),
        ];
        let kept = latest_per_file(&records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].file_path, "raw/a");

        let reversed: Vec<RawRecord> = records.into_iter().rev().collect();
        assert_eq!(latest_per_file(&reversed)[0].file_path, "raw/a");
    }

    #[test]
    fn test_mode_none_keeps_everything() {
        let records = vec![record(1, "raw", "a.json"), record(2, "raw", "a.json")];
        assert_eq!(DedupMode::None.apply(&records).len(), 2);
        assert_eq!(DedupMode::LatestPerFile.apply(&records).len(), 1);
    }
}
