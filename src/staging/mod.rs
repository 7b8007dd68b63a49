//! Staging layer
//!
//! Staging models read raw JSON documents, extract fields by key path, cast
//! them to typed columns and emit one row per entity, or one row per nested
//! element for one-to-many fields.
//!
//! Every transform is a pure function from a raw payload to zero or more
//! typed records. [`stage`] runs a transform over a raw table, tagging each
//! record with the raw row it came from and stopping at the first failure.
//!
//! ## Example
//!
//! ```rust
//! use campsite_warehouse::models::RawTable;
//! use campsite_warehouse::staging::{DedupMode, StagingModel, StagingOutput};
//! use serde_json::json;
//!
//! let mut raw = RawTable::new("raw.doc_campsites_alerts");
//! raw.insert("data/raw", "alerts.json", json!([
//!     {"assetId": 5, "name": "Bush Camp",
//!      "alerts": [{"displayDate": "2024-01-01", "heading": "Closed", "detail": "Fire risk"}]}
//! ]), chrono::Utc::now());
//!
//! let output = StagingModel::CampsiteAlerts.run(&raw, DedupMode::LatestPerFile).unwrap();
//! assert_eq!(output.len(), 1);
//! ```

pub mod alerts;
pub mod campsites;
pub mod dedup;
pub mod details;
mod error;
pub mod extract;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::models::{
    Batch, CampsiteAlert, CampsiteDetail, CampsiteSummary, RawRecord, RawTable, Record, Staged,
    TableSchema,
};

pub use dedup::{DedupMode, latest_per_file};
pub use error::{CastError, ExtractError, StagingError};

/// Run a transform over raw rows
pub fn stage<T, F>(
    model: &'static str,
    records: &[&RawRecord],
    transform: F,
) -> Result<Vec<Staged<T>>, StagingError>
where
    F: Fn(&Json) -> Result<Vec<T>, ExtractError>,
{
    let mut staged = Vec::new();

    for record in records {
        let items = transform(&record.raw_data).map_err(|error| StagingError {
            model,
            load_id: record.id,
            source_path: record.source_path(),
            error,
        })?;
        staged.extend(
            items
                .into_iter()
                .map(|item| Staged::new(record.id, record.loaded_at, item)),
        );
    }

    tracing::debug!(
        "{} staged {} rows from {} raw rows",
        model,
        staged.len(),
        records.len()
    );
    Ok(staged)
}

/// The staging models of the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingModel {
    Campsites,
    CampsiteDetails,
    CampsiteAlerts,
}

impl StagingModel {
    pub const ALL: [StagingModel; 3] = [
        StagingModel::Campsites,
        StagingModel::CampsiteDetails,
        StagingModel::CampsiteAlerts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StagingModel::Campsites => campsites::MODEL,
            StagingModel::CampsiteDetails => details::MODEL,
            StagingModel::CampsiteAlerts => alerts::MODEL,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Raw table read by default
    pub fn default_source(self) -> &'static str {
        match self {
            StagingModel::Campsites => "raw.doc_campsites",
            StagingModel::CampsiteDetails => "raw.doc_campsites_detail",
            StagingModel::CampsiteAlerts => "raw.doc_campsites_alerts",
        }
    }

    /// Row selection used unless configured otherwise
    pub fn default_dedup(self) -> DedupMode {
        match self {
            StagingModel::CampsiteAlerts => DedupMode::LatestPerFile,
            _ => DedupMode::None,
        }
    }

    /// Output schema, without `loaded_at`
    pub fn schema(self) -> TableSchema {
        match self {
            StagingModel::Campsites => CampsiteSummary::schema(),
            StagingModel::CampsiteDetails => CampsiteDetail::schema(),
            StagingModel::CampsiteAlerts => CampsiteAlert::schema(),
        }
    }

    /// Stage a raw table
    pub fn run(self, table: &RawTable, dedup: DedupMode) -> Result<StagingOutput, StagingError> {
        let records = dedup.apply(table.records());
        tracing::info!(
            "Running {} over {} ({} of {} raw rows selected)",
            self.name(),
            table.name,
            records.len(),
            table.len()
        );

        Ok(match self {
            StagingModel::Campsites => StagingOutput::Campsites(campsites::stage_campsites(&records)?),
            StagingModel::CampsiteDetails => StagingOutput::Details(details::stage_details(&records)?),
            StagingModel::CampsiteAlerts => StagingOutput::Alerts(alerts::stage_alerts(&records)?),
        })
    }
}

impl std::fmt::Display for StagingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed output of a staging model
#[derive(Debug, Clone, PartialEq)]
pub enum StagingOutput {
    Campsites(Vec<Staged<CampsiteSummary>>),
    Details(Vec<Staged<CampsiteDetail>>),
    Alerts(Vec<Staged<CampsiteAlert>>),
}

impl StagingOutput {
    pub fn len(&self) -> usize {
        match self {
            StagingOutput::Campsites(rows) => rows.len(),
            StagingOutput::Details(rows) => rows.len(),
            StagingOutput::Alerts(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Relational view of the output
    pub fn to_batch(&self) -> Batch {
        match self {
            StagingOutput::Campsites(rows) => Batch::from_staged(rows),
            StagingOutput::Details(rows) => Batch::from_staged(rows),
            StagingOutput::Alerts(rows) => Batch::from_staged(rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_stage_reports_failing_row() {
        let mut raw = RawTable::new("raw.doc_campsites");
        raw.insert("data/raw", "a.json", json!([{"assetId": 1}]), Utc::now());
        raw.insert("data/raw", "b.json", json!([{"assetId": "one"}]), Utc::now());

        let err = StagingModel::Campsites
            .run(&raw, DedupMode::None)
            .unwrap_err();
        assert_eq!(err.model, "stg_doc_campsites");
        assert_eq!(err.load_id, 2);
        assert_eq!(err.source_path, "data/raw/b.json");
        assert!(err.is_cast_error());
    }

    #[test]
    fn test_staged_rows_keep_lineage() {
        let mut raw = RawTable::new("raw.doc_campsites");
        raw.insert("", "a.json", json!([{"assetId": 1}, {"assetId": 2}]), Utc::now());

        let output = StagingModel::Campsites.run(&raw, DedupMode::None).unwrap();
        let batch = output.to_batch();
        assert_eq!(batch.len(), 2);
        assert!(batch.rows.iter().all(|r| r.load_id == 1));
        assert!(batch.schema.contains("loaded_at"));
    }

    #[test]
    fn test_model_names_round_trip() {
        for model in StagingModel::ALL {
            assert_eq!(StagingModel::from_name(model.name()), Some(model));
        }
    }
}
