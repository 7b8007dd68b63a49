//! Mart models and their projections from staging output

use serde::{Deserialize, Serialize};

use super::config::MartConfig;
use super::error::MartError;
use crate::models::{AttributeKind, Batch, Record, TableSchema, batch::with_loaded_at};
use crate::staging::{StagingModel, StagingOutput, details};

/// The mart tables of the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MartModel {
    /// One wide row per campsite
    Campsites,
    Facilities,
    Landscape,
    Access,
    Alerts,
}

impl MartModel {
    pub const ALL: [MartModel; 5] = [
        MartModel::Campsites,
        MartModel::Facilities,
        MartModel::Landscape,
        MartModel::Access,
        MartModel::Alerts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MartModel::Campsites => "campsites",
            MartModel::Facilities => "campsite_facilities",
            MartModel::Landscape => "campsite_landscape",
            MartModel::Access => "campsite_access",
            MartModel::Alerts => "campsite_alerts",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Staging model the mart reads
    pub fn upstream(self) -> StagingModel {
        match self {
            MartModel::Alerts => StagingModel::CampsiteAlerts,
            _ => StagingModel::CampsiteDetails,
        }
    }

    /// Attribute list re-expanded by the mart, if any
    pub fn attribute_kind(self) -> Option<AttributeKind> {
        match self {
            MartModel::Facilities => Some(AttributeKind::Facility),
            MartModel::Landscape => Some(AttributeKind::Landscape),
            MartModel::Access => Some(AttributeKind::Access),
            _ => None,
        }
    }

    /// Materialization used unless the project overrides it
    pub fn default_config(self) -> MartConfig {
        match self {
            MartModel::Campsites => MartConfig::entity(),
            _ => MartConfig::child(),
        }
    }

    /// Columns the mart emits, including `loaded_at`
    pub fn schema(self) -> TableSchema {
        let base = match self.attribute_kind() {
            Some(kind) => kind.schema(),
            None => self.upstream().schema(),
        };
        with_loaded_at(base)
    }

    /// Project staging output into the rows merged into the mart
    pub fn build_batch(self, input: &StagingOutput) -> Result<Batch, MartError> {
        match (self.attribute_kind(), input) {
            (Some(kind), StagingOutput::Details(rows)) => {
                let mut batch = Batch::new(self.schema());
                for staged in rows {
                    let attributes =
                        details::expand_attributes(&staged.record, kind).map_err(|source| {
                            MartError::Expand {
                                model: self.name(),
                                load_id: staged.load_id,
                                source,
                            }
                        })?;
                    for attribute in attributes {
                        batch.push(staged.load_id, staged.loaded_at, attribute.into_row());
                    }
                }
                Ok(batch)
            }
            _ => Ok(input.to_batch()),
        }
    }
}

impl std::fmt::Display for MartModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Schema of a typed record with `loaded_at`
pub fn record_schema<T: Record>() -> TableSchema {
    with_loaded_at(T::schema())
}
