//! Campsite listing staging model

use serde_json::Value as Json;

use super::error::{ExtractError, StagingError};
use super::{extract, stage};
use crate::models::{CampsiteSummary, RawRecord, Staged};

pub const MODEL: &str = "stg_doc_campsites";

/// Flatten one campsite listing entry
pub fn campsite_summary(doc: &Json) -> Result<CampsiteSummary, ExtractError> {
    Ok(CampsiteSummary {
        asset_id: extract::required_integer(doc, "assetId")?,
        name: extract::text(doc, "name"),
        status: extract::text(doc, "status"),
        region: extract::text(doc, "region"),
        easting: extract::float(doc, "x")?,
        northing: extract::float(doc, "y")?,
    })
}

/// Flatten a listing payload into one summary per campsite
pub fn campsites_from_payload(raw: &Json) -> Result<Vec<CampsiteSummary>, ExtractError> {
    extract::documents(raw)?
        .into_iter()
        .map(campsite_summary)
        .collect()
}

pub fn stage_campsites(
    records: &[&RawRecord],
) -> Result<Vec<Staged<CampsiteSummary>>, StagingError> {
    stage(MODEL, records, campsites_from_payload)
}
