//! Campsite alerts staging model
//!
//! The alerts payload is a list of campsites, each with a nested `alerts`
//! array. Each alert becomes one row carrying its campsite's asset id and
//! name. The raw alerts table is reloaded repeatedly, so this model reads
//! only the latest load of each file.

use serde_json::Value as Json;

use super::error::{ExtractError, StagingError};
use super::{extract, stage};
use crate::models::{CampsiteAlert, RawRecord, Staged};

pub const MODEL: &str = "stg_doc_campsite_alerts";

/// Expand one campsite's alerts
pub fn campsite_alerts(doc: &Json) -> Result<Vec<CampsiteAlert>, ExtractError> {
    let asset_id = extract::required_integer(doc, "assetId")?;
    let name = extract::text(doc, "name");

    extract::elements(doc, "alerts")?
        .iter()
        .map(|alert| {
            Ok(CampsiteAlert {
                asset_id,
                name: name.clone(),
                display_date: extract::date(alert, "displayDate")?,
                heading: extract::text(alert, "heading"),
                detail: extract::text(alert, "detail"),
            })
        })
        .collect()
}

pub fn alerts_from_payload(raw: &Json) -> Result<Vec<CampsiteAlert>, ExtractError> {
    let mut alerts = Vec::new();
    for doc in extract::documents(raw)? {
        alerts.extend(campsite_alerts(doc)?);
    }
    Ok(alerts)
}

pub fn stage_alerts(records: &[&RawRecord]) -> Result<Vec<Staged<CampsiteAlert>>, StagingError> {
    stage(MODEL, records, alerts_from_payload)
}
