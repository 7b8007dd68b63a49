//! Campsite detail staging model and attribute expansion

use serde_json::Value as Json;

use super::error::{ExtractError, StagingError};
use super::{extract, stage};
use crate::models::{AttributeKind, CampsiteAttribute, CampsiteDetail, RawRecord, Staged};

pub const MODEL: &str = "stg_doc_campsite_details";

/// Flatten one campsite detail document
pub fn campsite_detail(doc: &Json) -> Result<CampsiteDetail, ExtractError> {
    Ok(CampsiteDetail {
        asset_id: extract::required_integer(doc, "assetId")?,
        name: extract::text(doc, "name"),
        place: extract::text(doc, "place"),
        region: extract::text(doc, "region"),
        status: extract::text(doc, "status"),
        campsite_category: extract::text(doc, "campsiteCategory"),
        bookable: extract::boolean(doc, "bookable")?,
        free: extract::boolean(doc, "free")?,
        number_of_powered_sites: extract::integer(doc, "numberOfPoweredSites")?,
        number_of_unpowered_sites: extract::integer(doc, "numberOfUnpoweredSites")?,
        easting: extract::float(doc, "x")?,
        northing: extract::float(doc, "y")?,
        introduction: extract::text(doc, "introduction"),
        introduction_thumbnail: extract::text(doc, "introductionThumbnail"),
        location_string: extract::text(doc, "locationString"),
        static_link: extract::text(doc, "staticLink"),
        dogs_allowed: extract::text(doc, "dogsAllowed"),
        facilities: extract::json(doc, "facilities"),
        landscape: extract::json(doc, "landscape"),
        access: extract::json(doc, "access"),
        activities: extract::json(doc, "activities"),
    })
}

pub fn details_from_payload(raw: &Json) -> Result<Vec<CampsiteDetail>, ExtractError> {
    extract::documents(raw)?
        .into_iter()
        .map(campsite_detail)
        .collect()
}

pub fn stage_details(records: &[&RawRecord]) -> Result<Vec<Staged<CampsiteDetail>>, StagingError> {
    stage(MODEL, records, details_from_payload)
}

/// Expand one attribute list into one row per element
///
/// Every row carries the parent asset id. String elements are kept as-is,
/// other elements as their JSON text, null elements as `None`.
pub fn expand_attributes(
    detail: &CampsiteDetail,
    kind: AttributeKind,
) -> Result<Vec<CampsiteAttribute>, ExtractError> {
    let Some(list) = detail.attributes(kind) else {
        return Ok(Vec::new());
    };

    Ok(extract::array_items(list, kind.source_key())?
        .iter()
        .map(|item| CampsiteAttribute {
            asset_id: detail.asset_id,
            kind,
            value: extract::json_text(item),
        })
        .collect())
}
