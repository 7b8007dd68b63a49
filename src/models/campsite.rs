//! Campsite entities produced by the staging layer

use serde::{Deserialize, Serialize};

use super::column::{ColumnDef, ColumnType};
use super::table::TableSchema;
use super::value::{Row, Value};
use super::{AttributeKind, Record};

/// A campsite as listed by the campsites endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampsiteSummary {
    pub asset_id: i64,
    pub name: Option<String>,
    pub status: Option<String>,
    pub region: Option<String>,
    /// NZTM easting (`x` in the API)
    pub easting: Option<f64>,
    /// NZTM northing (`y` in the API)
    pub northing: Option<f64>,
}

impl Record for CampsiteSummary {
    fn schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnDef::required("asset_id", ColumnType::Integer),
            ColumnDef::new("name", ColumnType::Text),
            ColumnDef::new("status", ColumnType::Text),
            ColumnDef::new("region", ColumnType::Text),
            ColumnDef::new("easting", ColumnType::Float),
            ColumnDef::new("northing", ColumnType::Float),
        ])
    }

    fn into_row(self) -> Row {
        Row::from([
            ("asset_id".to_string(), Value::Integer(self.asset_id)),
            ("name".to_string(), self.name.into()),
            ("status".to_string(), self.status.into()),
            ("region".to_string(), self.region.into()),
            ("easting".to_string(), self.easting.into()),
            ("northing".to_string(), self.northing.into()),
        ])
    }
}

/// Full campsite detail document
///
/// The one-to-many attribute lists are kept as JSON so the attribute marts
/// can expand them into rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampsiteDetail {
    pub asset_id: i64,
    pub name: Option<String>,
    pub place: Option<String>,
    pub region: Option<String>,
    pub status: Option<String>,
    pub campsite_category: Option<String>,
    pub bookable: Option<bool>,
    pub free: Option<bool>,
    pub number_of_powered_sites: Option<i64>,
    pub number_of_unpowered_sites: Option<i64>,
    pub easting: Option<f64>,
    pub northing: Option<f64>,
    pub introduction: Option<String>,
    pub introduction_thumbnail: Option<String>,
    pub location_string: Option<String>,
    pub static_link: Option<String>,
    pub dogs_allowed: Option<String>,
    pub facilities: Option<serde_json::Value>,
    pub landscape: Option<serde_json::Value>,
    pub access: Option<serde_json::Value>,
    pub activities: Option<serde_json::Value>,
}

impl CampsiteDetail {
    /// The JSON array backing an attribute kind
    pub fn attributes(&self, kind: AttributeKind) -> Option<&serde_json::Value> {
        match kind {
            AttributeKind::Facility => self.facilities.as_ref(),
            AttributeKind::Landscape => self.landscape.as_ref(),
            AttributeKind::Access => self.access.as_ref(),
        }
    }
}

impl Record for CampsiteDetail {
    fn schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnDef::required("asset_id", ColumnType::Integer),
            ColumnDef::new("name", ColumnType::Text),
            ColumnDef::new("place", ColumnType::Text),
            ColumnDef::new("region", ColumnType::Text),
            ColumnDef::new("status", ColumnType::Text),
            ColumnDef::new("campsite_category", ColumnType::Text),
            ColumnDef::new("bookable", ColumnType::Boolean),
            ColumnDef::new("free", ColumnType::Boolean),
            ColumnDef::new("number_of_powered_sites", ColumnType::Integer),
            ColumnDef::new("number_of_unpowered_sites", ColumnType::Integer),
            ColumnDef::new("easting", ColumnType::Float),
            ColumnDef::new("northing", ColumnType::Float),
            ColumnDef::new("introduction", ColumnType::Text),
            ColumnDef::new("introduction_thumbnail", ColumnType::Text),
            ColumnDef::new("location_string", ColumnType::Text),
            ColumnDef::new("static_link", ColumnType::Text),
            ColumnDef::new("dogs_allowed", ColumnType::Text),
            ColumnDef::new("facilities", ColumnType::Json),
            ColumnDef::new("landscape", ColumnType::Json),
            ColumnDef::new("access", ColumnType::Json),
            ColumnDef::new("activities", ColumnType::Json),
        ])
    }

    fn into_row(self) -> Row {
        Row::from([
            ("asset_id".to_string(), Value::Integer(self.asset_id)),
            ("name".to_string(), self.name.into()),
            ("place".to_string(), self.place.into()),
            ("region".to_string(), self.region.into()),
            ("status".to_string(), self.status.into()),
            ("campsite_category".to_string(), self.campsite_category.into()),
            ("bookable".to_string(), self.bookable.into()),
            ("free".to_string(), self.free.into()),
            (
                "number_of_powered_sites".to_string(),
                self.number_of_powered_sites.into(),
            ),
            (
                "number_of_unpowered_sites".to_string(),
                self.number_of_unpowered_sites.into(),
            ),
            ("easting".to_string(), self.easting.into()),
            ("northing".to_string(), self.northing.into()),
            ("introduction".to_string(), self.introduction.into()),
            (
                "introduction_thumbnail".to_string(),
                self.introduction_thumbnail.into(),
            ),
            ("location_string".to_string(), self.location_string.into()),
            ("static_link".to_string(), self.static_link.into()),
            ("dogs_allowed".to_string(), self.dogs_allowed.into()),
            ("facilities".to_string(), self.facilities.into()),
            ("landscape".to_string(), self.landscape.into()),
            ("access".to_string(), self.access.into()),
            ("activities".to_string(), self.activities.into()),
        ])
    }
}
