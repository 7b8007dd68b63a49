//! Campsite alert entity

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Record;
use super::column::{ColumnDef, ColumnType};
use super::table::TableSchema;
use super::value::{Row, Value};

/// One alert attached to a campsite
///
/// Identity is implicitly (asset id, display date, heading); nothing in the
/// feed guarantees it is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampsiteAlert {
    pub asset_id: i64,
    /// Campsite name carried from the parent document
    pub name: Option<String>,
    pub display_date: Option<NaiveDate>,
    pub heading: Option<String>,
    pub detail: Option<String>,
}

impl Record for CampsiteAlert {
    fn schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnDef::required("asset_id", ColumnType::Integer),
            ColumnDef::new("name", ColumnType::Text),
            ColumnDef::new("display_date", ColumnType::Date),
            ColumnDef::new("heading", ColumnType::Text),
            ColumnDef::new("detail", ColumnType::Text),
        ])
    }

    fn into_row(self) -> Row {
        Row::from([
            ("asset_id".to_string(), Value::Integer(self.asset_id)),
            ("name".to_string(), self.name.into()),
            ("display_date".to_string(), self.display_date.into()),
            ("heading".to_string(), self.heading.into()),
            ("detail".to_string(), self.detail.into()),
        ])
    }
}
