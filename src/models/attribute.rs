//! Campsite attribute relations (facilities, landscape, access)

use serde::{Deserialize, Serialize};

use super::column::{ColumnDef, ColumnType};
use super::table::TableSchema;
use super::value::{Row, Value};

/// Which attribute list of a campsite detail document a relation expands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Facility,
    Landscape,
    Access,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 3] = [
        AttributeKind::Facility,
        AttributeKind::Landscape,
        AttributeKind::Access,
    ];

    /// Key of the array in the detail document
    pub fn source_key(self) -> &'static str {
        match self {
            AttributeKind::Facility => "facilities",
            AttributeKind::Landscape => "landscape",
            AttributeKind::Access => "access",
        }
    }

    /// Name of the value column in the expanded relation
    pub fn column_name(self) -> &'static str {
        match self {
            AttributeKind::Facility => "facility",
            AttributeKind::Landscape => "landscape",
            AttributeKind::Access => "access",
        }
    }

    /// Schema of the expanded relation
    pub fn schema(self) -> TableSchema {
        TableSchema::new(vec![
            ColumnDef::required("asset_id", ColumnType::Integer),
            ColumnDef::new(self.column_name(), ColumnType::Text),
        ])
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column_name())
    }
}

/// One (asset id, attribute value) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampsiteAttribute {
    pub asset_id: i64,
    pub kind: AttributeKind,
    /// `None` when the array element was JSON null
    pub value: Option<String>,
}

impl CampsiteAttribute {
    pub fn into_row(self) -> Row {
        Row::from([
            ("asset_id".to_string(), Value::Integer(self.asset_id)),
            (self.kind.column_name().to_string(), self.value.into()),
        ])
    }
}
