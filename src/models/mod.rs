//! Models module
//!
//! Defines the raw tables, typed campsite entities and the generic
//! row/value/schema types shared by the staging and mart layers.

pub mod alert;
pub mod attribute;
pub mod batch;
pub mod campsite;
pub mod column;
pub mod raw;
pub mod table;
pub mod value;

pub use alert::CampsiteAlert;
pub use attribute::{AttributeKind, CampsiteAttribute};
pub use batch::{Batch, BatchRow, LOADED_AT, Staged};
pub use campsite::{CampsiteDetail, CampsiteSummary};
pub use column::{ColumnDef, ColumnType};
pub use raw::{RawRecord, RawTable};
pub use table::TableSchema;
pub use value::{CoerceError, Row, Value};

/// A typed entity with a fixed relational projection
pub trait Record {
    /// Columns produced by [`Record::into_row`], in order
    fn schema() -> TableSchema;

    /// Project the entity into a row
    fn into_row(self) -> Row;
}
