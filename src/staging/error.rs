//! Staging error types

use crate::models::ColumnType;

/// A JSON value could not be cast to the declared column type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot cast '{value}' at '{path}' to {target}")]
pub struct CastError {
    /// Key path of the offending field
    pub path: String,
    /// Declared column type
    pub target: ColumnType,
    /// Text form of the source value
    pub value: String,
}

/// Failure extracting fields from a single document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Cast(#[from] CastError),

    #[error("required field '{0}' is missing or null")]
    MissingField(String),

    #[error("expected an array at '{path}', found {found}")]
    NotAnArray { path: String, found: &'static str },

    #[error("unsupported document shape: {0}")]
    UnsupportedDocument(&'static str),
}

/// Error raised by a staging model
///
/// Staging never skips a bad record: the first failure aborts the model and
/// is reported with the raw row it came from.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{model}: raw row {load_id} ({source_path}): {error}")]
pub struct StagingError {
    pub model: &'static str,
    pub load_id: u64,
    pub source_path: String,
    #[source]
    pub error: ExtractError,
}

impl StagingError {
    /// Whether the failure was a type-cast failure
    pub fn is_cast_error(&self) -> bool {
        matches!(self.error, ExtractError::Cast(_))
    }
}
