//! Typed cell values stored in staging rows and mart tables

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::column::ColumnType;

/// A single row, keyed by column name
pub type Row = BTreeMap<String, Value>;

/// A typed cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

/// A value could not be widened into the requested column type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot convert {from} value '{value}' to {to}")]
pub struct CoerceError {
    pub from: ColumnType,
    pub to: ColumnType,
    pub value: String,
}

impl Value {
    /// Type of the value, `None` for NULL
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Boolean(_) => Some(ColumnType::Boolean),
            Value::Text(_) => Some(ColumnType::Text),
            Value::Date(_) => Some(ColumnType::Date),
            Value::Timestamp(_) => Some(ColumnType::Timestamp),
            Value::Json(_) => Some(ColumnType::Json),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text rendering, as a warehouse would produce when casting to text
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Timestamp(ts) => ts.to_rfc3339(),
            Value::Json(v) => v.to_string(),
        }
    }

    /// Widen this value into `target`
    ///
    /// Only the conversions allowed by [`ColumnType::widens_to`] succeed.
    pub fn coerce_to(self, target: ColumnType) -> Result<Value, CoerceError> {
        let Some(from) = self.column_type() else {
            return Ok(Value::Null);
        };
        if from == target {
            return Ok(self);
        }
        if !from.widens_to(target) {
            return Err(CoerceError {
                from,
                to: target,
                value: self.render(),
            });
        }

        Ok(match (self, target) {
            (Value::Integer(i), ColumnType::Float) => Value::Float(i as f64),
            (Value::Date(d), ColumnType::Timestamp) => {
                Value::Timestamp(d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
            }
            (other, ColumnType::Text) => Value::Text(other.render()),
            (other, _) => other,
        })
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            other => f.write_str(&other.render()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
