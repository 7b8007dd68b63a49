//! Column model for warehouse tables

use serde::{Deserialize, Serialize};

/// Logical type of a warehouse column
///
/// Mirrors the small set of scalar types the staging layer casts into, plus
/// `Json` for semi-structured columns kept for downstream expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
    Date,
    Timestamp,
    Json,
}

impl ColumnType {
    /// Whether values of this type can be widened into `target` without loss
    ///
    /// Widening is what `sync_all_columns` and `append_new_columns` apply to a
    /// persisted column when the incoming schema declares a different type.
    pub fn widens_to(self, target: ColumnType) -> bool {
        use ColumnType::*;

        if self == target {
            return true;
        }
        matches!(
            (self, target),
            (Integer, Float)
                | (Date, Timestamp)
                | (Integer | Float | Boolean | Date | Timestamp, Text)
        )
    }

    /// SQL-style type name used in table listings
    pub fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "double precision",
            ColumnType::Boolean => "boolean",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Json => "jsonb",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sql_name())
    }
}

impl std::str::FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "integer" | "int" | "bigint" => Ok(ColumnType::Integer),
            "float" | "double precision" | "float8" => Ok(ColumnType::Float),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "text" | "varchar" => Ok(ColumnType::Text),
            "date" => Ok(ColumnType::Date),
            "timestamp" => Ok(ColumnType::Timestamp),
            "json" | "jsonb" => Ok(ColumnType::Json),
            _ => Err(format!("Unknown column type: {}", s)),
        }
    }
}

/// Column definition within a table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Logical data type
    pub data_type: ColumnType,
    /// Whether the column allows NULL values (default: true)
    #[serde(default = "default_true")]
    pub nullable: bool,
}

fn default_true() -> bool {
    true
}

impl ColumnDef {
    /// Create a nullable column
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    /// Create a NOT NULL column
    pub fn required(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening_rules() {
        assert!(ColumnType::Integer.widens_to(ColumnType::Integer));
        assert!(ColumnType::Integer.widens_to(ColumnType::Float));
        assert!(ColumnType::Date.widens_to(ColumnType::Text));
        assert!(ColumnType::Date.widens_to(ColumnType::Timestamp));
        assert!(!ColumnType::Float.widens_to(ColumnType::Integer));
        assert!(!ColumnType::Text.widens_to(ColumnType::Integer));
        assert!(!ColumnType::Json.widens_to(ColumnType::Text));
        assert!(!ColumnType::Text.widens_to(ColumnType::Json));
    }

    #[test]
    fn test_column_type_from_str() {
        assert_eq!("jsonb".parse::<ColumnType>().unwrap(), ColumnType::Json);
        assert_eq!("INT".parse::<ColumnType>().unwrap(), ColumnType::Integer);
        assert!("money".parse::<ColumnType>().is_err());
    }
}
