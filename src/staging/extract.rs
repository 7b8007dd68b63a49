//! Key-path extraction and casting over JSON documents
//!
//! Extraction follows text-extraction semantics: a string yields its content,
//! any other JSON value yields its JSON text, and JSON null or an absent key
//! yields `None`. The text is then cast to the target type; a value that does
//! not parse is a [`CastError`], never a silent `None`.
//!
//! Paths are dot separated (`location.x`); a numeric segment indexes into an
//! array.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value as Json;

use super::error::{CastError, ExtractError};
use crate::models::ColumnType;

/// Resolve a key path, returning `None` for absent keys and JSON null
pub fn lookup<'a>(doc: &'a Json, path: &str) -> Option<&'a Json> {
    let mut current = doc;
    for segment in path.split('.') {
        current = match current {
            Json::Object(map) => map.get(segment)?,
            Json::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() { None } else { Some(current) }
}

/// Text form of a JSON value
pub fn json_text(value: &Json) -> Option<String> {
    match value {
        Json::Null => None,
        Json::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn cast_error(path: &str, target: ColumnType, value: &str) -> ExtractError {
    ExtractError::Cast(CastError {
        path: path.to_string(),
        target,
        value: value.to_string(),
    })
}

/// Extract a field as text
pub fn text(doc: &Json, path: &str) -> Option<String> {
    lookup(doc, path).and_then(json_text)
}

/// Extract a field and cast it to an integer
pub fn integer(doc: &Json, path: &str) -> Result<Option<i64>, ExtractError> {
    match text(doc, path) {
        None => Ok(None),
        Some(raw) => parse_integer(&raw)
            .map(Some)
            .ok_or_else(|| cast_error(path, ColumnType::Integer, &raw)),
    }
}

/// Extract a field that must be present and cast it to an integer
pub fn required_integer(doc: &Json, path: &str) -> Result<i64, ExtractError> {
    integer(doc, path)?.ok_or_else(|| ExtractError::MissingField(path.to_string()))
}

/// Extract a field and cast it to a float
pub fn float(doc: &Json, path: &str) -> Result<Option<f64>, ExtractError> {
    match text(doc, path) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<f64>() {
            // NaN and infinities have no JSON form and cannot be stored
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(cast_error(path, ColumnType::Float, &raw)),
        },
    }
}

/// Extract a field and cast it to a boolean
pub fn boolean(doc: &Json, path: &str) -> Result<Option<bool>, ExtractError> {
    match text(doc, path) {
        None => Ok(None),
        Some(raw) => parse_boolean(&raw)
            .map(Some)
            .ok_or_else(|| cast_error(path, ColumnType::Boolean, &raw)),
    }
}

/// Extract a field and cast it to a date
pub fn date(doc: &Json, path: &str) -> Result<Option<NaiveDate>, ExtractError> {
    match text(doc, path) {
        None => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| cast_error(path, ColumnType::Date, &raw)),
    }
}

/// Extract a nested substructure as JSON for further flattening
pub fn json(doc: &Json, path: &str) -> Option<Json> {
    lookup(doc, path).cloned()
}

/// Elements of an array field
///
/// An absent or null field expands to no elements; any other non-array value
/// is an error.
pub fn elements<'a>(doc: &'a Json, path: &str) -> Result<&'a [Json], ExtractError> {
    match lookup(doc, path) {
        None => Ok(&[]),
        Some(value) => array_items(value, path),
    }
}

/// Items of a JSON value that must be an array
pub fn array_items<'a>(value: &'a Json, path: &str) -> Result<&'a [Json], ExtractError> {
    match value {
        Json::Array(items) => Ok(items.as_slice()),
        Json::Null => Ok(&[]),
        other => Err(ExtractError::NotAnArray {
            path: path.to_string(),
            found: kind_name(other),
        }),
    }
}

/// Entity documents contained in a raw payload
///
/// A payload is either an array of entities, an object wrapping that array
/// under `data`, or a single entity object.
pub fn documents(raw: &Json) -> Result<Vec<&Json>, ExtractError> {
    match raw {
        Json::Array(items) => Ok(items.iter().collect()),
        Json::Object(map) => match map.get("data") {
            Some(Json::Array(items)) => Ok(items.iter().collect()),
            _ => Ok(vec![raw]),
        },
        other => Err(ExtractError::UnsupportedDocument(kind_name(other))),
    }
}

fn kind_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Some(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Dates may arrive as plain dates or as timestamps; the date part is kept
/// as written, without converting between offsets.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested_and_indexed() {
        let doc = json!({"location": {"x": 1.5}, "tags": ["a", "b"], "gone": null});
        assert_eq!(lookup(&doc, "location.x"), Some(&json!(1.5)));
        assert_eq!(lookup(&doc, "tags.1"), Some(&json!("b")));
        assert_eq!(lookup(&doc, "gone"), None);
        assert_eq!(lookup(&doc, "missing.key"), None);
    }

    #[test]
    fn test_text_of_non_string_values() {
        let doc = json!({"n": 42, "b": true, "o": {"k": 1}});
        assert_eq!(text(&doc, "n").as_deref(), Some("42"));
        assert_eq!(text(&doc, "b").as_deref(), Some("true"));
        assert_eq!(text(&doc, "o").as_deref(), Some(r#"{"k":1}"#));
    }

    #[test]
    fn test_integer_cast() {
        let doc = json!({"a": 5, "b": "17", "c": "abc", "d": 5.5});
        assert_eq!(integer(&doc, "a").unwrap(), Some(5));
        assert_eq!(integer(&doc, "b").unwrap(), Some(17));
        assert_eq!(integer(&doc, "missing").unwrap(), None);

        let err = integer(&doc, "c").unwrap_err();
        assert_eq!(
            err,
            ExtractError::Cast(CastError {
                path: "c".into(),
                target: ColumnType::Integer,
                value: "abc".into(),
            })
        );
        assert!(integer(&doc, "d").is_err());
    }

    #[test]
    fn test_required_integer_missing() {
        let doc = json!({"assetId": null});
        assert_eq!(
            required_integer(&doc, "assetId").unwrap_err(),
            ExtractError::MissingField("assetId".into())
        );
    }

    #[test]
    fn test_float_and_boolean_casts() {
        let doc = json!({"x": 1571234, "y": "5123456.7", "flag": "yes", "bad": "maybe"});
        assert_eq!(float(&doc, "x").unwrap(), Some(1571234.0));
        assert_eq!(float(&doc, "y").unwrap(), Some(5123456.7));
        assert_eq!(boolean(&doc, "flag").unwrap(), Some(true));
        assert!(boolean(&doc, "bad").is_err());
    }

    #[test]
    fn test_non_finite_float_is_a_cast_error() {
        let doc = json!({"nan": "NaN", "inf": "inf", "neg": "-infinity"});
        for path in ["nan", "inf", "neg"] {
            assert!(matches!(
                float(&doc, path),
                Err(ExtractError::Cast(CastError {
                    target: ColumnType::Float,
                    ..
                }))
            ));
        }
    }

    #[test]
    fn test_date_cast_accepts_timestamps() {
        let doc = json!({
            "plain": "2024-01-01",
            "zoned": "2024-03-05T23:30:00+13:00",
            "naive": "2024-02-10T08:00:00",
            "bad": "yesterday"
        });
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(date(&doc, "plain").unwrap(), Some(d(2024, 1, 1)));
        assert_eq!(date(&doc, "zoned").unwrap(), Some(d(2024, 3, 5)));
        assert_eq!(date(&doc, "naive").unwrap(), Some(d(2024, 2, 10)));
        assert!(date(&doc, "bad").is_err());
    }

    #[test]
    fn test_elements() {
        let doc = json!({"list": [1, 2], "none": null, "scalar": "x"});
        assert_eq!(elements(&doc, "list").unwrap().len(), 2);
        assert!(elements(&doc, "none").unwrap().is_empty());
        assert!(elements(&doc, "absent").unwrap().is_empty());
        assert_eq!(
            elements(&doc, "scalar").unwrap_err(),
            ExtractError::NotAnArray {
                path: "scalar".into(),
                found: "string"
            }
        );
    }

    #[test]
    fn test_documents_shapes() {
        assert_eq!(documents(&json!([{"a": 1}, {"a": 2}])).unwrap().len(), 2);
        assert_eq!(documents(&json!({"data": [{"a": 1}]})).unwrap().len(), 1);
        assert_eq!(documents(&json!({"assetId": 1})).unwrap().len(), 1);
        assert!(documents(&json!("text")).is_err());
    }
}
