//! Tests for the staging models

use campsite_warehouse::models::{RawTable, Value};
use campsite_warehouse::staging::{DedupMode, ExtractError, StagingModel, StagingOutput};
use chrono::{NaiveDate, Utc};
use serde_json::json;

fn alerts_payload(heading: &str) -> serde_json::Value {
    json!([
        {
            "assetId": 5,
            "name": "Bush Camp",
            "alerts": [
                {"displayDate": "2024-01-01", "heading": heading, "detail": "Fire risk"}
            ]
        },
        {"assetId": 6, "name": "Quiet Bay", "alerts": []}
    ])
}

#[test]
fn test_alerts_row_per_nested_alert() {
    let mut raw = RawTable::new("raw.doc_campsites_alerts");
    raw.insert("data/raw/doc/campsites_alerts", "a.json", alerts_payload("Closed"), Utc::now());

    let output = StagingModel::CampsiteAlerts
        .run(&raw, DedupMode::LatestPerFile)
        .unwrap();

    let StagingOutput::Alerts(rows) = &output else {
        panic!("expected alerts output");
    };
    assert_eq!(rows.len(), 1);
    let alert = &rows[0].record;
    assert_eq!(alert.asset_id, 5);
    assert_eq!(alert.name.as_deref(), Some("Bush Camp"));
    assert_eq!(alert.display_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    assert_eq!(alert.heading.as_deref(), Some("Closed"));
    assert_eq!(alert.detail.as_deref(), Some("Fire risk"));
}

#[test]
fn test_alerts_read_latest_load_of_each_file() {
    let mut raw = RawTable::new("raw.doc_campsites_alerts");
    raw.insert("data/raw", "a.json", alerts_payload("Old"), Utc::now());
    raw.insert("data/raw", "b.json", alerts_payload("Other file"), Utc::now());
    raw.insert("data/raw", "a.json", alerts_payload("New"), Utc::now());

    let batch = StagingModel::CampsiteAlerts
        .run(&raw, DedupMode::LatestPerFile)
        .unwrap()
        .to_batch();

    let headings: Vec<(u64, Value)> = batch
        .rows
        .iter()
        .map(|r| (r.load_id, r.row["heading"].clone()))
        .collect();
    assert_eq!(
        headings,
        vec![
            (2, Value::Text("Other file".into())),
            (3, Value::Text("New".into())),
        ]
    );
}

#[test]
fn test_without_dedup_every_load_is_staged() {
    let mut raw = RawTable::new("raw.doc_campsites_alerts");
    raw.insert("data/raw", "a.json", alerts_payload("Old"), Utc::now());
    raw.insert("data/raw", "a.json", alerts_payload("New"), Utc::now());

    let output = StagingModel::CampsiteAlerts.run(&raw, DedupMode::None).unwrap();
    assert_eq!(output.len(), 2);
}

#[test]
fn test_detail_casts_and_keeps_lists_as_json() {
    let mut raw = RawTable::new("raw.doc_campsites_detail");
    raw.insert(
        "data/raw",
        "5.json",
        json!({
            "assetId": "5",
            "name": "Bush Camp",
            "status": "OPEN",
            "bookable": "true",
            "numberOfPoweredSites": 4,
            "x": "1594060.5",
            "facilities": ["toilets", "water"],
            "activities": {"walking": true}
        }),
        Utc::now(),
    );

    let batch = StagingModel::CampsiteDetails
        .run(&raw, DedupMode::None)
        .unwrap()
        .to_batch();
    let row = &batch.rows[0].row;

    assert_eq!(row["asset_id"], Value::Integer(5));
    assert_eq!(row["bookable"], Value::Boolean(true));
    assert_eq!(row["number_of_powered_sites"], Value::Integer(4));
    assert_eq!(row["easting"], Value::Float(1594060.5));
    assert_eq!(row["facilities"], Value::Json(json!(["toilets", "water"])));
    assert_eq!(row["activities"], Value::Json(json!({"walking": true})));
    assert_eq!(row["introduction"], Value::Null);
    assert!(matches!(row["loaded_at"], Value::Timestamp(_)));
}

#[test]
fn test_cast_failure_names_the_raw_row() {
    let mut raw = RawTable::new("raw.doc_campsites_detail");
    raw.insert("data/raw", "1.json", json!({"assetId": 1}), Utc::now());
    raw.insert("data/raw", "2.json", json!({"assetId": 2, "bookable": "maybe"}), Utc::now());

    let err = StagingModel::CampsiteDetails
        .run(&raw, DedupMode::None)
        .unwrap_err();
    assert_eq!(err.load_id, 2);
    assert_eq!(err.source_path, "data/raw/2.json");
    assert!(err.is_cast_error());
}

#[test]
fn test_missing_asset_id_is_rejected() {
    let mut raw = RawTable::new("raw.doc_campsites");
    raw.insert("data/raw", "list.json", json!([{"name": "No id"}]), Utc::now());

    let err = StagingModel::Campsites.run(&raw, DedupMode::None).unwrap_err();
    assert_eq!(err.error, ExtractError::MissingField("assetId".to_string()));
}

#[test]
fn test_empty_raw_table_stages_nothing() {
    let raw = RawTable::new("raw.doc_campsites");
    for model in StagingModel::ALL {
        assert!(model.run(&raw, model.default_dedup()).unwrap().is_empty());
    }
}
