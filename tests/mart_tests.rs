//! Tests for incremental mart merges

use campsite_warehouse::mart::{
    MartConfig, MartError, MartModel, MartTable, Materialization, OnSchemaChange, SchemaChange,
    SchemaError, materialize,
};
use campsite_warehouse::models::{Batch, ColumnDef, ColumnType, RawTable, Row, TableSchema, Value};
use campsite_warehouse::staging::{DedupMode, StagingModel, StagingOutput};
use chrono::Utc;
use serde_json::json;

fn details(docs: &[serde_json::Value]) -> StagingOutput {
    let mut raw = RawTable::new("raw.doc_campsites_detail");
    for (i, doc) in docs.iter().enumerate() {
        raw.insert("data/raw", format!("{}.json", i), doc.clone(), Utc::now());
    }
    StagingModel::CampsiteDetails
        .run(&raw, DedupMode::None)
        .unwrap()
}

fn empty_mart(model: MartModel) -> MartTable {
    MartTable::new(model.name(), TableSchema::default(), vec!["asset_id".to_string()])
}

fn schema(columns: &[(&str, ColumnType)]) -> TableSchema {
    TableSchema::new(
        columns
            .iter()
            .map(|(name, data_type)| ColumnDef::new(*name, *data_type))
            .collect(),
    )
}

fn row(values: &[(&str, Value)]) -> Row {
    values
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

#[test]
fn test_facilities_rows_for_single_campsite() {
    let input = details(&[json!({"assetId": 5, "facilities": ["toilets", "water"]})]);
    let mut table = empty_mart(MartModel::Facilities);

    let stats = materialize(
        MartModel::Facilities,
        &mut table,
        &input,
        &MartModel::Facilities.default_config(),
        false,
    )
    .unwrap();

    assert_eq!(stats.rows_total, 2);
    let rows = table.get_by_id(5).unwrap();
    let pairs: Vec<(Value, Value)> = rows
        .iter()
        .map(|r| (r["asset_id"].clone(), r["facility"].clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (Value::Integer(5), text("toilets")),
            (Value::Integer(5), text("water")),
        ]
    );
}

#[test]
fn test_second_load_overwrites_status() {
    let config = MartModel::Campsites.default_config();
    let mut table = empty_mart(MartModel::Campsites);

    let first = details(&[json!({"assetId": 5, "status": "OPEN"})]);
    materialize(MartModel::Campsites, &mut table, &first, &config, false).unwrap();

    let second = details(&[
        json!({"assetId": 5, "status": "OPEN"}),
        json!({"assetId": 5, "status": "CLOSED"}),
    ]);
    let stats = materialize(MartModel::Campsites, &mut table, &second, &config, false).unwrap();

    assert_eq!(stats.keys_updated, 1);
    assert_eq!(stats.keys_inserted, 0);
    assert_eq!(stats.rows_superseded, 1);
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.get_by_id(5).unwrap()[0]["status"], text("CLOSED"));
}

#[test]
fn test_merge_keeps_keys_absent_from_batch() {
    let config = MartModel::Campsites.default_config();
    let mut table = empty_mart(MartModel::Campsites);

    let first = details(&[json!({"assetId": 1}), json!({"assetId": 2})]);
    materialize(MartModel::Campsites, &mut table, &first, &config, false).unwrap();

    let second = details(&[json!({"assetId": 2, "name": "Renamed"}), json!({"assetId": 3})]);
    let stats = materialize(MartModel::Campsites, &mut table, &second, &config, false).unwrap();

    assert_eq!(stats.keys_inserted, 1);
    assert_eq!(stats.keys_updated, 1);
    assert_eq!(table.key_count(), 3);
    assert!(table.get_by_id(1).is_some());
    assert_eq!(table.get_by_id(2).unwrap()[0]["name"], text("Renamed"));
}

#[test]
fn test_rerun_with_same_input_is_idempotent() {
    let input = details(&[
        json!({"assetId": 5, "facilities": ["toilets", "water"]}),
        json!({"assetId": 6, "facilities": ["shower"]}),
    ]);
    let config = MartModel::Facilities.default_config();
    let mut table = empty_mart(MartModel::Facilities);

    materialize(MartModel::Facilities, &mut table, &input, &config, false).unwrap();
    let first: Vec<Row> = table.rows().cloned().collect();

    materialize(MartModel::Facilities, &mut table, &input, &config, false).unwrap();
    let second: Vec<Row> = table.rows().cloned().collect();

    assert_eq!(first, second);
    assert_eq!(table.row_count(), 3);
}

#[test]
fn test_child_mart_replaces_row_set_of_key() {
    let config = MartModel::Facilities.default_config();
    let mut table = empty_mart(MartModel::Facilities);

    let first = details(&[json!({"assetId": 5, "facilities": ["toilets", "water"]})]);
    materialize(MartModel::Facilities, &mut table, &first, &config, false).unwrap();

    let second = details(&[json!({"assetId": 5, "facilities": ["shower"]})]);
    materialize(MartModel::Facilities, &mut table, &second, &config, false).unwrap();

    let rows = table.get_by_id(5).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["facility"], text("shower"));
}

#[test]
fn test_append_new_columns_null_fills_existing_rows() {
    let config = MartConfig::entity().with_on_schema_change(OnSchemaChange::AppendNewColumns);
    let mut table = MartTable::new("campsites", TableSchema::default(), config.unique_key.clone());

    let mut first = Batch::new(schema(&[
        ("asset_id", ColumnType::Integer),
        ("name", ColumnType::Text),
    ]));
    first.push(
        1,
        Utc::now(),
        row(&[("asset_id", Value::Integer(1)), ("name", text("A"))]),
    );
    table.merge(&first, &config, false).unwrap();

    let mut second = Batch::new(schema(&[
        ("asset_id", ColumnType::Integer),
        ("region", ColumnType::Text),
    ]));
    second.push(
        2,
        Utc::now(),
        row(&[("asset_id", Value::Integer(2)), ("region", text("Otago"))]),
    );
    let stats = table.merge(&second, &config, false).unwrap();

    assert_eq!(
        stats.schema_changes,
        vec![SchemaChange::Added {
            column: "region".to_string(),
            data_type: ColumnType::Text,
        }]
    );
    assert!(table.schema.contains("name"));
    assert!(table.schema.contains("region"));
    assert_eq!(table.get_by_id(1).unwrap()[0]["region"], Value::Null);
    assert_eq!(table.get_by_id(2).unwrap()[0]["name"], Value::Null);
}

#[test]
fn test_sync_all_columns_drops_and_widens() {
    let config = MartConfig::entity();
    let mut table = MartTable::new("campsites", TableSchema::default(), config.unique_key.clone());

    let mut first = Batch::new(schema(&[
        ("asset_id", ColumnType::Integer),
        ("sites", ColumnType::Integer),
        ("legacy", ColumnType::Text),
    ]));
    first.push(
        1,
        Utc::now(),
        row(&[
            ("asset_id", Value::Integer(1)),
            ("sites", Value::Integer(10)),
            ("legacy", text("x")),
        ]),
    );
    table.merge(&first, &config, false).unwrap();

    let mut second = Batch::new(schema(&[
        ("asset_id", ColumnType::Integer),
        ("sites", ColumnType::Float),
    ]));
    second.push(
        2,
        Utc::now(),
        row(&[("asset_id", Value::Integer(2)), ("sites", Value::Float(2.5))]),
    );
    let stats = table.merge(&second, &config, false).unwrap();

    assert!(stats.schema_changes.contains(&SchemaChange::Removed {
        column: "legacy".to_string()
    }));
    assert!(!table.schema.contains("legacy"));
    assert_eq!(table.schema.column_type("sites"), Some(ColumnType::Float));
    assert_eq!(table.get_by_id(1).unwrap()[0]["sites"], Value::Float(10.0));
}

#[test]
fn test_fail_policy_leaves_table_untouched() {
    let config = MartConfig::entity().with_on_schema_change(OnSchemaChange::Fail);
    let mut table = MartTable::new("campsites", TableSchema::default(), config.unique_key.clone());

    let mut first = Batch::new(schema(&[("asset_id", ColumnType::Integer)]));
    first.push(1, Utc::now(), row(&[("asset_id", Value::Integer(1))]));
    table.merge(&first, &config, false).unwrap();
    let before = table.clone();

    let mut second = Batch::new(schema(&[
        ("asset_id", ColumnType::Integer),
        ("name", ColumnType::Text),
    ]));
    second.push(
        2,
        Utc::now(),
        row(&[("asset_id", Value::Integer(2)), ("name", text("B"))]),
    );
    let err = table.merge(&second, &config, false).unwrap_err();

    assert!(matches!(
        err,
        MartError::Schema(SchemaError::DriftNotAllowed(_))
    ));
    assert_eq!(table, before);
}

#[test]
fn test_incompatible_type_change_is_rejected() {
    let config = MartConfig::entity();
    let mut table = MartTable::new("campsites", TableSchema::default(), config.unique_key.clone());

    let mut first = Batch::new(schema(&[
        ("asset_id", ColumnType::Integer),
        ("hours", ColumnType::Json),
    ]));
    first.push(
        1,
        Utc::now(),
        row(&[
            ("asset_id", Value::Integer(1)),
            ("hours", Value::Json(json!({"open": "08:00"}))),
        ]),
    );
    table.merge(&first, &config, false).unwrap();

    let mut second = Batch::new(schema(&[
        ("asset_id", ColumnType::Integer),
        ("hours", ColumnType::Text),
    ]));
    second.push(
        2,
        Utc::now(),
        row(&[("asset_id", Value::Integer(1)), ("hours", text("8am"))]),
    );

    assert!(matches!(
        table.merge(&second, &config, false),
        Err(MartError::Schema(SchemaError::IncompatibleType { .. }))
    ));
}

#[test]
fn test_full_refresh_rebuilds_from_batch() {
    let config = MartModel::Campsites.default_config();
    let mut table = empty_mart(MartModel::Campsites);

    let first = details(&[json!({"assetId": 1}), json!({"assetId": 2})]);
    materialize(MartModel::Campsites, &mut table, &first, &config, false).unwrap();

    let second = details(&[json!({"assetId": 3})]);
    let stats = materialize(MartModel::Campsites, &mut table, &second, &config, true).unwrap();

    assert!(stats.rebuilt);
    assert_eq!(table.key_count(), 1);
    assert!(table.get_by_id(3).is_some());
}

#[test]
fn test_table_materialization_always_rebuilds() {
    let config = MartModel::Campsites
        .default_config()
        .with_materialization(Materialization::Table);
    let mut table = empty_mart(MartModel::Campsites);

    materialize(
        MartModel::Campsites,
        &mut table,
        &details(&[json!({"assetId": 1})]),
        &config,
        false,
    )
    .unwrap();
    materialize(
        MartModel::Campsites,
        &mut table,
        &details(&[json!({"assetId": 2})]),
        &config,
        false,
    )
    .unwrap();

    assert_eq!(table.key_count(), 1);
    assert!(table.get_by_id(1).is_none());
}

#[test]
fn test_null_key_is_rejected() {
    let config = MartConfig::entity();
    let mut table = MartTable::new("campsites", TableSchema::default(), config.unique_key.clone());

    let mut batch = Batch::new(schema(&[
        ("asset_id", ColumnType::Integer),
        ("name", ColumnType::Text),
    ]));
    batch.push(
        1,
        Utc::now(),
        row(&[("asset_id", Value::Null), ("name", text("A"))]),
    );

    assert!(matches!(
        table.merge(&batch, &config, false),
        Err(MartError::NullKey { .. })
    ));
    assert!(table.is_empty());
}
