//! Integration tests for the staging layer.

use chrono::NaiveDate;
use serde_json::json;
use tempfile::TempDir;

use medical_warehouse_rust::config::{PipelineConfig, ReportConfig};
use medical_warehouse_rust::loader::RecordLoader;
use medical_warehouse_rust::pipeline::TransformationPipeline;
use medical_warehouse_rust::Warehouse;

const RUN_TIME: &str = "2025-07-31 12:00:00";

fn setup() -> (TempDir, Warehouse, TransformationPipeline, ReportConfig) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("warehouse.db");
    let warehouse =
        Warehouse::new(path.to_str().expect("utf-8 path")).expect("Failed to create warehouse");

    let run_time = NaiveDate::from_ymd_opt(2025, 7, 31)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .expect("valid run time");
    let pipeline = TransformationPipeline::with_run_time(PipelineConfig::default(), run_time);

    let report = ReportConfig {
        output_directory: dir
            .path()
            .join("reports")
            .to_string_lossy()
            .into_owned(),
    };

    (dir, warehouse, pipeline, report)
}

fn staging_row(
    warehouse: &Warehouse,
    message_id: i64,
) -> Option<(String, i64, bool, bool, String)> {
    let conn = warehouse.get_connection().expect("connection");
    conn.query_row(
        "SELECT cleaned_message_text, message_length, is_empty_message, has_negative_views, \
         data_quality_status FROM stg_telegram_messages WHERE message_id = ?",
        [message_id],
        |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        },
    )
    .ok()
}

#[test]
fn future_dated_record_is_dropped_entirely() {
    let (_dir, warehouse, pipeline, report) = setup();

    RecordLoader::new(&warehouse)
        .load_batch(&[
            // Two days after the pipeline's run time
            json!({ "message_id": 1, "channel_name": "x", "message_date": "2025-08-02 09:00:00", "message_text": "from the future" }),
            json!({ "message_id": 2, "channel_name": "x", "message_date": "2025-07-01 09:00:00", "message_text": "from the past" }),
        ])
        .expect("load");

    let summary = pipeline
        .run(&warehouse, None, &report)
        .expect("run should succeed");

    assert_eq!(summary.staging_rows, 1);
    assert!(staging_row(&warehouse, 1).is_none());
    assert!(staging_row(&warehouse, 2).is_some());
}

#[test]
fn run_time_itself_is_not_future() {
    let (_dir, warehouse, pipeline, report) = setup();

    RecordLoader::new(&warehouse)
        .load_batch(&[json!({
            "message_id": 1, "channel_name": "x",
            "message_date": RUN_TIME, "message_text": "right on time"
        })])
        .expect("load");

    let summary = pipeline.run(&warehouse, None, &report).expect("run");
    assert_eq!(summary.staging_rows, 1);
}

#[test]
fn negative_views_are_flagged_needs_review() {
    let (_dir, warehouse, pipeline, report) = setup();

    RecordLoader::new(&warehouse)
        .load_batch(&[json!({
            "message_id": 1, "channel_name": "x",
            "message_date": "2025-07-01 09:00:00",
            "message_text": "promo", "views": -5
        })])
        .expect("load");

    pipeline.run(&warehouse, None, &report).expect("run");

    let (_, _, is_empty, has_negative, status) =
        staging_row(&warehouse, 1).expect("row should be staged");
    assert!(!is_empty);
    assert!(has_negative);
    assert_eq!(status, "needs_review");
}

#[test]
fn empty_message_is_flagged_and_text_is_trimmed() {
    let (_dir, warehouse, pipeline, report) = setup();

    RecordLoader::new(&warehouse)
        .load_batch(&[
            json!({ "message_id": 1, "channel_name": "x", "message_date": "2025-07-01 09:00:00", "message_text": "   " }),
            json!({ "message_id": 2, "channel_name": "x", "message_date": "2025-07-01 09:00:00", "message_text": "  padded text  " }),
        ])
        .expect("load");

    pipeline.run(&warehouse, None, &report).expect("run");

    let (cleaned, length, is_empty, _, status) =
        staging_row(&warehouse, 1).expect("empty row staged");
    assert_eq!(cleaned, "");
    assert_eq!(length, 0);
    assert!(is_empty);
    assert_eq!(status, "needs_review");

    let (cleaned, length, is_empty, _, status) =
        staging_row(&warehouse, 2).expect("padded row staged");
    assert_eq!(cleaned, "padded text");
    assert_eq!(length, 11);
    assert!(!is_empty);
    assert_eq!(status, "valid");
}

#[test]
fn missing_and_unparseable_timestamps_are_excluded() {
    let (_dir, warehouse, pipeline, report) = setup();

    RecordLoader::new(&warehouse)
        .load_batch(&[
            json!({ "message_id": 1, "channel_name": "x", "message_text": "no date" }),
            json!({ "message_id": 2, "channel_name": "x", "message_date": "sometime last week", "message_text": "bad date" }),
            json!({ "message_id": 3, "channel_name": "x", "message_date": "2025-07-01T09:00:00+00:00", "message_text": "good date" }),
        ])
        .expect("load");

    let summary = pipeline.run(&warehouse, None, &report).expect("run");
    assert_eq!(summary.staging_rows, 1);
    assert!(staging_row(&warehouse, 3).is_some());
}

#[test]
fn failed_transform_leaves_previous_warehouse_intact() {
    let (_dir, warehouse, pipeline, report) = setup();

    RecordLoader::new(&warehouse)
        .load_batch(&[
            json!({ "message_id": 1, "channel_name": "x", "message_date": "2025-07-01 09:00:00", "message_text": "a" }),
            json!({ "message_id": 2, "channel_name": "x", "message_date": "2025-07-02 09:00:00", "message_text": "b" }),
        ])
        .expect("load");

    let first = pipeline.run(&warehouse, None, &report).expect("first run");
    assert_eq!(first.staging_rows, 2);
    assert_eq!(first.fact_rows, 2);

    // Sabotage the next run: without the raw table the staging stage errors
    // mid-transaction and the whole transform must roll back
    let conn = warehouse.get_connection().expect("connection");
    conn.execute_batch("DROP TABLE raw_telegram_messages;")
        .expect("drop raw table");
    drop(conn);

    assert!(pipeline.run(&warehouse, None, &report).is_err());

    // The previous star schema is still complete and queryable
    let counts = warehouse.table_counts().expect("counts");
    assert_eq!(counts.staging, 2);
    assert_eq!(counts.fct_messages, 2);
    assert_eq!(counts.dim_channels, 1);
    assert!(counts.dim_dates > 0);

    let (cleaned, _, _, _, status) = staging_row(&warehouse, 1).expect("row survives rollback");
    assert_eq!(cleaned, "a");
    assert_eq!(status, "valid");
}

#[test]
fn rerunning_the_transformation_does_not_duplicate_staging_rows() {
    let (_dir, warehouse, pipeline, report) = setup();

    RecordLoader::new(&warehouse)
        .load_batch(&[
            json!({ "message_id": 1, "channel_name": "x", "message_date": "2025-07-01 09:00:00", "message_text": "a" }),
            json!({ "message_id": 2, "channel_name": "x", "message_date": "2025-07-02 09:00:00", "message_text": "b" }),
        ])
        .expect("load");

    let first = pipeline.run(&warehouse, None, &report).expect("first run");
    let second = pipeline.run(&warehouse, None, &report).expect("second run");

    assert_eq!(first.staging_rows, 2);
    assert_eq!(second.staging_rows, 2);
    assert_eq!(first.fact_rows, second.fact_rows);

    let counts = warehouse.table_counts().expect("counts");
    assert_eq!(counts.staging, 2);
}
