//! Integration tests for the quality battery and its report artifact.

use chrono::NaiveDate;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

use medical_warehouse_rust::config::{PipelineConfig, ReportConfig};
use medical_warehouse_rust::loader::RecordLoader;
use medical_warehouse_rust::pipeline::TransformationPipeline;
use medical_warehouse_rust::Warehouse;

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
        output_directory: dir.path().join("reports").to_string_lossy().into_owned(),
    };

    (dir, warehouse, pipeline, report)
}

#[test]
fn all_checks_pass_on_a_freshly_built_warehouse() {
    let (_dir, warehouse, pipeline, report) = setup();

    RecordLoader::new(&warehouse)
        .load_batch(&[
            json!({ "message_id": 1, "channel_name": "tikvahpharma", "message_date": "2025-07-10 09:00:00", "message_text": "a", "views": 10 }),
            json!({ "message_id": 2, "channel_name": "lobelia4cosmetics", "message_date": "2025-07-11 09:00:00", "message_text": "b", "views": 20 }),
        ])
        .expect("load");

    let summary = pipeline.run(&warehouse, None, &report).expect("run");

    assert!(summary.report.all_passed);
    assert_eq!(summary.report.results.len(), 5);
    for result in &summary.report.results {
        assert!(result.passed, "check '{}' failed", result.test_name);
        assert_eq!(result.result, 0, "check '{}' counted violations", result.test_name);
    }
}

#[test]
fn report_artifact_is_written_as_csv() {
    let (dir, warehouse, pipeline, report) = setup();

    RecordLoader::new(&warehouse)
        .load_batch(&[json!({ "message_id": 1, "channel_name": "x", "message_date": "2025-07-10 09:00:00", "message_text": "a" })])
        .expect("load");

    pipeline.run(&warehouse, None, &report).expect("run");

    let report_path = dir.path().join("reports").join("data_quality_tests.csv");
    let contents = fs::read_to_string(&report_path).expect("report file should exist");
    let lines: Vec<&str> = contents.lines().collect();

    // Header plus one line per check
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "Test Name,Status,Result,Timestamp");
    assert!(lines.iter().skip(1).all(|line| line.contains("PASS")));
    assert!(contents.contains("No future dates"));
    assert!(contents.contains("Foreign key integrity (dates)"));
}

#[test]
fn schema_documentation_is_written() {
    let (dir, warehouse, pipeline, report) = setup();

    pipeline.run(&warehouse, None, &report).expect("run");

    let doc_path = dir.path().join("reports").join("schema_documentation.md");
    let contents = fs::read_to_string(&doc_path).expect("doc file should exist");
    assert!(contents.contains("dim_dates"));
    assert!(contents.contains("dim_channels"));
    assert!(contents.contains("fct_messages"));
}

#[test]
fn check_execution_errors_are_reported_not_fatal() {
    let (_dir, warehouse, pipeline, report) = setup();

    // No transformation has run: the star tables do not exist yet, so every
    // check errors. The battery still reports all five results.
    let quality = pipeline.test(&warehouse, &report).expect("battery should run");

    assert!(!quality.all_passed);
    assert_eq!(quality.results.len(), 5);
    for result in &quality.results {
        assert!(!result.passed);
        assert_eq!(result.result, -1);
    }
}

#[test]
fn battery_is_repeatable() {
    let (_dir, warehouse, pipeline, report) = setup();

    RecordLoader::new(&warehouse)
        .load_batch(&[json!({ "message_id": 1, "channel_name": "x", "message_date": "2025-07-10 09:00:00", "message_text": "a" })])
        .expect("load");

    pipeline.run(&warehouse, None, &report).expect("run");

    let first = pipeline.test(&warehouse, &report).expect("first battery");
    let second = pipeline.test(&warehouse, &report).expect("second battery");

    assert!(first.all_passed);
    assert!(second.all_passed);
    assert_eq!(first.results.len(), second.results.len());
}
