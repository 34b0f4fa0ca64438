//! Raw-batch ingestion.
//!
//! Batches arrive as JSON arrays of loosely-typed message objects, one file
//! per channel per scrape day. The loader narrows each entry into a strict
//! [`NewRawMessage`] with documented defaults, skips malformed entries without
//! aborting the batch, and inserts with `(message_id, channel_name)`
//! insert-if-absent semantics so re-loading a batch is a no-op.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::db::Warehouse;
use crate::error::Result;
use crate::metrics::PipelineMetrics;
use crate::models::NewRawMessage;

/// Manifest files written alongside scraped batches; never message data.
const MANIFEST_SUFFIX: &str = "_manifest.json";

/// Loads raw message batches into the warehouse
pub struct RecordLoader<'a> {
    warehouse: &'a Warehouse,
    metrics: PipelineMetrics,
}

impl<'a> RecordLoader<'a> {
    /// Create a loader writing into the given warehouse
    #[must_use]
    pub fn new(warehouse: &'a Warehouse) -> Self {
        Self {
            warehouse,
            metrics: PipelineMetrics::default(),
        }
    }

    /// Load every batch file under `dir` (recursively, the scraper writes
    /// `<dir>/<date>/<channel>.json`), skipping manifest files.
    ///
    /// A file that fails to open or parse is logged and skipped; it does not
    /// abort the remaining files. Returns the count of newly inserted records.
    pub fn load_dir(&self, dir: &Path) -> Result<usize> {
        let mut files = Vec::new();
        collect_batch_files(dir, &mut files)?;
        files.sort();

        let mut inserted = 0;
        for file in &files {
            match self.load_file(file) {
                Ok(count) => inserted += count,
                Err(e) => {
                    error!(file = %file.display(), error = %e, "Failed to load batch file");
                }
            }
        }

        info!(
            files = files.len(),
            inserted, "Finished loading raw batches"
        );
        Ok(inserted)
    }

    /// Load a single batch file. A file holding a single message object is
    /// treated as a one-element batch.
    pub fn load_file(&self, path: &Path) -> Result<usize> {
        let contents = fs::read_to_string(path)?;
        let data: Value = serde_json::from_str(&contents)?;

        let batch = match data {
            Value::Array(values) => values,
            other => vec![other],
        };

        let inserted = self.load_batch(&batch)?;
        info!(
            file = %path.display(),
            records = batch.len(),
            inserted,
            "Loaded batch file"
        );
        Ok(inserted)
    }

    /// Load one ordered batch of loosely-typed message values.
    ///
    /// Returns the count of records newly inserted, not the count seen:
    /// duplicates of an existing `(message_id, channel_name)` identity are
    /// silently ignored.
    pub fn load_batch(&self, batch: &[Value]) -> Result<usize> {
        let conn = self.warehouse.get_connection()?;

        let mut inserted = 0;
        let mut skipped = 0;
        for (index, value) in batch.iter().enumerate() {
            let Some(record) = resolve_record(value) else {
                warn!(index, "Skipping malformed batch entry");
                skipped += 1;
                continue;
            };

            if Warehouse::insert_raw_message(&conn, &record)? {
                inserted += 1;
            }
        }

        self.metrics.record_load(inserted, skipped);
        Ok(inserted)
    }
}

/// Recursively collect `.json` batch files, leaving manifests behind
fn collect_batch_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_batch_files(&path, files)?;
        } else if is_batch_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_batch_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".json") && !name.ends_with(MANIFEST_SUFFIX)
}

/// Narrow one loosely-typed batch entry into a raw message record.
///
/// Returns None for non-object entries and for objects without an integer
/// `message_id`; all other missing fields resolve to defaults (empty text,
/// zero counts, false media flag, load time for `scraped_at`).
fn resolve_record(value: &Value) -> Option<NewRawMessage> {
    let obj = value.as_object()?;
    let message_id = obj.get("message_id")?.as_i64()?;

    Some(NewRawMessage {
        message_id,
        channel_name: string_field(obj, "channel_name").unwrap_or_default(),
        channel_username: string_field(obj, "channel_username"),
        channel_title: string_field(obj, "channel_title"),
        message_date: string_field(obj, "message_date"),
        message_text: Some(string_field(obj, "message_text").unwrap_or_default()),
        has_media: obj.get("has_media").and_then(Value::as_bool).unwrap_or(false),
        image_path: string_field(obj, "image_path"),
        views: obj.get("views").and_then(Value::as_i64).unwrap_or(0),
        forwards: obj.get("forwards").and_then(Value::as_i64).unwrap_or(0),
        scraped_at: string_field(obj, "scraped_at")
            .unwrap_or_else(|| Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string()),
    })
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_defaults_for_missing_fields() {
        let value = json!({ "message_id": 42 });
        let record = resolve_record(&value).expect("record should resolve");
        assert_eq!(record.message_id, 42);
        assert_eq!(record.channel_name, "");
        assert_eq!(record.message_text.as_deref(), Some(""));
        assert_eq!(record.views, 0);
        assert_eq!(record.forwards, 0);
        assert!(!record.has_media);
        assert!(record.message_date.is_none());
        assert!(!record.scraped_at.is_empty());
    }

    #[test]
    fn rejects_non_object_entries() {
        assert!(resolve_record(&json!("not a message")).is_none());
        assert!(resolve_record(&json!(17)).is_none());
        assert!(resolve_record(&json!(null)).is_none());
    }

    #[test]
    fn rejects_missing_message_id() {
        let value = json!({ "channel_name": "tikvahpharma" });
        assert!(resolve_record(&value).is_none());
    }

    #[test]
    fn manifest_files_are_not_batches() {
        assert!(is_batch_file(Path::new("2025-07-10/tikvahpharma.json")));
        assert!(!is_batch_file(Path::new("2025-07-10/_manifest.json")));
        assert!(!is_batch_file(Path::new("2025-07-10/notes.txt")));
    }
}
