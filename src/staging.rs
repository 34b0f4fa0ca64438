//! Staging layer construction.
//!
//! Every downstream dimension and fact depends on this pass: raw rows are
//! normalized, quality-flagged, and rebuilt into `stg_telegram_messages`.
//! Rows with unparseable timestamps are excluded (treated as null), and rows
//! dated strictly after the run time are dropped entirely rather than flagged,
//! because unreliable dates would contaminate the date-dimension range.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::error::Result;
use crate::metrics::PipelineMetrics;
use crate::models::{QualityStatus, StagingRecord};
use crate::schema::{raw_messages, staging};

/// Canonical timestamp format stored in staging (`DATE()`-compatible)
pub const CANONICAL_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

const CREATE_SQL: &str = "
CREATE TABLE stg_telegram_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id INTEGER NOT NULL,
    channel_name TEXT NOT NULL,
    channel_username TEXT,
    channel_title TEXT,
    message_date TEXT NOT NULL,
    scraped_at TEXT,
    message_text TEXT,
    cleaned_message_text TEXT NOT NULL,
    message_length INTEGER NOT NULL,
    has_media BOOLEAN NOT NULL,
    image_path TEXT,
    has_image BOOLEAN NOT NULL,
    views INTEGER NOT NULL,
    forwards INTEGER NOT NULL,
    is_empty_message BOOLEAN NOT NULL,
    is_future_date BOOLEAN NOT NULL,
    has_negative_views BOOLEAN NOT NULL,
    data_quality_status TEXT NOT NULL
);
";

/// Builds the cleaned, quality-annotated staging table
pub struct StagingBuilder {
    run_time: NaiveDateTime,
    metrics: PipelineMetrics,
}

impl StagingBuilder {
    /// Create a builder evaluating future-date checks against `run_time`
    #[must_use]
    pub fn new(run_time: NaiveDateTime) -> Self {
        Self {
            run_time,
            metrics: PipelineMetrics::default(),
        }
    }

    /// Rebuild the staging table from raw messages.
    ///
    /// Returns the number of staging rows emitted.
    pub fn build(&self, conn: &Connection) -> Result<usize> {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", staging::TABLE))?;
        conn.execute_batch(CREATE_SQL)?;

        let mut select = conn.prepare(&format!(
            "SELECT {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {} FROM {} \
             WHERE {} IS NOT NULL ORDER BY {}",
            raw_messages::MESSAGE_ID,
            raw_messages::CHANNEL_NAME,
            raw_messages::CHANNEL_USERNAME,
            raw_messages::CHANNEL_TITLE,
            raw_messages::MESSAGE_DATE,
            raw_messages::MESSAGE_TEXT,
            raw_messages::HAS_MEDIA,
            raw_messages::IMAGE_PATH,
            raw_messages::VIEWS,
            raw_messages::FORWARDS,
            raw_messages::SCRAPED_AT,
            raw_messages::TABLE,
            raw_messages::MESSAGE_DATE,
            raw_messages::ID,
        ))?;

        let raw_rows = select.query_map([], |row| {
            Ok(RawRow {
                message_id: row.get(0)?,
                channel_name: row.get(1)?,
                channel_username: row.get(2)?,
                channel_title: row.get(3)?,
                message_date: row.get(4)?,
                message_text: row.get(5)?,
                has_media: row.get(6)?,
                image_path: row.get(7)?,
                views: row.get(8)?,
                forwards: row.get(9)?,
                scraped_at: row.get(10)?,
            })
        })?;

        let mut insert = conn.prepare(&format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            staging::TABLE,
            staging::MESSAGE_ID,
            staging::CHANNEL_NAME,
            staging::CHANNEL_USERNAME,
            staging::CHANNEL_TITLE,
            staging::MESSAGE_DATE,
            staging::SCRAPED_AT,
            staging::MESSAGE_TEXT,
            staging::CLEANED_MESSAGE_TEXT,
            staging::MESSAGE_LENGTH,
            staging::HAS_MEDIA,
            staging::IMAGE_PATH,
            staging::HAS_IMAGE,
            staging::VIEWS,
            staging::FORWARDS,
            staging::IS_EMPTY_MESSAGE,
            staging::IS_FUTURE_DATE,
            staging::HAS_NEGATIVE_VIEWS,
            staging::DATA_QUALITY_STATUS,
        ))?;

        let mut emitted = 0;
        let mut unparseable = 0;
        let mut future_dropped = 0;

        for raw in raw_rows {
            let raw = raw?;

            let Some(message_date) = parse_timestamp(&raw.message_date) else {
                debug!(
                    message_id = raw.message_id,
                    raw_date = %raw.message_date,
                    "Excluding row with unparseable timestamp"
                );
                unparseable += 1;
                continue;
            };

            if message_date > self.run_time {
                future_dropped += 1;
                continue;
            }

            let record = stage_record(raw, message_date);
            insert.execute(params![
                record.message_id,
                record.channel_name,
                record.channel_username,
                record.channel_title,
                record.message_date.format(CANONICAL_TIMESTAMP).to_string(),
                record.scraped_at,
                record.message_text,
                record.cleaned_message_text,
                record.message_length,
                record.has_media,
                record.image_path,
                record.has_image,
                record.views,
                record.forwards,
                record.is_empty_message,
                record.is_future_date,
                record.has_negative_views,
                record.data_quality_status.as_str(),
            ])?;
            emitted += 1;
        }

        self.metrics.record_dropped("staging", "unparseable_timestamp", unparseable);
        self.metrics.record_dropped("staging", "future_date", future_dropped);
        info!(
            emitted,
            unparseable, future_dropped, "Rebuilt staging table"
        );
        Ok(emitted)
    }
}

struct RawRow {
    message_id: i64,
    channel_name: String,
    channel_username: Option<String>,
    channel_title: Option<String>,
    message_date: String,
    message_text: Option<String>,
    has_media: bool,
    image_path: Option<String>,
    views: i64,
    forwards: i64,
    scraped_at: Option<String>,
}

/// Compute the derived staging fields for one raw row with a parsed,
/// non-future timestamp.
fn stage_record(raw: RawRow, message_date: NaiveDateTime) -> StagingRecord {
    let cleaned = raw.message_text.as_deref().unwrap_or("").trim().to_string();
    let message_length = cleaned.chars().count() as i64;
    let has_image = raw.image_path.is_some();
    let is_empty_message = cleaned.is_empty();
    let has_negative_views = raw.views < 0;
    // Future-dated rows never reach this point; the flag column stays for the
    // external column contract.
    let is_future_date = false;

    let data_quality_status = if is_empty_message || is_future_date || has_negative_views {
        QualityStatus::NeedsReview
    } else {
        QualityStatus::Valid
    };

    StagingRecord {
        message_id: raw.message_id,
        channel_name: raw.channel_name,
        channel_username: raw.channel_username,
        channel_title: raw.channel_title,
        message_date,
        scraped_at: raw.scraped_at,
        message_text: raw.message_text,
        cleaned_message_text: cleaned,
        message_length,
        has_media: raw.has_media,
        image_path: raw.image_path,
        has_image,
        views: raw.views,
        forwards: raw.forwards,
        is_empty_message,
        is_future_date,
        has_negative_views,
        data_quality_status,
    }
}

/// Parse a message timestamp leniently.
///
/// Accepts RFC 3339 (the scraper's format), `YYYY-MM-DDTHH:MM:SS` with
/// optional fractional seconds, the canonical `YYYY-MM-DD HH:MM:SS`, and a
/// bare date. Anything else behaves as a null timestamp.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row(text: Option<&str>, views: i64, image_path: Option<&str>) -> RawRow {
        RawRow {
            message_id: 1,
            channel_name: "tikvahpharma".to_string(),
            channel_username: Some("@tikvahpharma".to_string()),
            channel_title: Some("Tikvah Pharma".to_string()),
            message_date: "2025-07-01 10:00:00".to_string(),
            message_text: text.map(ToString::to_string),
            has_media: false,
            image_path: image_path.map(ToString::to_string),
            views,
            forwards: 0,
            scraped_at: None,
        }
    }

    fn ts(raw: &str) -> NaiveDateTime {
        parse_timestamp(raw).expect("test timestamp should parse")
    }

    #[test]
    fn parses_rfc3339_timestamps() {
        let parsed = parse_timestamp("2025-07-01T10:30:00+00:00").expect("should parse");
        assert_eq!(parsed.format(CANONICAL_TIMESTAMP).to_string(), "2025-07-01 10:30:00");
    }

    #[test]
    fn parses_canonical_and_bare_date() {
        assert!(parse_timestamp("2025-07-01 10:30:00").is_some());
        assert!(parse_timestamp("2025-07-01T10:30:00.123456").is_some());
        let midnight = parse_timestamp("2025-07-01").expect("should parse");
        assert_eq!(midnight.format(CANONICAL_TIMESTAMP).to_string(), "2025-07-01 00:00:00");
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("2025-13-40").is_none());
    }

    #[test]
    fn trims_text_and_counts_characters() {
        let record = stage_record(raw_row(Some("  ጤና ምርመራ  "), 10, None), ts("2025-07-01 10:00:00"));
        assert_eq!(record.cleaned_message_text, "ጤና ምርመራ");
        // Character count, not byte count
        assert_eq!(record.message_length, 7);
        assert_eq!(record.data_quality_status, QualityStatus::Valid);
    }

    #[test]
    fn flags_empty_messages() {
        let record = stage_record(raw_row(Some("   "), 10, None), ts("2025-07-01 10:00:00"));
        assert!(record.is_empty_message);
        assert_eq!(record.message_length, 0);
        assert_eq!(record.data_quality_status, QualityStatus::NeedsReview);
    }

    #[test]
    fn flags_negative_views() {
        let record = stage_record(raw_row(Some("hello"), -5, None), ts("2025-07-01 10:00:00"));
        assert!(record.has_negative_views);
        assert_eq!(record.data_quality_status, QualityStatus::NeedsReview);
    }

    #[test]
    fn flags_are_independent() {
        let record = stage_record(raw_row(None, -1, None), ts("2025-07-01 10:00:00"));
        assert!(record.is_empty_message);
        assert!(record.has_negative_views);
        assert_eq!(record.data_quality_status, QualityStatus::NeedsReview);
    }

    #[test]
    fn image_presence_follows_image_path() {
        assert!(stage_record(raw_row(Some("x"), 0, Some("images/1.jpg")), ts("2025-07-01 10:00:00")).has_image);
        assert!(!stage_record(raw_row(Some("x"), 0, None), ts("2025-07-01 10:00:00")).has_image);
    }
}
