//! Data models for the message warehouse
//!
//! This module contains all data structures used throughout the transformation
//! pipeline: raw message records, staging rows, dimension rows, fact rows, and
//! quality-test results.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A raw message record as resolved at the loader boundary.
///
/// Loosely-typed batch entries are narrowed into this shape with documented
/// defaults before insertion; identity is `(message_id, channel_name)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRawMessage {
    /// Source-assigned message identifier (unique only within a channel)
    pub message_id: i64,
    /// Channel name (empty string when absent)
    pub channel_name: String,
    /// Channel username (optional)
    pub channel_username: Option<String>,
    /// Channel title (optional)
    pub channel_title: Option<String>,
    /// Message timestamp as received, unparsed (optional)
    pub message_date: Option<String>,
    /// Message text (optional)
    pub message_text: Option<String>,
    /// True if the message carried any media
    pub has_media: bool,
    /// Reference to a downloaded image (optional)
    pub image_path: Option<String>,
    /// View count (0 when absent)
    pub views: i64,
    /// Forward count (0 when absent)
    pub forwards: i64,
    /// Acquisition timestamp (load time when absent)
    pub scraped_at: String,
}

/// Derived quality classification assigned during staging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityStatus {
    /// Record passed every quality flag
    Valid,
    /// At least one quality flag is set
    NeedsReview,
}

impl QualityStatus {
    /// Stored representation of this status
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::NeedsReview => "needs_review",
        }
    }
}

/// One normalized, quality-annotated row derived from a raw message
#[derive(Debug, Clone)]
pub struct StagingRecord {
    /// Source-assigned message identifier
    pub message_id: i64,
    /// Channel name
    pub channel_name: String,
    /// Channel username (optional)
    pub channel_username: Option<String>,
    /// Channel title (optional)
    pub channel_title: Option<String>,
    /// Parsed message timestamp
    pub message_date: NaiveDateTime,
    /// Acquisition timestamp as received
    pub scraped_at: Option<String>,
    /// Original message text
    pub message_text: Option<String>,
    /// Trimmed message text
    pub cleaned_message_text: String,
    /// Character count of the trimmed text (never negative)
    pub message_length: i64,
    /// True if the message carried any media
    pub has_media: bool,
    /// Reference to a downloaded image (optional)
    pub image_path: Option<String>,
    /// True if an image reference is present
    pub has_image: bool,
    /// View count
    pub views: i64,
    /// Forward count
    pub forwards: i64,
    /// Empty-message quality flag
    pub is_empty_message: bool,
    /// Future-date quality flag (future rows are dropped, so stored rows carry false)
    pub is_future_date: bool,
    /// Negative-view-count quality flag
    pub has_negative_views: bool,
    /// Derived quality status
    pub data_quality_status: QualityStatus,
}

/// One calendar day in the date dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateDimRow {
    /// YYYYMMDD integer key, unique and monotonic with the date
    pub date_key: i64,
    /// The calendar date
    pub full_date: NaiveDate,
    /// Year
    pub year: i32,
    /// Quarter (1-4)
    pub quarter: u32,
    /// Month (1-12)
    pub month: u32,
    /// English month name
    pub month_name: &'static str,
    /// Week of year (weeks start Monday, 1-based)
    pub week_of_year: u32,
    /// Day of month (1-31)
    pub day_of_month: u32,
    /// Day of week (0=Sunday)
    pub day_of_week: u32,
    /// English day name
    pub day_name: &'static str,
    /// True for Saturday and Sunday
    pub is_weekend: bool,
}

/// Business classification of a channel, first-match keyword rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelType {
    /// Pharmacy and drug-related channels
    Pharmaceutical,
    /// Beauty and skincare channels
    Cosmetics,
    /// General health and clinical channels
    Medical,
    /// No keyword matched
    Other,
}

impl ChannelType {
    /// Stored representation of this classification
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pharmaceutical => "Pharmaceutical",
            Self::Cosmetics => "Cosmetics",
            Self::Medical => "Medical",
            Self::Other => "Other",
        }
    }
}

/// Posting recency classification, evaluated against the transformation run time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatus {
    /// Last post within the active window (7 days by default)
    Active,
    /// Last post within the moderate window (30 days by default)
    Moderate,
    /// No recent posts
    Inactive,
}

impl ActivityStatus {
    /// Stored representation of this status
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Moderate => "moderate",
            Self::Inactive => "inactive",
        }
    }
}

/// One row of the channel dimension
#[derive(Debug, Clone)]
pub struct ChannelDimRow {
    /// Dense ranked key (1..N by descending post count)
    pub channel_key: i64,
    /// Channel name
    pub channel_name: String,
    /// Channel username (optional)
    pub channel_username: Option<String>,
    /// Channel title (optional)
    pub channel_title: Option<String>,
    /// Business classification
    pub channel_type: ChannelType,
    /// Earliest valid post timestamp
    pub first_post_date: NaiveDateTime,
    /// Latest valid post timestamp
    pub last_post_date: NaiveDateTime,
    /// Total valid post count
    pub total_posts: i64,
    /// Mean view count, rounded to 2 decimals
    pub avg_views: f64,
    /// Mean forward count, rounded to 2 decimals
    pub avg_forwards: f64,
    /// Count of posts carrying media
    pub posts_with_media: i64,
    /// Count of posts carrying an image reference
    pub posts_with_image: i64,
    /// Media percentage (0-100, 0 when there are no posts)
    pub media_percentage: f64,
    /// Image percentage (0-100, 0 when there are no posts)
    pub image_percentage: f64,
    /// Posting recency classification
    pub activity_status: ActivityStatus,
}

/// One row of the message fact table
#[derive(Debug, Clone)]
pub struct FactRow {
    /// Source-assigned message identifier (unique only jointly with channel_key)
    pub message_id: i64,
    /// Foreign key to dim_channels
    pub channel_key: i64,
    /// Foreign key to dim_dates
    pub date_key: i64,
    /// Cleaned message text
    pub message_text: String,
    /// Character count of the cleaned text
    pub message_length: i64,
    /// View count measure
    pub view_count: i64,
    /// Forward count measure
    pub forward_count: i64,
    /// Image-presence flag
    pub has_image: bool,
    /// Quality status (always `valid` by construction)
    pub data_quality_status: QualityStatus,
}

/// Outcome of one named quality check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityTestResult {
    /// Name of the check
    pub test_name: String,
    /// True if the check passed
    pub passed: bool,
    /// The numeric result that drove the verdict (violating row count, -1 on execution error)
    pub result: i64,
    /// When the check ran
    pub timestamp: NaiveDateTime,
}

/// Full quality-test battery outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// Per-check results, in battery order
    pub results: Vec<QualityTestResult>,
    /// True iff every individual check passed
    pub all_passed: bool,
}

/// Row counts per warehouse table, reported at the end of a run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TableCounts {
    /// Rows in raw_telegram_messages
    pub raw_messages: i64,
    /// Rows in stg_telegram_messages
    pub staging: i64,
    /// Rows in dim_dates
    pub dim_dates: i64,
    /// Rows in dim_channels
    pub dim_channels: i64,
    /// Rows in fct_messages
    pub fct_messages: i64,
}

/// Summary of one full transformation run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Newly inserted raw records (0 when the run did not load)
    pub raw_inserted: usize,
    /// Staging rows emitted
    pub staging_rows: usize,
    /// Date dimension rows generated
    pub date_rows: usize,
    /// Channel dimension rows generated
    pub channel_rows: usize,
    /// Fact rows emitted
    pub fact_rows: usize,
    /// Quality-test battery outcome
    pub report: QualityReport,
}
