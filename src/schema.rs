//! Warehouse schema definitions
//!
//! This module provides constants for table and column names used with rusqlite.
//! The dimension and fact column names are a contract with external consumers
//! (the query-serving API reads these tables directly), so they must not drift.

/// Raw message landing table schema
pub mod raw_messages {
    /// Table name
    pub const TABLE: &str = "raw_telegram_messages";
    /// Primary key column
    pub const ID: &str = "id";
    /// Source-assigned message identifier (unique only per channel)
    pub const MESSAGE_ID: &str = "message_id";
    /// Channel name column
    pub const CHANNEL_NAME: &str = "channel_name";
    /// Channel username column
    pub const CHANNEL_USERNAME: &str = "channel_username";
    /// Channel title column
    pub const CHANNEL_TITLE: &str = "channel_title";
    /// Message timestamp as received, nullable
    pub const MESSAGE_DATE: &str = "message_date";
    /// Message text column, nullable
    pub const MESSAGE_TEXT: &str = "message_text";
    /// Media-presence flag
    pub const HAS_MEDIA: &str = "has_media";
    /// Optional image reference
    pub const IMAGE_PATH: &str = "image_path";
    /// View count column
    pub const VIEWS: &str = "views";
    /// Forward count column
    pub const FORWARDS: &str = "forwards";
    /// Acquisition timestamp column
    pub const SCRAPED_AT: &str = "scraped_at";
}

/// Staging table schema
pub mod staging {
    /// Table name
    pub const TABLE: &str = "stg_telegram_messages";
    /// Primary key column
    pub const ID: &str = "id";
    /// Source-assigned message identifier
    pub const MESSAGE_ID: &str = "message_id";
    /// Channel name column
    pub const CHANNEL_NAME: &str = "channel_name";
    /// Channel username column
    pub const CHANNEL_USERNAME: &str = "channel_username";
    /// Channel title column
    pub const CHANNEL_TITLE: &str = "channel_title";
    /// Canonical message timestamp (`YYYY-MM-DD HH:MM:SS`)
    pub const MESSAGE_DATE: &str = "message_date";
    /// Acquisition timestamp column
    pub const SCRAPED_AT: &str = "scraped_at";
    /// Original message text column
    pub const MESSAGE_TEXT: &str = "message_text";
    /// Trimmed message text column
    pub const CLEANED_MESSAGE_TEXT: &str = "cleaned_message_text";
    /// Character count of the trimmed text
    pub const MESSAGE_LENGTH: &str = "message_length";
    /// Media-presence flag
    pub const HAS_MEDIA: &str = "has_media";
    /// Optional image reference
    pub const IMAGE_PATH: &str = "image_path";
    /// Image-presence flag
    pub const HAS_IMAGE: &str = "has_image";
    /// View count column
    pub const VIEWS: &str = "views";
    /// Forward count column
    pub const FORWARDS: &str = "forwards";
    /// Empty-message quality flag
    pub const IS_EMPTY_MESSAGE: &str = "is_empty_message";
    /// Future-date quality flag
    pub const IS_FUTURE_DATE: &str = "is_future_date";
    /// Negative-view-count quality flag
    pub const HAS_NEGATIVE_VIEWS: &str = "has_negative_views";
    /// Derived quality status (`valid` or `needs_review`)
    pub const DATA_QUALITY_STATUS: &str = "data_quality_status";
}

/// Date dimension schema
pub mod dim_dates {
    /// Table name
    pub const TABLE: &str = "dim_dates";
    /// YYYYMMDD integer key
    pub const DATE_KEY: &str = "date_key";
    /// Calendar date column (`YYYY-MM-DD`)
    pub const FULL_DATE: &str = "full_date";
    /// Year column
    pub const YEAR: &str = "year";
    /// Quarter column (1-4)
    pub const QUARTER: &str = "quarter";
    /// Month column
    pub const MONTH: &str = "month";
    /// Month name column
    pub const MONTH_NAME: &str = "month_name";
    /// Week-of-year column
    pub const WEEK_OF_YEAR: &str = "week_of_year";
    /// Day-of-month column
    pub const DAY_OF_MONTH: &str = "day_of_month";
    /// Day-of-week column (0=Sunday)
    pub const DAY_OF_WEEK: &str = "day_of_week";
    /// Day name column
    pub const DAY_NAME: &str = "day_name";
    /// Weekend flag
    pub const IS_WEEKEND: &str = "is_weekend";
}

/// Channel dimension schema
pub mod dim_channels {
    /// Table name
    pub const TABLE: &str = "dim_channels";
    /// Dense ranked key (1..N by descending post count)
    pub const CHANNEL_KEY: &str = "channel_key";
    /// Channel name column
    pub const CHANNEL_NAME: &str = "channel_name";
    /// Channel username column
    pub const CHANNEL_USERNAME: &str = "channel_username";
    /// Channel title column
    pub const CHANNEL_TITLE: &str = "channel_title";
    /// Business classification column
    pub const CHANNEL_TYPE: &str = "channel_type";
    /// First observed post timestamp
    pub const FIRST_POST_DATE: &str = "first_post_date";
    /// Last observed post timestamp
    pub const LAST_POST_DATE: &str = "last_post_date";
    /// Total valid post count
    pub const TOTAL_POSTS: &str = "total_posts";
    /// Mean view count
    pub const AVG_VIEWS: &str = "avg_views";
    /// Mean forward count
    pub const AVG_FORWARDS: &str = "avg_forwards";
    /// Count of posts carrying media
    pub const POSTS_WITH_MEDIA: &str = "posts_with_media";
    /// Count of posts carrying an image reference
    pub const POSTS_WITH_IMAGE: &str = "posts_with_image";
    /// Media percentage column (2 decimals)
    pub const MEDIA_PERCENTAGE: &str = "media_percentage";
    /// Image percentage column (2 decimals)
    pub const IMAGE_PERCENTAGE: &str = "image_percentage";
    /// Activity status column (`active`, `moderate`, `inactive`)
    pub const ACTIVITY_STATUS: &str = "activity_status";
}

/// Message fact table schema
pub mod fct_messages {
    /// Table name
    pub const TABLE: &str = "fct_messages";
    /// Source-assigned message identifier (business key, per-channel)
    pub const MESSAGE_ID: &str = "message_id";
    /// Foreign key to dim_channels
    pub const CHANNEL_KEY: &str = "channel_key";
    /// Foreign key to dim_dates
    pub const DATE_KEY: &str = "date_key";
    /// Cleaned message text column
    pub const MESSAGE_TEXT: &str = "message_text";
    /// Character count of the cleaned text
    pub const MESSAGE_LENGTH: &str = "message_length";
    /// View count measure
    pub const VIEW_COUNT: &str = "view_count";
    /// Forward count measure
    pub const FORWARD_COUNT: &str = "forward_count";
    /// Image-presence flag
    pub const HAS_IMAGE: &str = "has_image";
    /// Quality status (always `valid` by construction)
    pub const DATA_QUALITY_STATUS: &str = "data_quality_status";
}
