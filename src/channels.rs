//! Channel dimension construction.
//!
//! Valid staging rows are grouped by the (name, username, title) triple,
//! aggregated, classified with an ordered keyword table, and ranked into
//! dense 1..N keys by descending post count. The dimension is rebuilt in full
//! every run, so keys are not stable across runs when the ranking changes;
//! that is an accepted limitation of the source design, not a bug.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use rusqlite::{params, Connection};
use tracing::info;

use crate::error::Result;
use crate::models::{ActivityStatus, ChannelDimRow, ChannelType};
use crate::schema::{dim_channels, staging};
use crate::staging::{parse_timestamp, CANONICAL_TIMESTAMP};

/// Ordered classification table: first matching keyword wins, so the
/// Pharmaceutical set shadows the later ones (e.g. "med" matches before
/// "medical").
const CLASSIFICATION_RULES: &[(ChannelType, &[&str])] = &[
    (
        ChannelType::Pharmaceutical,
        &["pharma", "med", "drug", "pharmacy", "pill", "tablet"],
    ),
    (
        ChannelType::Cosmetics,
        &["cosmetic", "beauty", "skin", "cream", "lotion", "makeup"],
    ),
    (
        ChannelType::Medical,
        &["health", "medical", "hospital", "clinic", "doctor"],
    ),
];

const CREATE_SQL: &str = "
CREATE TABLE dim_channels (
    channel_key INTEGER PRIMARY KEY,
    channel_name TEXT NOT NULL,
    channel_username TEXT,
    channel_title TEXT,
    channel_type TEXT NOT NULL,
    first_post_date TEXT NOT NULL,
    last_post_date TEXT NOT NULL,
    total_posts INTEGER NOT NULL,
    avg_views REAL NOT NULL,
    avg_forwards REAL NOT NULL,
    posts_with_media INTEGER NOT NULL,
    posts_with_image INTEGER NOT NULL,
    media_percentage REAL NOT NULL,
    image_percentage REAL NOT NULL,
    activity_status TEXT NOT NULL
);
";

/// Classify a channel by case-insensitive substring match against its name,
/// in fixed priority order
#[must_use]
pub fn classify_channel(channel_name: &str) -> ChannelType {
    let lowered = channel_name.to_lowercase();
    for (channel_type, keywords) in CLASSIFICATION_RULES {
        if keywords.iter().any(|keyword| lowered.contains(keyword)) {
            return *channel_type;
        }
    }
    ChannelType::Other
}

/// Posting recency relative to the transformation run time
#[must_use]
pub fn activity_status(
    last_post: NaiveDateTime,
    run_time: NaiveDateTime,
    active_within_days: i64,
    moderate_within_days: i64,
) -> ActivityStatus {
    if last_post >= run_time - Duration::days(active_within_days) {
        ActivityStatus::Active
    } else if last_post >= run_time - Duration::days(moderate_within_days) {
        ActivityStatus::Moderate
    } else {
        ActivityStatus::Inactive
    }
}

/// Builds the classified channel dimension
pub struct ChannelDimensionBuilder {
    run_time: NaiveDateTime,
    active_within_days: i64,
    moderate_within_days: i64,
}

/// Per-channel running aggregate, accumulated in first-seen order
struct ChannelAggregate {
    channel_name: String,
    channel_username: Option<String>,
    channel_title: Option<String>,
    first_post: NaiveDateTime,
    last_post: NaiveDateTime,
    total_posts: i64,
    total_views: i64,
    total_forwards: i64,
    posts_with_media: i64,
    posts_with_image: i64,
}

impl ChannelDimensionBuilder {
    /// Create a builder evaluating activity against `run_time`
    #[must_use]
    pub fn new(
        run_time: NaiveDateTime,
        active_within_days: i64,
        moderate_within_days: i64,
    ) -> Self {
        Self {
            run_time,
            active_within_days,
            moderate_within_days,
        }
    }

    /// Rebuild the channel dimension from valid staging rows.
    ///
    /// Returns the number of channel rows generated.
    pub fn build(&self, conn: &Connection) -> Result<usize> {
        let aggregates = self.aggregate(conn)?;
        let rows = self.rank_and_classify(aggregates);

        conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", dim_channels::TABLE))?;
        conn.execute_batch(CREATE_SQL)?;

        let mut insert = conn.prepare(&format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            dim_channels::TABLE,
            dim_channels::CHANNEL_KEY,
            dim_channels::CHANNEL_NAME,
            dim_channels::CHANNEL_USERNAME,
            dim_channels::CHANNEL_TITLE,
            dim_channels::CHANNEL_TYPE,
            dim_channels::FIRST_POST_DATE,
            dim_channels::LAST_POST_DATE,
            dim_channels::TOTAL_POSTS,
            dim_channels::AVG_VIEWS,
            dim_channels::AVG_FORWARDS,
            dim_channels::POSTS_WITH_MEDIA,
            dim_channels::POSTS_WITH_IMAGE,
            dim_channels::MEDIA_PERCENTAGE,
            dim_channels::IMAGE_PERCENTAGE,
            dim_channels::ACTIVITY_STATUS,
        ))?;

        let generated = rows.len();
        for row in rows {
            insert.execute(params![
                row.channel_key,
                row.channel_name,
                row.channel_username,
                row.channel_title,
                row.channel_type.as_str(),
                row.first_post_date.format(CANONICAL_TIMESTAMP).to_string(),
                row.last_post_date.format(CANONICAL_TIMESTAMP).to_string(),
                row.total_posts,
                row.avg_views,
                row.avg_forwards,
                row.posts_with_media,
                row.posts_with_image,
                row.media_percentage,
                row.image_percentage,
                row.activity_status.as_str(),
            ])?;
        }

        info!(generated, "Rebuilt channel dimension");
        Ok(generated)
    }

    /// Group valid staging rows by the identifying triple, preserving the
    /// first-seen order for the ranking tie-break
    fn aggregate(&self, conn: &Connection) -> Result<Vec<ChannelAggregate>> {
        let mut select = conn.prepare(&format!(
            "SELECT {}, {}, {}, {}, {}, {}, {}, {} FROM {} \
             WHERE {} = 'valid' ORDER BY {}",
            staging::CHANNEL_NAME,
            staging::CHANNEL_USERNAME,
            staging::CHANNEL_TITLE,
            staging::MESSAGE_DATE,
            staging::VIEWS,
            staging::FORWARDS,
            staging::HAS_MEDIA,
            staging::HAS_IMAGE,
            staging::TABLE,
            staging::DATA_QUALITY_STATUS,
            staging::ID,
        ))?;

        let mut aggregates: Vec<ChannelAggregate> = Vec::new();
        let mut index: HashMap<(String, Option<String>, Option<String>), usize> = HashMap::new();

        let rows = select.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, bool>(6)?,
                row.get::<_, bool>(7)?,
            ))
        })?;

        for row in rows {
            let (name, username, title, date_raw, views, forwards, has_media, has_image) = row?;
            // Staging stores the canonical format, so this always parses
            let Some(post_date) = parse_timestamp(&date_raw) else {
                continue;
            };

            let key = (name.clone(), username.clone(), title.clone());
            let entry = index.get(&key).copied();
            let aggregate = match entry {
                Some(position) => &mut aggregates[position],
                None => {
                    index.insert(key, aggregates.len());
                    aggregates.push(ChannelAggregate {
                        channel_name: name,
                        channel_username: username,
                        channel_title: title,
                        first_post: post_date,
                        last_post: post_date,
                        total_posts: 0,
                        total_views: 0,
                        total_forwards: 0,
                        posts_with_media: 0,
                        posts_with_image: 0,
                    });
                    let last = aggregates.len() - 1;
                    &mut aggregates[last]
                }
            };

            aggregate.first_post = aggregate.first_post.min(post_date);
            aggregate.last_post = aggregate.last_post.max(post_date);
            aggregate.total_posts += 1;
            aggregate.total_views += views;
            aggregate.total_forwards += forwards;
            aggregate.posts_with_media += i64::from(has_media);
            aggregate.posts_with_image += i64::from(has_image);
        }

        Ok(aggregates)
    }

    /// Sort by descending post count (stable, so first-seen order breaks
    /// ties) and assign dense 1..N keys
    fn rank_and_classify(&self, mut aggregates: Vec<ChannelAggregate>) -> Vec<ChannelDimRow> {
        aggregates.sort_by(|a, b| b.total_posts.cmp(&a.total_posts));

        aggregates
            .into_iter()
            .enumerate()
            .map(|(rank, agg)| {
                let channel_type = classify_channel(&agg.channel_name);
                let status = activity_status(
                    agg.last_post,
                    self.run_time,
                    self.active_within_days,
                    self.moderate_within_days,
                );

                ChannelDimRow {
                    channel_key: rank as i64 + 1,
                    channel_type,
                    avg_views: mean(agg.total_views, agg.total_posts),
                    avg_forwards: mean(agg.total_forwards, agg.total_posts),
                    media_percentage: percentage(agg.posts_with_media, agg.total_posts),
                    image_percentage: percentage(agg.posts_with_image, agg.total_posts),
                    activity_status: status,
                    channel_name: agg.channel_name,
                    channel_username: agg.channel_username,
                    channel_title: agg.channel_title,
                    first_post_date: agg.first_post,
                    last_post_date: agg.last_post,
                    total_posts: agg.total_posts,
                    posts_with_media: agg.posts_with_media,
                    posts_with_image: agg.posts_with_image,
                }
            })
            .collect()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(total: i64, count: i64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    round2(total as f64 / count as f64)
}

/// Share of `part` in `total` as 0-100 with 2 decimals; 0 when `total` is 0
/// so an empty channel never divides by zero
fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 * 100.0 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("valid test timestamp")
    }

    #[test]
    fn classifies_pharmaceutical_before_cosmetics_and_medical() {
        assert_eq!(classify_channel("tikvahpharma"), ChannelType::Pharmaceutical);
        assert_eq!(classify_channel("CityDrugStore"), ChannelType::Pharmaceutical);
        // "med" shadows the Medical set by priority
        assert_eq!(classify_channel("MedicalSupplies"), ChannelType::Pharmaceutical);
    }

    #[test]
    fn classifies_cosmetics_and_medical() {
        assert_eq!(classify_channel("SkinGlow"), ChannelType::Cosmetics);
        assert_eq!(classify_channel("lobelia4cosmetics"), ChannelType::Cosmetics);
        assert_eq!(classify_channel("HealthPlus"), ChannelType::Medical);
        assert_eq!(classify_channel("AddisClinic"), ChannelType::Medical);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify_channel("PHARMA-ONE"), ChannelType::Pharmaceutical);
        assert_eq!(classify_channel("Beauty Corner"), ChannelType::Cosmetics);
    }

    #[test]
    fn unmatched_channels_are_other() {
        assert_eq!(classify_channel("random_news"), ChannelType::Other);
        assert_eq!(classify_channel(""), ChannelType::Other);
    }

    #[test]
    fn activity_windows() {
        let run_time = ts(2025, 7, 31);
        assert_eq!(
            activity_status(ts(2025, 7, 28), run_time, 7, 30),
            ActivityStatus::Active
        );
        assert_eq!(
            activity_status(ts(2025, 7, 10), run_time, 7, 30),
            ActivityStatus::Moderate
        );
        assert_eq!(
            activity_status(ts(2025, 1, 1), run_time, 7, 30),
            ActivityStatus::Inactive
        );
    }

    #[test]
    fn activity_boundary_is_inclusive() {
        let run_time = ts(2025, 7, 31);
        // Exactly 7 days ago still counts as active
        assert_eq!(
            activity_status(ts(2025, 7, 24), run_time, 7, 30),
            ActivityStatus::Active
        );
    }

    #[test]
    fn percentage_guards_division_by_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(3, 3), 100.0);
    }

    #[test]
    fn mean_rounds_to_two_decimals() {
        assert_eq!(mean(10, 3), 3.33);
        assert_eq!(mean(0, 0), 0.0);
    }
}
