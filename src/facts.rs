//! Fact table construction.
//!
//! Joins valid staging rows to their dimension keys and materializes
//! `fct_messages`. Referential integrity is enforced by construction: a row
//! whose channel triple or calendar day fails to resolve is dropped, not
//! retained as an orphan. Callers needing visibility into drops compare
//! staging and fact row counts.

use std::collections::{HashMap, HashSet};

use rusqlite::{params, Connection};
use tracing::info;

use crate::dates::date_key;
use crate::error::Result;
use crate::metrics::PipelineMetrics;
use crate::models::{FactRow, QualityStatus};
use crate::schema::{dim_channels, dim_dates, fct_messages, staging};
use crate::staging::parse_timestamp;

const CREATE_SQL: &str = "
CREATE TABLE fct_messages (
    message_id INTEGER NOT NULL,
    channel_key INTEGER NOT NULL,
    date_key INTEGER NOT NULL,
    message_text TEXT NOT NULL,
    message_length INTEGER NOT NULL,
    view_count INTEGER NOT NULL,
    forward_count INTEGER NOT NULL,
    has_image BOOLEAN NOT NULL,
    data_quality_status TEXT NOT NULL
);
";

/// Builds the message fact table
pub struct FactBuilder {
    metrics: PipelineMetrics,
}

impl FactBuilder {
    /// Create a fact builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            metrics: PipelineMetrics::default(),
        }
    }

    /// Rebuild the fact table from valid staging rows and the finished
    /// dimensions.
    ///
    /// Returns the number of fact rows emitted. Never deduplicates beyond
    /// what staging already guaranteed: message ids are only unique per
    /// channel, so joint uniqueness comes from `(message_id, channel_key)`.
    pub fn build(&self, conn: &Connection) -> Result<usize> {
        let channel_keys = load_channel_keys(conn)?;
        let date_keys = load_date_keys(conn)?;

        conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", fct_messages::TABLE))?;
        conn.execute_batch(CREATE_SQL)?;

        let mut select = conn.prepare(&format!(
            "SELECT {}, {}, {}, {}, {}, {}, {}, {}, {}, {} FROM {} \
             WHERE {} = 'valid' ORDER BY {}",
            staging::MESSAGE_ID,
            staging::CHANNEL_NAME,
            staging::CHANNEL_USERNAME,
            staging::CHANNEL_TITLE,
            staging::MESSAGE_DATE,
            staging::CLEANED_MESSAGE_TEXT,
            staging::MESSAGE_LENGTH,
            staging::VIEWS,
            staging::FORWARDS,
            staging::HAS_IMAGE,
            staging::TABLE,
            staging::DATA_QUALITY_STATUS,
            staging::ID,
        ))?;

        let mut insert = conn.prepare(&format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            fct_messages::TABLE,
            fct_messages::MESSAGE_ID,
            fct_messages::CHANNEL_KEY,
            fct_messages::DATE_KEY,
            fct_messages::MESSAGE_TEXT,
            fct_messages::MESSAGE_LENGTH,
            fct_messages::VIEW_COUNT,
            fct_messages::FORWARD_COUNT,
            fct_messages::HAS_IMAGE,
            fct_messages::DATA_QUALITY_STATUS,
        ))?;

        let rows = select.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, i64>(7)?,
                row.get::<_, i64>(8)?,
                row.get::<_, bool>(9)?,
            ))
        })?;

        let mut emitted = 0;
        let mut dropped = 0;

        for row in rows {
            let (message_id, name, username, title, date_raw, text, length, views, forwards, has_image) =
                row?;

            let triple = (name, username, title);
            let Some(channel_key) = channel_keys.get(&triple).copied() else {
                dropped += 1;
                continue;
            };

            let key = parse_timestamp(&date_raw).map(|ts| date_key(ts.date()));
            let Some(message_date_key) = key.filter(|k| date_keys.contains(k)) else {
                dropped += 1;
                continue;
            };

            let fact = FactRow {
                message_id,
                channel_key,
                date_key: message_date_key,
                message_text: text,
                message_length: length,
                view_count: views,
                forward_count: forwards,
                has_image,
                data_quality_status: QualityStatus::Valid,
            };
            insert.execute(params![
                fact.message_id,
                fact.channel_key,
                fact.date_key,
                fact.message_text,
                fact.message_length,
                fact.view_count,
                fact.forward_count,
                fact.has_image,
                fact.data_quality_status.as_str(),
            ])?;
            emitted += 1;
        }

        self.metrics.record_dropped("facts", "unresolved_dimension", dropped);
        info!(emitted, dropped, "Rebuilt fact table");
        Ok(emitted)
    }
}

impl Default for FactBuilder {
    fn default() -> Self {
        Self::new()
    }
}

type ChannelTriple = (String, Option<String>, Option<String>);

/// Channel-key lookup by the identifying triple, matching what the channel
/// dimension grouped on
fn load_channel_keys(conn: &Connection) -> Result<HashMap<ChannelTriple, i64>> {
    let mut select = conn.prepare(&format!(
        "SELECT {}, {}, {}, {} FROM {}",
        dim_channels::CHANNEL_NAME,
        dim_channels::CHANNEL_USERNAME,
        dim_channels::CHANNEL_TITLE,
        dim_channels::CHANNEL_KEY,
        dim_channels::TABLE,
    ))?;

    let rows = select.query_map([], |row| {
        Ok((
            (
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ),
            row.get::<_, i64>(3)?,
        ))
    })?;

    let mut keys = HashMap::new();
    for row in rows {
        let (triple, key) = row?;
        keys.insert(triple, key);
    }
    Ok(keys)
}

fn load_date_keys(conn: &Connection) -> Result<HashSet<i64>> {
    let mut select = conn.prepare(&format!(
        "SELECT {} FROM {}",
        dim_dates::DATE_KEY,
        dim_dates::TABLE,
    ))?;

    let rows = select.query_map([], |row| row.get::<_, i64>(0))?;

    let mut keys = HashSet::new();
    for row in rows {
        keys.insert(row?);
    }
    Ok(keys)
}
