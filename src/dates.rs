//! Date dimension construction.
//!
//! One row per calendar day over the observed staging range, padded on both
//! ends. All derived fields are pure functions of the date, so the table is
//! rebuilt from scratch every run; a wider range simply supersedes a narrower
//! one. The YYYYMMDD key is monotonic with the date by construction.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use tracing::info;

use crate::error::{Result, WarehouseError};
use crate::models::DateDimRow;
use crate::schema::{dim_dates, staging};

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

const DAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

const CREATE_SQL: &str = "
CREATE TABLE dim_dates (
    date_key INTEGER PRIMARY KEY,
    full_date TEXT NOT NULL UNIQUE,
    year INTEGER NOT NULL,
    quarter INTEGER NOT NULL,
    month INTEGER NOT NULL,
    month_name TEXT NOT NULL,
    week_of_year INTEGER NOT NULL,
    day_of_month INTEGER NOT NULL,
    day_of_week INTEGER NOT NULL,
    day_name TEXT NOT NULL,
    is_weekend BOOLEAN NOT NULL
);
";

/// Builds the synthetic date dimension
pub struct DateDimensionBuilder {
    run_time: NaiveDateTime,
    padding_days: i64,
    default_window_days: i64,
}

impl DateDimensionBuilder {
    /// Create a builder; `padding_days` extends both ends of the observed
    /// range, `default_window_days` is the half-width of the fallback window
    /// used when no valid staging dates exist.
    #[must_use]
    pub fn new(run_time: NaiveDateTime, padding_days: i64, default_window_days: i64) -> Self {
        Self {
            run_time,
            padding_days,
            default_window_days,
        }
    }

    /// Rebuild the date dimension covering every valid staging date.
    ///
    /// Returns the number of day rows generated.
    pub fn build(&self, conn: &Connection) -> Result<usize> {
        let (start, end) = self.date_range(conn)?;

        conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", dim_dates::TABLE))?;
        conn.execute_batch(CREATE_SQL)?;

        let mut insert = conn.prepare(&format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            dim_dates::TABLE,
            dim_dates::DATE_KEY,
            dim_dates::FULL_DATE,
            dim_dates::YEAR,
            dim_dates::QUARTER,
            dim_dates::MONTH,
            dim_dates::MONTH_NAME,
            dim_dates::WEEK_OF_YEAR,
            dim_dates::DAY_OF_MONTH,
            dim_dates::DAY_OF_WEEK,
            dim_dates::DAY_NAME,
            dim_dates::IS_WEEKEND,
        ))?;

        let mut generated = 0;
        let mut day = start;
        while day <= end {
            let row = make_date_row(day);
            insert.execute(params![
                row.date_key,
                row.full_date.format("%Y-%m-%d").to_string(),
                row.year,
                row.quarter,
                row.month,
                row.month_name,
                row.week_of_year,
                row.day_of_month,
                row.day_of_week,
                row.day_name,
                row.is_weekend,
            ])?;
            generated += 1;

            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        info!(
            start = %start,
            end = %end,
            generated,
            "Rebuilt date dimension"
        );
        Ok(generated)
    }

    /// Closed date interval to generate: observed valid range (or the default
    /// window when staging holds no valid dates), padded on both ends.
    fn date_range(&self, conn: &Connection) -> Result<(NaiveDate, NaiveDate)> {
        let (min_date, max_date): (Option<String>, Option<String>) = conn.query_row(
            &format!(
                "SELECT MIN(DATE({})), MAX(DATE({})) FROM {} WHERE {} = 'valid'",
                staging::MESSAGE_DATE,
                staging::MESSAGE_DATE,
                staging::TABLE,
                staging::DATA_QUALITY_STATUS,
            ),
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let run_date = self.run_time.date();
        let (base_min, base_max) = match (min_date, max_date) {
            (Some(min), Some(max)) => (parse_day(&min)?, parse_day(&max)?),
            // Documented fallback, not a failure: no valid staging dates
            _ => (
                run_date - Duration::days(self.default_window_days),
                run_date + Duration::days(self.default_window_days),
            ),
        };

        Ok((
            base_min - Duration::days(self.padding_days),
            base_max + Duration::days(self.padding_days),
        ))
    }
}

fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| WarehouseError::InvalidDate(format!("{raw}: {e}")))
}

/// YYYYMMDD integer encoding of a date; monotonic with the date
#[must_use]
pub fn date_key(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}

/// Derive every calendar field for one day
#[must_use]
pub fn make_date_row(date: NaiveDate) -> DateDimRow {
    let month = date.month();
    let day_of_week = date.weekday().num_days_from_sunday();

    DateDimRow {
        date_key: date_key(date),
        full_date: date,
        year: date.year(),
        quarter: (month - 1) / 3 + 1,
        month,
        month_name: MONTH_NAMES[(month - 1) as usize],
        week_of_year: week_of_year(date),
        day_of_month: date.day(),
        day_of_week,
        day_name: DAY_NAMES[day_of_week as usize],
        is_weekend: day_of_week == 0 || day_of_week == 6,
    }
}

/// Week number with weeks starting Monday, 1-based.
///
/// Days before the year's first Monday fall in week 1 (the source counted
/// strftime's %W week, which starts at 0 there, plus one).
fn week_of_year(date: NaiveDate) -> u32 {
    let days_from_monday = date.weekday().num_days_from_monday();
    (date.ordinal() + 6 - days_from_monday) / 7 + 1
}
