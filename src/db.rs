use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{NewRawMessage, TableCounts};
use crate::schema::{dim_channels, dim_dates, fct_messages, raw_messages, staging};

/// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
/// Type alias for a pooled database connection
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Warehouse handle: pooled SQLite access plus raw-record storage.
///
/// The handle is passed explicitly through every pipeline stage; there is no
/// ambient global connection. A single run assumes exclusive writer access.
pub struct Warehouse {
    pool: DbPool,
}

impl Warehouse {
    /// Open (or create) the warehouse at `path` with default pool settings
    pub fn new(path: &str) -> Result<Self> {
        Self::with_options(path, 10, 30)
    }

    /// Open (or create) the warehouse using the application's database settings
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::with_options(
            &config.path,
            config.max_connections,
            config.connection_timeout_secs,
        )
    }

    /// Open (or create) the warehouse with explicit pool settings
    pub fn with_options(path: &str, max_connections: u32, timeout_secs: u64) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Set up connection manager and pool
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(max_connections)
            .connection_timeout(Duration::from_secs(timeout_secs))
            .build(manager)
            .context("Failed to create database connection pool")?;

        // Run migrations
        let conn = pool.get()?;
        Self::run_migrations(&conn)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!(
            "../migrations/2025-07-10-000000_create_raw_messages/up.sql"
        ))
        .context("Failed to run raw-messages migration")?;

        conn.execute_batch(include_str!(
            "../migrations/2025-07-10-000001_add_raw_indexes/up.sql"
        ))
        .context("Failed to run raw-indexes migration")?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Insert a raw message if its `(message_id, channel_name)` identity is absent.
    ///
    /// Returns true when the row was newly inserted, false when an identical
    /// identity already existed (re-loading a batch is a no-op).
    pub fn insert_raw_message(conn: &Connection, msg: &NewRawMessage) -> Result<bool> {
        let changed = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                raw_messages::TABLE,
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
                raw_messages::SCRAPED_AT
            ),
            params![
                msg.message_id,
                msg.channel_name,
                msg.channel_username,
                msg.channel_title,
                msg.message_date,
                msg.message_text,
                msg.has_media,
                msg.image_path,
                msg.views,
                msg.forwards,
                msg.scraped_at
            ],
        )?;

        if changed == 0 {
            debug!(
                message_id = msg.message_id,
                channel = %msg.channel_name,
                "Duplicate raw message ignored"
            );
        }

        Ok(changed > 0)
    }

    /// Count rows in one table, treating a missing table as empty
    fn count_table(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .unwrap_or(0)
    }

    /// Row counts for every warehouse table
    pub fn table_counts(&self) -> Result<TableCounts> {
        let conn = self.get_connection()?;
        Ok(TableCounts {
            raw_messages: Self::count_table(&conn, raw_messages::TABLE),
            staging: Self::count_table(&conn, staging::TABLE),
            dim_dates: Self::count_table(&conn, dim_dates::TABLE),
            dim_channels: Self::count_table(&conn, dim_channels::TABLE),
            fct_messages: Self::count_table(&conn, fct_messages::TABLE),
        })
    }
}
