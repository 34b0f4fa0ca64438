//! Medical Warehouse - Telegram Message Transformation Engine
//!
//! A Rust library for transforming raw Telegram message records into a
//! validated star-schema SQLite warehouse for analytical querying.
//!
//! # Features
//!
//! - Deduplicating raw-batch ingestion with insert-if-absent semantics
//! - Cleaned, quality-flagged staging layer
//! - Synthetic date dimension and classified channel dimension
//! - Fact table with referential integrity enforced by construction
//! - Repeatable data-quality test battery with a CSV report artifact

/// Channel dimension construction and keyword classification
pub mod channels;
/// Configuration management
pub mod config;
/// Date dimension construction and calendar helpers
pub mod dates;
/// Warehouse handle and connection pooling
pub mod db;
/// Error types
pub mod error;
/// Fact table construction
pub mod facts;
/// Raw-batch ingestion
pub mod loader;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Pipeline orchestration
pub mod pipeline;
/// Data-quality test battery
pub mod quality;
/// Schema documentation artifact
pub mod report;
/// Warehouse schema definitions
pub mod schema;
/// Staging layer construction
pub mod staging;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use db::Warehouse;
pub use error::{Result, WarehouseError};
pub use models::{
    ActivityStatus, ChannelType, NewRawMessage, QualityReport, QualityStatus, RunSummary,
};
pub use pipeline::TransformationPipeline;
