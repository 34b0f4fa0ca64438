//! Pipeline orchestration.
//!
//! Stages run strictly in order with a barrier between them: loading, then
//! staging, then both dimensions, then facts, then the quality battery. The
//! transformation stages execute inside one SQLite transaction so readers
//! observe either the previous complete warehouse or the new one, never a
//! partially rebuilt state. Re-running is always safe: loading is
//! insert-if-absent and every derived table is rebuilt from scratch.

use std::path::Path;
use std::time::Instant;

use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::channels::ChannelDimensionBuilder;
use crate::config::{PipelineConfig, ReportConfig};
use crate::dates::DateDimensionBuilder;
use crate::db::Warehouse;
use crate::error::Result;
use crate::facts::FactBuilder;
use crate::loader::RecordLoader;
use crate::logging::OperationTimer;
use crate::metrics::PipelineMetrics;
use crate::models::{QualityReport, RunSummary};
use crate::quality::QualityTestRunner;
use crate::report::write_schema_documentation;
use crate::staging::StagingBuilder;

/// Row counts from one transformation pass (staging through facts)
struct TransformCounts {
    staging_rows: usize,
    date_rows: usize,
    channel_rows: usize,
    fact_rows: usize,
}

/// Drives one batch run of the transformation engine
pub struct TransformationPipeline {
    config: PipelineConfig,
    run_time: NaiveDateTime,
    metrics: PipelineMetrics,
}

impl TransformationPipeline {
    /// Create a pipeline whose run time is now (UTC)
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_run_time(config, Utc::now().naive_utc())
    }

    /// Create a pipeline with an explicit run time.
    ///
    /// Future-date checks and activity windows evaluate against this instant.
    #[must_use]
    pub fn with_run_time(config: PipelineConfig, run_time: NaiveDateTime) -> Self {
        Self {
            config,
            run_time,
            metrics: PipelineMetrics::default(),
        }
    }

    /// The instant this run evaluates time-relative rules against
    #[must_use]
    pub const fn run_time(&self) -> NaiveDateTime {
        self.run_time
    }

    /// Load raw batches from `input_dir` into the warehouse.
    ///
    /// Returns the count of newly inserted records.
    pub fn load(&self, warehouse: &Warehouse, input_dir: &Path) -> Result<usize> {
        let timer = OperationTimer::new("load_raw_batches");
        let inserted = RecordLoader::new(warehouse).load_dir(input_dir)?;
        timer.finish();
        Ok(inserted)
    }

    /// Run staging, both dimensions, and facts as one atomic unit.
    ///
    /// On any stage failure the transaction rolls back and the previous
    /// warehouse state stays authoritative; the run must then be retried
    /// from the beginning.
    fn transform(&self, conn: &Connection) -> Result<TransformCounts> {
        conn.execute_batch("BEGIN IMMEDIATE;")?;

        match self.transform_stages(conn) {
            Ok(counts) => {
                conn.execute_batch("COMMIT;")?;
                Ok(counts)
            }
            Err(e) => {
                if let Err(rollback) = conn.execute_batch("ROLLBACK;") {
                    warn!(error = %rollback, "Rollback after failed transformation also failed");
                }
                Err(e)
            }
        }
    }

    fn transform_stages(&self, conn: &Connection) -> Result<TransformCounts> {
        let staging_rows = self.timed_stage("staging", || {
            StagingBuilder::new(self.run_time).build(conn)
        })?;

        let date_rows = self.timed_stage("dim_dates", || {
            DateDimensionBuilder::new(
                self.run_time,
                self.config.date_padding_days,
                self.config.default_window_days,
            )
            .build(conn)
        })?;

        let channel_rows = self.timed_stage("dim_channels", || {
            ChannelDimensionBuilder::new(
                self.run_time,
                self.config.active_within_days,
                self.config.moderate_within_days,
            )
            .build(conn)
        })?;

        let fact_rows = self.timed_stage("fct_messages", || FactBuilder::new().build(conn))?;

        Ok(TransformCounts {
            staging_rows,
            date_rows,
            channel_rows,
            fact_rows,
        })
    }

    fn timed_stage(&self, stage: &'static str, f: impl FnOnce() -> Result<usize>) -> Result<usize> {
        let start = Instant::now();
        let rows = f()?;
        self.metrics.record_stage(stage, rows, start.elapsed());
        Ok(rows)
    }

    /// Run the quality battery and persist the report artifact
    pub fn test(&self, warehouse: &Warehouse, report: &ReportConfig) -> Result<QualityReport> {
        let conn = warehouse.get_connection()?;
        let runner = QualityTestRunner::new(self.run_time);
        let quality = runner.run(&conn);
        runner.write_report(&quality, Path::new(&report.output_directory))?;
        Ok(quality)
    }

    /// Execute a full run: optional loading, the atomic transformation, the
    /// quality battery with its report artifact, and schema documentation.
    pub fn run(
        &self,
        warehouse: &Warehouse,
        input_dir: Option<&Path>,
        report: &ReportConfig,
    ) -> Result<RunSummary> {
        let raw_inserted = match input_dir {
            Some(dir) => self.load(warehouse, dir)?,
            None => 0,
        };

        let conn = warehouse.get_connection()?;
        let counts = self.transform(&conn)?;
        drop(conn);

        let quality = self.test(warehouse, report)?;
        write_schema_documentation(Path::new(&report.output_directory))?;

        let table_counts = warehouse.table_counts()?;
        info!(
            raw_messages = table_counts.raw_messages,
            staging = table_counts.staging,
            dim_dates = table_counts.dim_dates,
            dim_channels = table_counts.dim_channels,
            fct_messages = table_counts.fct_messages,
            all_passed = quality.all_passed,
            "Transformation run complete"
        );

        Ok(RunSummary {
            raw_inserted,
            staging_rows: counts.staging_rows,
            date_rows: counts.date_rows,
            channel_rows: counts.channel_rows,
            fact_rows: counts.fact_rows,
            report: quality,
        })
    }
}
