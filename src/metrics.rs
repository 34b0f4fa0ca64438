use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metric names and recording helpers for the transformation pipeline.
///
/// The crate only records through the `metrics` facade; the embedding process
/// decides where the samples go by installing a recorder (or none).
pub struct PipelineMetrics {
    /// Raw records newly inserted by the loader
    pub records_inserted_total: &'static str,
    /// Batch entries skipped as malformed
    pub records_skipped_total: &'static str,
    /// Rows emitted per stage
    pub stage_rows_total: &'static str,
    /// Rows dropped per stage and reason
    pub stage_rows_dropped_total: &'static str,
    /// Stage wall-clock duration
    pub stage_duration: &'static str,
    /// Quality checks failed in the last run
    pub quality_checks_failed: &'static str,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self {
            records_inserted_total: "medical_warehouse_records_inserted_total",
            records_skipped_total: "medical_warehouse_records_skipped_total",
            stage_rows_total: "medical_warehouse_stage_rows_total",
            stage_rows_dropped_total: "medical_warehouse_stage_rows_dropped_total",
            stage_duration: "medical_warehouse_stage_duration_seconds",
            quality_checks_failed: "medical_warehouse_quality_checks_failed",
        }
    }
}

impl PipelineMetrics {
    /// Record loader outcomes
    pub fn record_load(&self, inserted: usize, skipped: usize) {
        counter!(self.records_inserted_total).increment(inserted as u64);
        counter!(self.records_skipped_total).increment(skipped as u64);
    }

    /// Record rows emitted by a stage along with its duration
    pub fn record_stage(&self, stage: &'static str, rows: usize, duration: Duration) {
        counter!(self.stage_rows_total, "stage" => stage).increment(rows as u64);
        histogram!(self.stage_duration, "stage" => stage).record(duration.as_secs_f64());
    }

    /// Record rows a stage dropped, by reason
    pub fn record_dropped(&self, stage: &'static str, reason: &'static str, count: usize) {
        counter!(self.stage_rows_dropped_total, "stage" => stage, "reason" => reason)
            .increment(count as u64);
    }

    /// Record the number of failed quality checks for the run
    pub fn record_quality(&self, failed: usize) {
        gauge!(self.quality_checks_failed).set(failed as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        let metrics = PipelineMetrics::default();
        assert_eq!(
            metrics.records_inserted_total,
            "medical_warehouse_records_inserted_total"
        );
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let metrics = PipelineMetrics::default();
        metrics.record_load(3, 1);
        metrics.record_stage("staging", 3, Duration::from_millis(5));
        metrics.record_quality(0);
    }
}
