use anyhow::{anyhow, Result};
use std::path::Path;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate the warehouse database path
    pub fn validate_database_path(path: &str) -> Result<()> {
        if path.trim().is_empty() {
            return Err(anyhow!("Database path cannot be empty"));
        }

        if path.contains('\0') {
            return Err(anyhow!("Database path contains invalid characters"));
        }

        if path.len() > 4096 {
            return Err(anyhow!("Database path too long (max 4096 characters)"));
        }

        Ok(())
    }

    /// Validate the raw-batch input directory
    pub fn validate_input_dir(path: &Path) -> Result<()> {
        if path.to_string_lossy().is_empty() {
            return Err(anyhow!("Input directory cannot be empty"));
        }

        if !path.exists() {
            return Err(anyhow!("Input directory does not exist: {path:?}"));
        }

        if !path.is_dir() {
            return Err(anyhow!("Input path is not a directory: {path:?}"));
        }

        Ok(())
    }

    /// Validate the date-dimension padding, in days
    pub fn validate_padding_days(days: i64) -> Result<()> {
        if days < 0 {
            return Err(anyhow!("Date padding cannot be negative"));
        }

        if days > 365 {
            return Err(anyhow!("Date padding too large (max 365 days)"));
        }

        Ok(())
    }

    /// Validate the default date window used when no valid staging dates exist
    pub fn validate_window_days(days: i64) -> Result<()> {
        if days <= 0 {
            return Err(anyhow!("Default date window must be positive"));
        }

        if days > 365 * 10 {
            return Err(anyhow!("Default date window too large (max 10 years)"));
        }

        Ok(())
    }

    /// Validate the activity-status thresholds
    pub fn validate_activity_thresholds(active_days: i64, moderate_days: i64) -> Result<()> {
        if active_days <= 0 || moderate_days <= 0 {
            return Err(anyhow!("Activity thresholds must be positive"));
        }

        if active_days >= moderate_days {
            return Err(anyhow!(
                "Active threshold ({active_days} days) must be below the moderate threshold ({moderate_days} days)"
            ));
        }

        Ok(())
    }
}
