use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validation::InputValidator;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Warehouse storage settings
    pub database: DatabaseConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Transformation tuning knobs
    pub pipeline: PipelineConfig,
    /// Report artifact settings
    pub report: ReportConfig,
}

/// Warehouse storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite warehouse file
    pub path: String,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// Pool checkout timeout in seconds
    pub connection_timeout_secs: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Optional log file path; daily-rolled JSON output when set
    pub file_path: Option<String>,
}

/// Transformation tuning knobs; defaults match the source warehouse design
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Days of padding added to each end of the date-dimension range
    pub date_padding_days: i64,
    /// Half-width of the default date window when no valid staging dates exist
    pub default_window_days: i64,
    /// A channel is `active` if its last post is within this many days of run time
    pub active_within_days: i64,
    /// A channel is `moderate` if its last post is within this many days of run time
    pub moderate_within_days: i64,
}

/// Report artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory where the quality report and schema documentation are written
    pub output_directory: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            pipeline: PipelineConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/medical_warehouse.db".to_string(),
            max_connections: 10,
            connection_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            date_padding_days: 30,
            default_window_days: 365,
            active_within_days: 7,
            moderate_within_days: 30,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_directory: "reports".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// defaults < config files < `MEDICAL_WAREHOUSE_*` environment variables
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix; "__" separates nesting
            // levels so multi-word keys like database.max_connections stay
            // addressable (MEDICAL_WAREHOUSE_DATABASE__MAX_CONNECTIONS)
            .add_source(
                Environment::with_prefix("MEDICAL_WAREHOUSE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        InputValidator::validate_database_path(&self.database.path)?;
        InputValidator::validate_padding_days(self.pipeline.date_padding_days)?;
        InputValidator::validate_window_days(self.pipeline.default_window_days)?;
        InputValidator::validate_activity_thresholds(
            self.pipeline.active_within_days,
            self.pipeline.moderate_within_days,
        )?;

        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }

        if self.report.output_directory.trim().is_empty() {
            return Err(anyhow::anyhow!("Report output directory cannot be empty"));
        }

        Ok(())
    }

    /// Log level from configuration
    #[must_use]
    pub fn get_log_level(&self) -> String {
        self.logging.level.clone()
    }

    /// Log file path from configuration, if any
    #[must_use]
    pub fn get_log_file(&self) -> Option<&Path> {
        self.logging.file_path.as_deref().map(Path::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_activity_thresholds() {
        let mut config = AppConfig::default();
        config.pipeline.active_within_days = 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn environment_overrides_reach_multi_word_keys() {
        std::env::set_var("MEDICAL_WAREHOUSE_DATABASE__MAX_CONNECTIONS", "5");

        let config = Config::builder()
            .add_source(
                Environment::with_prefix("MEDICAL_WAREHOUSE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .expect("build config");
        let app: AppConfig = config.try_deserialize().expect("deserialize config");

        assert_eq!(app.database.max_connections, 5);

        std::env::remove_var("MEDICAL_WAREHOUSE_DATABASE__MAX_CONNECTIONS");
    }

    #[test]
    fn rejects_empty_database_path() {
        let mut config = AppConfig::default();
        config.database.path = String::new();
        assert!(config.validate().is_err());
    }
}
