//! Schema documentation artifact.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;

const SCHEMA_DOC: &str = "# Medical Telegram Warehouse - Schema Documentation

## Star Schema Design

### Dimension Tables

#### dim_dates
- **Purpose**: Time dimension for date-based analysis
- **Primary Key**: date_key (YYYYMMDD format)
- **Key Fields**: full_date, year, quarter, month, day_name, is_weekend

#### dim_channels
- **Purpose**: Channel dimension with business classification
- **Primary Key**: channel_key (dense 1..N rank by post count, rebuilt each run)
- **Key Fields**: channel_name, channel_type, business metrics
- **Business Logic**: Automatic classification based on channel name patterns

### Fact Table

#### fct_messages
- **Purpose**: Core fact table for message analytics
- **Primary Key**: message_id jointly with channel_key (message ids are per-channel)
- **Foreign Keys**: channel_key -> dim_channels, date_key -> dim_dates
- **Metrics**: view_count, forward_count, has_image

## Data Quality
- **Staging Layer**: Includes data cleaning and validation flags
- **Tests Implemented**: Future dates, negative values, classification coverage,
  referential integrity (channels, dates)
";

/// Write the star-schema documentation into `output_dir`.
///
/// Returns the path of the written file.
pub fn write_schema_documentation(output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join("schema_documentation.md");
    fs::write(&path, SCHEMA_DOC)?;
    info!(path = %path.display(), "Wrote schema documentation");
    Ok(path)
}
