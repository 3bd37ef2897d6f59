//! Runtime configuration.
//! Defaults reproduce the January 2024 yellow-taxi dataset published by the NYC TLC.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_DATA_DIR: &str = "data/raw";
pub const DEFAULT_DATASET_MONTH: &str = "2024-01";
pub const TRIP_URL_BASE: &str = "https://d37ci6vzurychx.cloudfront.net/trip-data";
pub const DEFAULT_ZONE_URL: &str =
    "https://d37ci6vzurychx.cloudfront.net/misc/taxi_zone_lookup.csv";
pub const ZONE_FILE_NAME: &str = "taxi_zone_lookup.csv";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("TAXI_DATASET_MONTH must be in YYYY-MM format, got '{0}'")]
    InvalidMonth(String),
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Directory holding the two downloaded resources.
    pub data_dir: PathBuf,
    /// Dataset month, `YYYY-MM`.
    pub dataset_month: String,
    pub trip_url: String,
    pub zone_url: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::for_month(DEFAULT_DATA_DIR, DEFAULT_DATASET_MONTH)
    }
}

impl DashboardConfig {
    /// Config for a month with the default upstream URLs. The month is not validated here.
    pub fn for_month(data_dir: impl Into<PathBuf>, month: &str) -> Self {
        Self {
            data_dir: data_dir.into(),
            dataset_month: month.to_string(),
            trip_url: trip_url_for(month),
            zone_url: DEFAULT_ZONE_URL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = env_or("TAXI_DATA_DIR", DEFAULT_DATA_DIR);
        let dataset_month = env_or("TAXI_DATASET_MONTH", DEFAULT_DATASET_MONTH);
        parse_month(&dataset_month)?;

        let trip_url = match std::env::var("TAXI_TRIP_URL") {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => trip_url_for(&dataset_month),
        };
        let zone_url = env_or("TAXI_ZONE_URL", DEFAULT_ZONE_URL);

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            dataset_month,
            trip_url,
            zone_url,
        })
    }

    pub fn trip_file_name(&self) -> String {
        format!("yellow_tripdata_{}.parquet", self.dataset_month)
    }

    pub fn trip_path(&self) -> PathBuf {
        self.data_dir.join(self.trip_file_name())
    }

    pub fn zone_path(&self) -> PathBuf {
        self.data_dir.join(ZONE_FILE_NAME)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Human-readable month for titles, e.g. "January 2024".
    pub fn month_title(&self) -> String {
        parse_month(&self.dataset_month)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|_| self.dataset_month.clone())
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

fn trip_url_for(month: &str) -> String {
    format!("{}/yellow_tripdata_{}.parquet", TRIP_URL_BASE, month)
}

/// Parse `YYYY-MM` into the first day of that month.
pub fn parse_month(month: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .map_err(|_| ConfigError::InvalidMonth(month.to_string()))
}
