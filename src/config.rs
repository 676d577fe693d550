use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::{KboError, Result};

/// First date of historical collection when the caller does not supply one.
pub const DEFAULT_START_DATE: &str = "2025-03-22";

/// Directory holding the two persisted cache documents.
pub const DEFAULT_CACHE_DIR: &str = "/data";

/// WebDriver endpoint for the browser fallback.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// League duration thresholds in minutes, empirically derived: 30th percentile,
/// league mean, 70th percentile.
pub const DEFAULT_THRESHOLDS: PaceThresholds = PaceThresholds {
    t1: 168.0,
    t2: 182.7,
    t3: 194.0,
};

/// Ordered bucket boundaries for [`crate::classify`]. Invariant: `t1 < t2 < t3`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaceThresholds {
    pub t1: f64,
    pub t2: f64,
    pub t3: f64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub start_date: NaiveDate,
    pub cache_dir: PathBuf,
    /// When set, only the trailing N days of any requested range are scanned.
    pub max_days: Option<u32>,
    pub webdriver_url: String,
    pub thresholds: PaceThresholds,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognized variables: `START_DATE`, `CACHE_DIR`, `MAX_DAYS`,
    /// `WEBDRIVER_URL`, `PACE_T1`/`PACE_T2`/`PACE_T3`.
    pub fn from_env() -> Result<Self> {
        let start_raw = std::env::var("START_DATE").unwrap_or_else(|_| DEFAULT_START_DATE.into());
        let start_date = parse_date(&start_raw)?;

        let cache_dir = std::env::var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR));

        let max_days = match std::env::var("MAX_DAYS") {
            Ok(raw) => Some(raw.parse::<u32>().map_err(|_| KboError::Config {
                key: "MAX_DAYS",
                value: raw,
            })?),
            Err(_) => None,
        };

        let webdriver_url =
            std::env::var("WEBDRIVER_URL").unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.into());

        let thresholds = PaceThresholds {
            t1: env_f64("PACE_T1", DEFAULT_THRESHOLDS.t1)?,
            t2: env_f64("PACE_T2", DEFAULT_THRESHOLDS.t2)?,
            t3: env_f64("PACE_T3", DEFAULT_THRESHOLDS.t3)?,
        };

        Ok(Config {
            start_date,
            cache_dir,
            max_days,
            webdriver_url,
            thresholds,
        })
    }

    /// Build a configuration with explicit values, for callers that do not want
    /// environment lookups (tests, embedding applications).
    pub fn with_defaults(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Config {
            start_date: parse_date(DEFAULT_START_DATE)?,
            cache_dir: cache_dir.into(),
            max_days: None,
            webdriver_url: DEFAULT_WEBDRIVER_URL.into(),
            thresholds: DEFAULT_THRESHOLDS,
        })
    }
}

fn env_f64(key: &'static str, default: f64) -> Result<f64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<f64>()
            .map_err(|_| KboError::Config { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Parse a calendar date in either `YYYY-MM-DD` or `YYYYMMDD` form.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let format = if raw.contains('-') { "%Y-%m-%d" } else { "%Y%m%d" };
    Ok(NaiveDate::parse_from_str(raw.trim(), format)?)
}
