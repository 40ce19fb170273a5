//! Runtime configuration for the dashboard engine.
//!
//! Settings come from a `dashboard.toml` file with per-field defaults, then
//! environment overrides for the values that are secrets or deploy-specific
//! (`POS_BASE_URL`, `POS_TOKEN`). Configuration inconsistencies are rejected
//! at startup by [`DashboardConfig::validate`] rather than surfacing later
//! as silently under-counted totals.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::models::{DepartmentScheme, HourRange};

/// Error raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub pos: PosConfig,
    #[serde(default)]
    pub hours: HoursSettings,
    #[serde(default)]
    pub departments: DepartmentScheme,
    #[serde(default)]
    pub refresh: RefreshSettings,
}

/// POS backend connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PosConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Access token; normally supplied via `POS_TOKEN` rather than the file.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Page size for the transactions endpoint.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Page size for the two catalog listings.
    #[serde(default = "default_catalog_page_size")]
    pub catalog_page_size: u32,
}

impl Default for PosConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
            catalog_page_size: default_catalog_page_size(),
        }
    }
}

/// Operating-hour window of the venue, inclusive on both ends.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HoursSettings {
    #[serde(default = "default_open_hour")]
    pub open: u32,
    #[serde(default = "default_close_hour")]
    pub close: u32,
}

impl Default for HoursSettings {
    fn default() -> Self {
        Self {
            open: default_open_hour(),
            close: default_close_hour(),
        }
    }
}

/// Cache TTLs and the reference-day rule.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RefreshSettings {
    #[serde(default = "default_snapshot_ttl_secs")]
    pub snapshot_ttl_secs: u64,
    #[serde(default = "default_catalog_ttl_secs")]
    pub catalog_ttl_secs: u64,
    /// The reference day is this many days before the current day. The
    /// default of 7 keeps the comparison on the same weekday.
    #[serde(default = "default_reference_days_back")]
    pub reference_days_back: i64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            snapshot_ttl_secs: default_snapshot_ttl_secs(),
            catalog_ttl_secs: default_catalog_ttl_secs(),
            reference_days_back: default_reference_days_back(),
        }
    }
}

fn default_base_url() -> String {
    "https://joinposter.com/api".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_page_size() -> u32 {
    100
}

fn default_catalog_page_size() -> u32 {
    500
}

fn default_open_hour() -> u32 {
    10
}

fn default_close_hour() -> u32 {
    22
}

fn default_snapshot_ttl_secs() -> u64 {
    60
}

fn default_catalog_ttl_secs() -> u64 {
    3600
}

fn default_reference_days_back() -> i64 {
    7
}

/// Upper bound on the configurable cache TTLs (one year). Keeps every value
/// safely inside the range `chrono::Duration` arithmetic accepts.
const MAX_TTL_SECS: u64 = 60 * 60 * 24 * 365;

/// Farthest back the reference day may be placed (a year, the longest
/// comparison style in use).
const MAX_REFERENCE_DAYS_BACK: i64 = 366;

impl DashboardConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from the first `dashboard.toml` found in the standard locations,
    /// falling back to defaults when none exists, then apply environment
    /// overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("dashboard.toml"),
            PathBuf::from("config/dashboard.toml"),
            PathBuf::from("../dashboard.toml"),
        ];

        let config = match search_paths.iter().find(|path| path.exists()) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        Ok(config.apply_env())
    }

    /// Apply environment overrides: `POS_BASE_URL` and `POS_TOKEN`.
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = env::var("POS_BASE_URL") {
            self.pos.base_url = url;
        }
        if let Ok(token) = env::var("POS_TOKEN") {
            self.pos.token = token;
        }
        self
    }

    /// Reject inconsistent configuration up front: an invalid hour window,
    /// out-of-range TTLs or reference offset, or department sets that share
    /// a category id.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if HourRange::new(self.hours.open, self.hours.close).is_none() {
            return Err(ConfigError::Invalid(format!(
                "hours must satisfy open <= close <= 23, got {}..{}",
                self.hours.open, self.hours.close
            )));
        }

        let overlap = self.departments.overlapping_ids();
        if !overlap.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "department category sets overlap on ids {overlap:?}"
            )));
        }

        if self.refresh.snapshot_ttl_secs == 0 || self.refresh.catalog_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache TTLs must be non-zero".to_string(),
            ));
        }

        if self.refresh.snapshot_ttl_secs > MAX_TTL_SECS
            || self.refresh.catalog_ttl_secs > MAX_TTL_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "cache TTLs must be at most {MAX_TTL_SECS} seconds"
            )));
        }

        if self.refresh.reference_days_back < 1
            || self.refresh.reference_days_back > MAX_REFERENCE_DAYS_BACK
        {
            return Err(ConfigError::Invalid(format!(
                "reference_days_back must be between 1 and {MAX_REFERENCE_DAYS_BACK}"
            )));
        }

        Ok(())
    }

    /// The validated hour window.
    pub fn hour_range(&self) -> Result<HourRange, ConfigError> {
        HourRange::new(self.hours.open, self.hours.close).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "hours must satisfy open <= close <= 23, got {}..{}",
                self.hours.open, self.hours.close
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn full_config_parses() {
        let toml = r#"
[pos]
base_url = "https://pos.example.com/api"
token = "file-token"
timeout_secs = 25
page_size = 50
catalog_page_size = 200

[hours]
open = 9
close = 21

[departments]
hot = [4, 5]
cold = [6]
bar = [7, 8]

[refresh]
snapshot_ttl_secs = 30
catalog_ttl_secs = 1800
reference_days_back = 7
"#;

        let config: DashboardConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.pos.base_url, "https://pos.example.com/api");
        assert_eq!(config.pos.page_size, 50);
        assert_eq!(config.hours.open, 9);
        assert_eq!(config.refresh.snapshot_ttl_secs, 30);
        assert_eq!(config.hour_range().unwrap().len(), 13);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: DashboardConfig = toml::from_str("").unwrap();

        assert_eq!(config.pos.base_url, "https://joinposter.com/api");
        assert_eq!(config.pos.timeout_secs, 20);
        assert_eq!(config.pos.page_size, 100);
        assert_eq!(config.pos.catalog_page_size, 500);
        assert_eq!((config.hours.open, config.hours.close), (10, 22));
        assert_eq!(config.refresh.snapshot_ttl_secs, 60);
        assert_eq!(config.refresh.catalog_ttl_secs, 3600);
        assert_eq!(config.refresh.reference_days_back, 7);
        assert!(config.departments.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn overlapping_department_sets_are_rejected() {
        let toml = r#"
[departments]
hot = [4, 5]
cold = [5, 6]
"#;

        let config: DashboardConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn inverted_hours_are_rejected() {
        let toml = r#"
[hours]
open = 22
close = 10
"#;

        let config: DashboardConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
        assert!(config.hour_range().is_err());
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let toml = r#"
[refresh]
snapshot_ttl_secs = 0
"#;

        let config: DashboardConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlong_ttl_is_rejected() {
        // Parses fine as a u64 but would blow up chrono duration math if it
        // ever reached the cache layer.
        let toml = r#"
[refresh]
catalog_ttl_secs = 10000000000000000
"#;

        let config: DashboardConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at most"));
    }

    #[test]
    fn out_of_range_reference_offset_is_rejected() {
        for toml in [
            r#"
[refresh]
reference_days_back = 0
"#,
            r#"
[refresh]
reference_days_back = 3650
"#,
        ] {
            let config: DashboardConfig = toml::from_str(toml).unwrap();
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn from_file_reads_and_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[pos]
token = "disk-token"
"#
        )
        .unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.pos.token, "disk-token");

        let missing = DashboardConfig::from_file("/definitely/not/here.toml");
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not valid toml [[[").unwrap();

        let result = DashboardConfig::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
