//! Configuration management for `GeoAlert`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::GeoAlertError;
use crate::models::SeverityLevel;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `GeoAlert` application
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeoAlertConfig {
    /// Shared HTTP client settings
    pub http: HttpConfig,
    /// Disaster feed endpoints
    pub feeds: FeedsConfig,
    /// Open-Meteo endpoints
    pub open_meteo: OpenMeteoConfig,
    /// Polling and notification behaviour
    pub dashboard: DashboardConfig,
    /// HTTP API server
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Retries for transient failures (0 disables retrying)
    pub max_retries: u32,
    /// User agent sent upstream
    pub user_agent: String,
}

/// Disaster feed endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub eonet_url: String,
    /// All earthquakes M1.0+ in the past hour
    pub usgs_hour_url: String,
    /// All earthquakes M2.5+ in the past day
    pub usgs_day_url: String,
    /// Significant earthquakes in the past week
    pub usgs_significant_url: String,
}

/// Open-Meteo endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenMeteoConfig {
    pub forecast_url: String,
    pub air_quality_url: String,
    pub geocoding_url: String,
}

/// Polling and notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Re-run the fetch cycle periodically when serving
    pub auto_refresh: bool,
    /// Seconds between fetch cycles
    pub refresh_interval_seconds: u64,
    /// Emit notifications for new events
    pub notifications_enabled: bool,
    /// Minimum severity that produces a notification
    pub min_severity_notification: SeverityLevel,
    /// Temperature unit for CLI output (celsius or fahrenheit)
    pub temperature_unit: String,
}

/// HTTP API server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Origin used when building share links
    pub public_origin: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_user_agent() -> String {
    format!("GeoAlert/{}", env!("CARGO_PKG_VERSION"))
}

fn default_eonet_url() -> String {
    "https://eonet.gsfc.nasa.gov/api/v3/events?status=open&limit=100".to_string()
}

fn default_usgs_hour_url() -> String {
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/1.0_hour.geojson".to_string()
}

fn default_usgs_day_url() -> String {
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/2.5_day.geojson".to_string()
}

fn default_usgs_significant_url() -> String {
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/significant_week.geojson"
        .to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_air_quality_url() -> String {
    "https://air-quality-api.open-meteo.com/v1/air-quality".to_string()
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".to_string()
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_temperature_unit() -> String {
    "celsius".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_public_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            eonet_url: default_eonet_url(),
            usgs_hour_url: default_usgs_hour_url(),
            usgs_day_url: default_usgs_day_url(),
            usgs_significant_url: default_usgs_significant_url(),
        }
    }
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            forecast_url: default_forecast_url(),
            air_quality_url: default_air_quality_url(),
            geocoding_url: default_geocoding_url(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            refresh_interval_seconds: default_refresh_interval(),
            notifications_enabled: true,
            min_severity_notification: SeverityLevel::Moderate,
            temperature_unit: default_temperature_unit(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            public_origin: default_public_origin(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl GeoAlertConfig {
    /// Load configuration from the default file location and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // GEOALERT__DASHBOARD__REFRESH_INTERVAL_SECONDS=60 and friends
        builder = builder.add_source(
            Environment::with_prefix("GEOALERT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: GeoAlertConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("geoalert").join("config.toml"))
    }

    /// Apply default values to empty or zeroed configuration fields
    pub fn apply_defaults(&mut self) {
        if self.http.timeout_seconds == 0 {
            self.http.timeout_seconds = default_timeout();
        }
        if self.http.user_agent.is_empty() {
            self.http.user_agent = default_user_agent();
        }
        if self.feeds.eonet_url.is_empty() {
            self.feeds.eonet_url = default_eonet_url();
        }
        if self.feeds.usgs_hour_url.is_empty() {
            self.feeds.usgs_hour_url = default_usgs_hour_url();
        }
        if self.feeds.usgs_day_url.is_empty() {
            self.feeds.usgs_day_url = default_usgs_day_url();
        }
        if self.feeds.usgs_significant_url.is_empty() {
            self.feeds.usgs_significant_url = default_usgs_significant_url();
        }
        if self.open_meteo.forecast_url.is_empty() {
            self.open_meteo.forecast_url = default_forecast_url();
        }
        if self.open_meteo.air_quality_url.is_empty() {
            self.open_meteo.air_quality_url = default_air_quality_url();
        }
        if self.open_meteo.geocoding_url.is_empty() {
            self.open_meteo.geocoding_url = default_geocoding_url();
        }
        if self.dashboard.refresh_interval_seconds == 0 {
            self.dashboard.refresh_interval_seconds = default_refresh_interval();
        }
        if self.dashboard.temperature_unit.is_empty() {
            self.dashboard.temperature_unit = default_temperature_unit();
        }
        if self.server.bind_address.is_empty() {
            self.server.bind_address = default_bind_address();
        }
        if self.server.public_origin.is_empty() {
            self.server.public_origin = default_public_origin();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_urls()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds > 300 {
            return Err(GeoAlertError::config("HTTP timeout cannot exceed 300 seconds").into());
        }

        if self.http.max_retries > 10 {
            return Err(GeoAlertError::config("HTTP max retries cannot exceed 10").into());
        }

        if !(15..=3600).contains(&self.dashboard.refresh_interval_seconds) {
            return Err(GeoAlertError::config(
                "Refresh interval must be between 15 and 3600 seconds",
            )
            .into());
        }

        if self.server.port == 0 {
            return Err(GeoAlertError::config("Server port cannot be 0").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(GeoAlertError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(GeoAlertError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_units = ["celsius", "fahrenheit"];
        if !valid_units.contains(&self.dashboard.temperature_unit.as_str()) {
            return Err(GeoAlertError::config(format!(
                "Invalid temperature unit '{}'. Must be one of: {}",
                self.dashboard.temperature_unit,
                valid_units.join(", ")
            ))
            .into());
        }

        Ok(())
    }

    /// Every upstream and origin URL must be HTTP(S)
    fn validate_urls(&self) -> Result<()> {
        let urls = [
            ("feeds.eonet_url", &self.feeds.eonet_url),
            ("feeds.usgs_hour_url", &self.feeds.usgs_hour_url),
            ("feeds.usgs_day_url", &self.feeds.usgs_day_url),
            ("feeds.usgs_significant_url", &self.feeds.usgs_significant_url),
            ("open_meteo.forecast_url", &self.open_meteo.forecast_url),
            ("open_meteo.air_quality_url", &self.open_meteo.air_quality_url),
            ("open_meteo.geocoding_url", &self.open_meteo.geocoding_url),
            ("server.public_origin", &self.server.public_origin),
        ];

        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(GeoAlertError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL, got '{url}'"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = GeoAlertConfig::default();
        assert_eq!(config.http.timeout_seconds, 30);
        assert_eq!(config.dashboard.refresh_interval_seconds, 30);
        assert_eq!(
            config.dashboard.min_severity_notification,
            SeverityLevel::Moderate
        );
        assert_eq!(config.logging.level, "info");
        assert!(config.feeds.eonet_url.contains("status=open&limit=100"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = GeoAlertConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_refresh_interval() {
        let mut config = GeoAlertConfig::default();
        config.dashboard.refresh_interval_seconds = 5;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Refresh interval"));
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = GeoAlertConfig::default();
        config.feeds.usgs_day_url = "ftp://example.com/feed".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("usgs_day_url"));
    }

    #[test]
    fn test_apply_defaults_fills_empty_values() {
        let mut config = GeoAlertConfig::default();
        config.open_meteo.geocoding_url.clear();
        config.logging.format.clear();
        config.apply_defaults();
        assert_eq!(
            config.open_meteo.geocoding_url,
            "https://geocoding-api.open-meteo.com/v1/search"
        );
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[dashboard]
refresh_interval_seconds = 60
min_severity_notification = "severe"

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = GeoAlertConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.dashboard.refresh_interval_seconds, 60);
        assert_eq!(
            config.dashboard.min_severity_notification,
            SeverityLevel::Severe
        );
        assert_eq!(config.logging.format, "json");
        // untouched sections keep their defaults
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = GeoAlertConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("geoalert"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
