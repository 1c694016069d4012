//! Configuration management for fpy-dashboard

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::aggregate::shipments::REPORT_WEEK_CHOICES;
use crate::aggregate::weekly::{DEFAULT_WEEKS, WEEK_CHOICES};
use crate::calendar::{CalendarWindow, TimePolicy};
use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Statistics API settings
    pub api: ApiConfig,

    /// Calendar settings
    pub calendar: CalendarConfig,

    /// FPY dashboard settings
    pub dashboard: DashboardConfig,

    /// Shipped-units report settings
    pub report: ReportConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Statistics API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `http://127.0.0.1:5000/api`
    pub base_url: String,

    /// Request timeout, humantime format (e.g. "30s", "1m")
    pub timeout: String,

    /// Bearer token sent with every request
    pub token: Option<String>,
}

/// Calendar settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// How instants map onto calendar days: "local", "utc", or
    /// `{ fixed_offset = <seconds east of UTC> }`
    pub time_policy: TimePolicy,
}

/// FPY dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Weeks shown in the weekly view
    pub weeks: u32,

    /// Width of the visible week-tab strip
    pub tab_window: usize,
}

/// Shipped-units report settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Weeks covered by the report
    pub weeks: u32,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/api".to_string(),
            timeout: "30s".to_string(),
            token: None,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            weeks: DEFAULT_WEEKS,
            tab_window: 6,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { weeks: 4 }
    }
}

impl ApiConfig {
    /// Parsed request timeout
    pub fn timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.timeout)
            .map_err(|e| Error::config(format!("invalid api timeout '{}': {e}", self.timeout)))
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::config("Could not determine config directory"))?;
        Ok(config_dir.join("fpy-dashboard").join("config.toml"))
    }

    /// Calendar bound to the configured time policy
    #[must_use]
    pub const fn calendar(&self) -> CalendarWindow {
        CalendarWindow::new(self.calendar.time_policy)
    }

    /// Validate configuration values.
    ///
    /// Call this after loading to ensure all values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        validate_weeks(self.dashboard.weeks)?;

        if !REPORT_WEEK_CHOICES.contains(&self.report.weeks) {
            return Err(Error::config(format!(
                "report.weeks must be one of {REPORT_WEEK_CHOICES:?}, got {}",
                self.report.weeks
            )));
        }

        if self.dashboard.tab_window == 0 {
            return Err(Error::config("dashboard.tab_window must be at least 1"));
        }

        if !self.calendar.time_policy.is_valid() {
            return Err(Error::config(format!(
                "calendar.time_policy offset must be within ±24h, got {}",
                self.calendar.time_policy
            )));
        }

        self.api.timeout()?;
        if self.api.base_url.trim().is_empty() {
            return Err(Error::config("api.base_url must not be empty"));
        }

        // Validate log_level is a known level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "log_level must be one of {:?}, got '{}'",
                valid_levels, self.general.log_level
            )));
        }

        Ok(())
    }
}

/// Check a weekly-view week count against the offered choices.
pub fn validate_weeks(weeks: u32) -> Result<()> {
    if WEEK_CHOICES.contains(&weeks) {
        Ok(())
    } else {
        Err(Error::config(format!(
            "weeks must be one of {WEEK_CHOICES:?}, got {weeks}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.dashboard.weeks, 6);
        assert_eq!(config.api.timeout().unwrap(), Duration::from_secs(30));
        assert_eq!(config.calendar.time_policy, TimePolicy::Local);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://qc.example.com/api"

            [calendar]
            time_policy = "utc"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://qc.example.com/api");
        assert_eq!(config.api.timeout, "30s");
        assert_eq!(config.calendar.time_policy, TimePolicy::Utc);
        assert_eq!(config.dashboard.tab_window, 6);
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_unknown_week_count() {
        let mut config = Config::default();
        config.dashboard.weeks = 5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.report.weeks = 26;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_bad_timeout_and_offset() {
        let mut config = Config::default();
        config.api.timeout = "soon".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.calendar.time_policy = TimePolicy::FixedOffset(90_000);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dashboard.tab_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_round_trips_through_toml() {
        let mut config = Config::default();
        config.calendar.time_policy = TimePolicy::FixedOffset(-18000);
        config.api.token = Some("secret".to_string());
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.calendar.time_policy, TimePolicy::FixedOffset(-18000));
        assert_eq!(back.api.token.as_deref(), Some("secret"));
    }
}
