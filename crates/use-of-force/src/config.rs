//! Configuration management for use-of-force.
//!
//! Configuration is loaded with figment from defaults, an optional TOML file,
//! and environment variables.

use std::path::PathBuf;

use chrono::Duration;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "use-of-force";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "USEOFFORCE_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `USEOFFORCE_`, nested with `__`,
///    e.g. `USEOFFORCE_REMINDERS__OVERDUE_AFTER_DAYS=5`)
/// 2. TOML config file at `~/.config/use-of-force/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Statement reminder configuration.
    pub reminders: ReminderConfig,
    /// Command output configuration.
    pub output: OutputConfig,
}

/// Statement reminder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Hours after report submission before the first reminder is due.
    pub first_reminder_after_hours: u32,
    /// Hours between subsequent reminders.
    pub reminder_interval_hours: u32,
    /// Days after report submission before a pending statement is overdue.
    pub overdue_after_days: u32,
}

/// Command output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    pub pretty_json: bool,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            first_reminder_after_hours: 24,
            reminder_interval_hours: 24,
            overdue_after_days: 3,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty_json: true }
    }
}

impl ReminderConfig {
    /// Delay before the first reminder.
    #[must_use]
    pub fn first_reminder_after(&self) -> Duration {
        Duration::hours(i64::from(self.first_reminder_after_hours))
    }

    /// Delay between reminders.
    #[must_use]
    pub fn reminder_interval(&self) -> Duration {
        Duration::hours(i64::from(self.reminder_interval_hours))
    }

    /// Delay before a pending statement becomes overdue.
    #[must_use]
    pub fn overdue_after(&self) -> Duration {
        Duration::days(i64::from(self.overdue_after_days))
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let reminders = &self.reminders;

        if reminders.reminder_interval_hours == 0 {
            return Err(Error::ConfigValidation {
                message: "reminder_interval_hours must be greater than 0".to_string(),
            });
        }

        if reminders.overdue_after_days == 0 {
            return Err(Error::ConfigValidation {
                message: "overdue_after_days must be greater than 0".to_string(),
            });
        }

        if reminders.first_reminder_after() > reminders.overdue_after() {
            return Err(Error::ConfigValidation {
                message: format!(
                    "first_reminder_after_hours ({}) cannot be later than overdue_after_days ({})",
                    reminders.first_reminder_after_hours, reminders.overdue_after_days
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.reminders.first_reminder_after_hours, 24);
        assert_eq!(config.reminders.reminder_interval_hours, 24);
        assert_eq!(config.reminders.overdue_after_days, 3);
        assert!(config.output.pretty_json);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut config = Config::default();
        config.reminders.reminder_interval_hours = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("reminder_interval_hours"));
    }

    #[test]
    fn test_validate_zero_overdue() {
        let mut config = Config::default();
        config.reminders.overdue_after_days = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("overdue_after_days"));
    }

    #[test]
    fn test_validate_first_reminder_after_overdue() {
        let mut config = Config::default();
        config.reminders.first_reminder_after_hours = 24 * 4;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("first_reminder_after_hours"));
    }

    #[test]
    fn test_reminder_durations() {
        let reminders = ReminderConfig::default();
        assert_eq!(reminders.first_reminder_after(), Duration::hours(24));
        assert_eq!(reminders.reminder_interval(), Duration::hours(24));
        assert_eq!(reminders.overdue_after(), Duration::days(3));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("use-of-force"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[reminders]\noverdue_after_days = 5\n\n[output]\npretty_json = false\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.reminders.overdue_after_days, 5);
        assert_eq!(config.reminders.reminder_interval_hours, 24);
        assert!(!config.output.pretty_json);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[reminders]\nreminder_interval_hours = 0\n").unwrap();

        let result = Config::load_from(Some(path));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_reminder_config_deserialize_partial() {
        let json = r#"{"overdue_after_days": 7}"#;
        let reminders: ReminderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(reminders.overdue_after_days, 7);
        assert_eq!(reminders.first_reminder_after_hours, 24);
    }
}
