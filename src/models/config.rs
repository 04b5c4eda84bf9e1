// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Polling loop and detection settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Page fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Webhook notification settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Persisted state location
    #[serde(default)]
    pub state: StateConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    ///
    /// Environment overrides are applied either way, so a missing
    /// config file plus a webhook env var is a valid setup.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let mut config = Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        });
        config.apply_env_overrides();
        config
    }

    /// Apply environment-variable overrides on top of file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DISCORD_WEBHOOK_URL") {
            if !url.trim().is_empty() {
                self.notify.webhook_url = url;
            }
        }
        if let Ok(interval) = std::env::var("POLLING_INTERVAL") {
            match interval.parse::<u64>() {
                Ok(secs) => self.monitor.polling_interval_secs = secs,
                Err(_) => log::warn!("Ignoring non-numeric POLLING_INTERVAL: {}", interval),
            }
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate configuration values for basic sanity.
    ///
    /// The webhook URL is the only required setting; everything else
    /// has a usable default.
    pub fn validate(&self) -> Result<()> {
        if self.notify.webhook_url.trim().is_empty() {
            return Err(AppError::config(
                "Webhook URL is required. Set DISCORD_WEBHOOK_URL or notify.webhook_url",
            ));
        }
        Url::parse(&self.notify.webhook_url)
            .map_err(|e| AppError::config(format!("notify.webhook_url is not a valid URL: {e}")))?;
        Url::parse(&self.fetch.target_url)
            .map_err(|e| AppError::config(format!("fetch.target_url is not a valid URL: {e}")))?;
        if self.monitor.polling_interval_secs == 0 {
            return Err(AppError::config(
                "monitor.polling_interval_secs must be > 0",
            ));
        }
        if !self.monitor.spike_threshold_percent.is_finite()
            || self.monitor.spike_threshold_percent <= 0.0
        {
            return Err(AppError::config(
                "monitor.spike_threshold_percent must be a positive number",
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::config("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::config("fetch.user_agent is empty"));
        }
        Ok(())
    }
}

/// Polling loop and change-detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds to sleep between ticks
    #[serde(default = "defaults::polling_interval")]
    pub polling_interval_secs: u64,

    /// Activity increase (percent of the previous count) that counts
    /// as a spike
    #[serde(default = "defaults::spike_threshold")]
    pub spike_threshold_percent: f64,

    /// Send a roster summary to the webhook on startup
    #[serde(default = "defaults::startup_notification")]
    pub startup_notification: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            polling_interval_secs: defaults::polling_interval(),
            spike_threshold_percent: defaults::spike_threshold(),
            startup_notification: defaults::startup_notification(),
        }
    }
}

/// Page fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Page to monitor
    #[serde(default = "defaults::target_url")]
    pub target_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            target_url: defaults::target_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Webhook notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Discord-compatible webhook URL (required; usually set via the
    /// DISCORD_WEBHOOK_URL environment variable)
    #[serde(default)]
    pub webhook_url: String,

    /// Delivery timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Persisted state settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Path of the JSON snapshot file, overwritten each tick
    #[serde(default = "defaults::state_file")]
    pub file: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            file: defaults::state_file(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter (debug, info, warn, error)
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn polling_interval() -> u64 {
        300
    }
    pub fn spike_threshold() -> f64 {
        30.0
    }
    pub fn startup_notification() -> bool {
        true
    }
    pub fn target_url() -> String {
        "https://www.pizzint.watch/".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; doughwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn state_file() -> PathBuf {
        PathBuf::from("state.json")
    }
    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.monitor.polling_interval_secs, 300);
        assert_eq!(config.monitor.spike_threshold_percent, 30.0);
        assert!(config.monitor.startup_notification);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.state.file, PathBuf::from("state.json"));
    }

    #[test]
    fn validate_rejects_missing_webhook() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn validate_rejects_bad_webhook_url() {
        let mut config = Config::default();
        config.notify.webhook_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_minimal_config() {
        let mut config = Config::default();
        config.notify.webhook_url = "https://discord.com/api/webhooks/1/abc".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.notify.webhook_url = "https://discord.com/api/webhooks/1/abc".into();
        config.monitor.polling_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
            [monitor]
            polling_interval_secs = 60

            [notify]
            webhook_url = "https://discord.com/api/webhooks/1/abc"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.monitor.polling_interval_secs, 60);
        assert_eq!(config.monitor.spike_threshold_percent, 30.0);
        assert_eq!(config.fetch.target_url, "https://www.pizzint.watch/");
        assert!(config.validate().is_ok());
    }
}
