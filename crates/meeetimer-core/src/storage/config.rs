//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - The last used timer settings (duration and alert thresholds)
//! - Notification preferences
//!
//! Configuration is stored at `~/.config/meeetimer/config.toml`. Timer values
//! are kept raw and only become [`TimerSettings`] through validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::timer::{validate, TimerSettings, DEFAULT_ALERTS_SECS, DEFAULT_DURATION_SECS};

/// Timer section, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_duration")]
    pub total_duration_seconds: i64,
    #[serde(default = "default_alerts")]
    pub alert_thresholds: Vec<i64>,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Desktop popup as the primary channel.
    #[serde(default = "default_true")]
    pub desktop: bool,
    /// Terminal bell, used alone or as the desktop fallback.
    #[serde(default = "default_true")]
    pub bell: bool,
    /// Minimum gap between alerts raised in the same second.
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/meeetimer/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_duration() -> i64 {
    DEFAULT_DURATION_SECS as i64
}
fn default_alerts() -> Vec<i64> {
    DEFAULT_ALERTS_SECS.iter().map(|&t| t as i64).collect()
}
fn default_true() -> bool {
    true
}
fn default_stagger_ms() -> u64 {
    600
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            total_duration_seconds: default_duration(),
            alert_thresholds: default_alerts(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            desktop: true,
            bell: true,
            stagger_ms: default_stagger_ms(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => value
                    .parse::<bool>()
                    .map(serde_json::Value::Bool)
                    .map_err(|e| invalid(e.to_string()))?,
                serde_json::Value::Number(_) => value
                    .parse::<i64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Location of the config file in the data directory.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into());
            }
        };
        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()).into())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!(error = %e, "could not load configuration, using defaults");
            Self::default()
        })
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        let save_failed = |e: std::io::Error| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(save_failed)?;
        }
        std::fs::write(path, content).map_err(save_failed)?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, type-checked against the current value.
    /// Does not persist; call [`Config::save`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed, or
    /// a `timer.*` change would make the timer settings invalid. On error
    /// `self` is left unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)
            .map_err(|e| invalid(e.to_string()))?;
        if key.starts_with("timer.") {
            validate(
                updated.timer.total_duration_seconds,
                &updated.timer.alert_thresholds,
            )
            .map_err(|e| invalid(e.to_string()))?;
        }
        *self = updated;
        Ok(())
    }

    /// The stored timer settings, validated. Invalid stored values fall back
    /// to the defaults.
    pub fn timer_settings(&self) -> TimerSettings {
        validate(self.timer.total_duration_seconds, &self.timer.alert_thresholds).unwrap_or_else(
            |e| {
                warn!(error = %e, "stored timer settings rejected, using defaults");
                TimerSettings::default()
            },
        )
    }

    /// Store `settings` as the timer section.
    pub fn remember(&mut self, settings: &TimerSettings) {
        let raw = settings.to_raw();
        self.timer = TimerConfig {
            total_duration_seconds: raw.total_duration_seconds,
            alert_thresholds: raw.alert_thresholds,
        };
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.notifications.stagger_ms)
    }
}
