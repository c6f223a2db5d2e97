//! Core error types for meeetimer-core.
//!
//! Only configuration can fail: invalid timer settings and the TOML settings
//! store. Engine transitions never error; an inapplicable command is a no-op.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for meeetimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Rejected timer settings
    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The shared engine lock was poisoned by a panicking holder
    #[error("Timer engine unavailable: {0}")]
    EnginePoisoned(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// Settings validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// Total duration must be a positive number of seconds
    #[error("total duration must be at least 1 second, got {duration}")]
    InvalidDuration { duration: i64 },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

impl<T> From<std::sync::PoisonError<T>> for CoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        CoreError::EnginePoisoned(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
