mod config;

pub use config::{Config, NotificationsConfig, TimerConfig};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/meeetimer[-dev]/` based on MEEETIMER_ENV.
///
/// Set MEEETIMER_ENV=dev to use a development data directory, or
/// MEEETIMER_CONFIG_DIR to use an explicit one.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("MEEETIMER_CONFIG_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)?;
        return Ok(dir);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("MEEETIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("meeetimer-dev")
    } else {
        base_dir.join("meeetimer")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
