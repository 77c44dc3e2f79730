mod config;

pub use config::{Config, DaemonConfig, NotificationsConfig, ScheduleConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/exercise-snack[-dev]/` based on EXERCISE_SNACK_ENV.
///
/// Set EXERCISE_SNACK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("EXERCISE_SNACK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("exercise-snack-dev")
    } else {
        base_dir.join("exercise-snack")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::NoDataDir(e.to_string()))?;
    Ok(dir)
}
