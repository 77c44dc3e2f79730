//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Working hours, reminder offset and snooze length
//! - Notification preferences
//! - Daemon tuning (debounce window, config poll interval)
//!
//! Configuration is stored at `~/.config/exercise-snack/config.toml`.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

/// Reminder schedule settings.
///
/// A window is active only when `work_end_hour > work_start_hour`; an inverted
/// or empty window is valid configuration that schedules nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_work_start_hour")]
    pub work_start_hour: u32,
    #[serde(default = "default_work_end_hour")]
    pub work_end_hour: u32,
    /// Minutes before the top of the hour each reminder fires.
    #[serde(default)]
    pub reminder_offset_minutes: u32,
    #[serde(default = "default_snooze_duration")]
    pub snooze_duration_minutes: u32,
    /// Drop outstanding snoozes on every reschedule, not only on clear-all.
    #[serde(default)]
    pub clear_snoozes_on_reschedule: bool,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Daemon loop tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Coalescing window for settings changes.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_config_poll_secs")]
    pub config_poll_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/exercise-snack/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

fn default_work_start_hour() -> u32 {
    9
}
fn default_work_end_hour() -> u32 {
    17
}
fn default_snooze_duration() -> u32 {
    10
}
fn default_true() -> bool {
    true
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_config_poll_secs() -> u64 {
    2
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            work_start_hour: default_work_start_hour(),
            work_end_hour: default_work_end_hour(),
            reminder_offset_minutes: 0,
            snooze_duration_minutes: default_snooze_duration(),
            clear_snoozes_on_reschedule: false,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            config_poll_secs: default_config_poll_secs(),
        }
    }
}

impl ScheduleConfig {
    /// Shorthand for a window with no offset and the default snooze.
    pub fn hours(work_start_hour: u32, work_end_hour: u32) -> Self {
        Self {
            work_start_hour,
            work_end_hour,
            ..Self::default()
        }
    }

    /// `true` when the window contains at least one hour.
    pub fn is_active(&self) -> bool {
        self.work_end_hour > self.work_start_hour
    }

    /// `true` when `hour` lies in `[work_start_hour, work_end_hour)`.
    pub fn contains_hour(&self, hour: u32) -> bool {
        hour >= self.work_start_hour && hour < self.work_end_hour
    }

    pub fn offset(&self) -> Duration {
        Duration::minutes(i64::from(self.reminder_offset_minutes))
    }

    pub fn snooze_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.snooze_duration_minutes))
    }

    /// Reject values no window can be built from.
    ///
    /// An inverted window passes; it only yields an empty day.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, hour) in [
            ("schedule.work_start_hour", self.work_start_hour),
            ("schedule.work_end_hour", self.work_end_hour),
        ] {
            if hour > 23 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: format!("hour must be 0-23, got {hour}"),
                });
            }
        }
        if self.reminder_offset_minutes > 59 {
            return Err(ConfigError::InvalidValue {
                key: "schedule.reminder_offset_minutes".into(),
                message: format!(
                    "offset must be 0-59 minutes, got {}",
                    self.reminder_offset_minutes
                ),
            });
        }
        if self.snooze_duration_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "schedule.snooze_duration_minutes".into(),
                message: "snooze must be at least one minute".into(),
            });
        }
        if !self.is_active() {
            tracing::warn!(
                start = self.work_start_hour,
                end = self.work_end_hour,
                "end hour is not after start hour; no reminders will be scheduled"
            );
        }
        Ok(())
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
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        if key.is_empty() {
            return Err(unknown());
        }

        let mut parts = key.split('.').peekable();

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be created.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from `path`, writing and returning defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// holds out-of-range values, or if defaults cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(path)?;
            return Ok(cfg);
        }

        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let cfg: Config = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
        cfg.schedule.validate()?;
        Ok(cfg)
    }

    /// Persist to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
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

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed, or
    /// the resulting schedule is out of range. `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.schedule.validate()?;
        *self = updated;
        Ok(())
    }
}
