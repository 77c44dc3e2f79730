pub mod config;
pub mod plan;
pub mod run;
pub mod status;

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveTime, TimeZone};
use exercise_snack_core::Config;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Explicit `--config` path, or the per-user default.
pub fn config_path(explicit: Option<PathBuf>) -> CliResult<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(Config::default_path()?),
    }
}

/// Resolve `--at`: an RFC 3339 timestamp, or `HH:MM` today, in local time.
/// Defaults to the current time.
pub fn resolve_now(at: Option<&str>) -> CliResult<DateTime<Local>> {
    let Some(at) = at else {
        return Ok(Local::now());
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(at) {
        return Ok(parsed.with_timezone(&Local));
    }
    let time = NaiveTime::parse_from_str(at, "%H:%M")
        .map_err(|_| format!("cannot parse '{at}': expected RFC 3339 or HH:MM"))?;
    let naive = Local::now().date_naive().and_time(time);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("{at} does not exist today in the local time zone").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Utc};

    #[test]
    fn resolves_rfc3339() {
        let now = resolve_now(Some("2024-03-04T10:05:00Z")).unwrap();
        assert_eq!(
            now.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 3, 4, 10, 5, 0).unwrap()
        );
    }

    #[test]
    fn resolves_wall_clock_time_today() {
        let now = resolve_now(Some("13:45")).unwrap();
        assert_eq!((now.hour(), now.minute()), (13, 45));
        assert_eq!(now.date_naive(), Local::now().date_naive());
    }

    #[test]
    fn rejects_nonsense() {
        assert!(resolve_now(Some("quarter past")).is_err());
    }
}
