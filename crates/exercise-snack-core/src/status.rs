//! Menu-bar status text derived from the live schedule.

use std::fmt;

use chrono::{DateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduler::PendingView;
use crate::storage::ScheduleConfig;

pub const OUTSIDE_WORKING_HOURS: &str = "Outside working hours";
pub const NO_MORE_REMINDERS: &str = "No more reminders today";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "at", rename_all = "snake_case")]
pub enum Status {
    OutsideWorkingHours,
    /// Local wall-clock time of the next pending slot.
    NextReminder(NaiveTime),
    NoMoreReminders,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::OutsideWorkingHours => f.write_str(OUTSIDE_WORKING_HOURS),
            Status::NextReminder(time) => write!(f, "Next reminder: {}", time.format("%H:%M")),
            Status::NoMoreReminders => f.write_str(NO_MORE_REMINDERS),
        }
    }
}

/// Status as of `now`. Never cached; callers recompute on their own cadence.
///
/// Outside `[work_start_hour, work_end_hour)` the pending set is not consulted.
pub fn status<Tz: TimeZone>(
    config: &ScheduleConfig,
    view: &impl PendingView,
    now: &DateTime<Tz>,
) -> Status {
    if !config.contains_hour(now.hour()) {
        return Status::OutsideWorkingHours;
    }
    match view.next_fire_instant(now.with_timezone(&Utc)) {
        Some(next) => Status::NextReminder(next.with_timezone(&now.timezone()).time()),
        None => Status::NoMoreReminders,
    }
}
