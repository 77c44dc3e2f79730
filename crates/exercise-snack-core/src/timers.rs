//! One-shot deadlines for the day-boundary and status-refresh triggers.
//!
//! Each [`TimerKind`] has at most one armed deadline. Re-arming hands out a
//! new [`TimerId`] and invalidates the old one, so a firing that was already
//! in flight when the timer was replaced is recognised as stale and ignored.
//! Deadlines are absolute wall-clock instants, recomputed from "now" on every
//! arm rather than accumulated, which keeps DST shifts and sleep/wake from
//! skewing them.

use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::local_top_of_hour;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Local midnight; triggers a full reschedule.
    DayBoundary,
    /// Top of every minute; recomputes the status text only.
    StatusRefresh,
}

/// Handle for one arming of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy)]
struct Armed {
    id: TimerId,
    at: DateTime<Utc>,
}

/// Armed deadlines, at most one per kind.
#[derive(Debug, Default)]
pub struct Timers {
    next_id: u64,
    armed: HashMap<TimerKind, Armed>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind` to fire at `at`, replacing any earlier arming.
    pub fn arm(&mut self, kind: TimerKind, at: DateTime<Utc>) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        if let Some(old) = self.armed.insert(kind, Armed { id, at }) {
            tracing::trace!(?kind, old = ?old.id, new = ?id, "timer re-armed");
        }
        id
    }

    /// Disarm `kind`. Returns whether anything was armed; repeated calls are harmless.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.armed.remove(&kind).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.armed.clear();
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<DateTime<Utc>> {
        self.armed.get(&kind).map(|a| a.at)
    }

    /// Consume a firing. Returns the kind if `id` is the live arming, `None`
    /// if it was replaced or cancelled in the meantime.
    pub fn fire(&mut self, id: TimerId) -> Option<TimerKind> {
        let kind = self
            .armed
            .iter()
            .find_map(|(kind, armed)| (armed.id == id).then_some(*kind))?;
        self.armed.remove(&kind);
        Some(kind)
    }

    /// Earliest armed deadline.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.armed.values().map(|a| a.at).min()
    }

    /// Ids whose deadline is at or before `now`, earliest first.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<TimerId> {
        let mut due: Vec<Armed> = self.armed.values().filter(|a| a.at <= now).copied().collect();
        due.sort_by_key(|a| a.at);
        due.into_iter().map(|a| a.id).collect()
    }
}

/// Start of the next local calendar day after `now`, as an absolute instant.
///
/// If midnight does not exist locally (a DST jump at 00:00), the first valid
/// hour after it is used.
pub fn next_local_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let tz = now.timezone();
    now.date_naive()
        .succ_opt()
        .and_then(|tomorrow| (0..3).find_map(|hour| local_top_of_hour(&tz, tomorrow, hour)))
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc) + Duration::days(1))
}

/// Top of the minute following `now`.
pub fn next_minute(now: DateTime<Utc>) -> DateTime<Utc> {
    let next = (now.timestamp().div_euclid(60) + 1) * 60;
    DateTime::from_timestamp(next, 0).unwrap_or(now + Duration::minutes(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, s).unwrap()
    }

    #[test]
    fn rearm_invalidates_previous_id() {
        let mut timers = Timers::new();
        let first = timers.arm(TimerKind::DayBoundary, utc(23, 0, 0));
        let second = timers.arm(TimerKind::DayBoundary, utc(23, 30, 0));
        assert_ne!(first, second);
        assert_eq!(timers.fire(first), None);
        assert_eq!(timers.deadline(TimerKind::DayBoundary), Some(utc(23, 30, 0)));
        assert_eq!(timers.fire(second), Some(TimerKind::DayBoundary));
        assert_eq!(timers.fire(second), None);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut timers = Timers::new();
        let id = timers.arm(TimerKind::StatusRefresh, utc(10, 1, 0));
        assert!(timers.cancel(TimerKind::StatusRefresh));
        assert!(!timers.cancel(TimerKind::StatusRefresh));
        assert_eq!(timers.fire(id), None);
    }

    #[test]
    fn due_lists_earliest_first() {
        let mut timers = Timers::new();
        let late = timers.arm(TimerKind::DayBoundary, utc(10, 5, 0));
        let early = timers.arm(TimerKind::StatusRefresh, utc(10, 1, 0));
        assert_eq!(timers.next_deadline(), Some(utc(10, 1, 0)));
        assert!(timers.due(utc(10, 0, 59)).is_empty());
        assert_eq!(timers.due(utc(10, 1, 0)), vec![early]);
        assert_eq!(timers.due(utc(11, 0, 0)), vec![early, late]);
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut timers = Timers::new();
        timers.arm(TimerKind::DayBoundary, utc(10, 5, 0));
        timers.arm(TimerKind::StatusRefresh, utc(10, 1, 0));
        timers.cancel_all();
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn next_midnight_uses_local_calendar() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 3, 4, 23, 30, 0).unwrap();
        let expected = tz.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(next_local_midnight(&now), expected.with_timezone(&Utc));
    }

    #[test]
    fn next_midnight_from_exact_midnight_is_a_full_day() {
        let now = utc(0, 0, 0);
        assert_eq!(next_local_midnight(&now), now + Duration::days(1));
    }

    #[test]
    fn next_midnight_falls_back_to_first_existing_hour() {
        use chrono_tz::America::Santiago;
        // Clocks jump from 00:00 to 01:00 on 2024-09-08.
        let now = Santiago.with_ymd_and_hms(2024, 9, 7, 22, 0, 0).unwrap();
        assert_eq!(next_local_midnight(&now), Utc.with_ymd_and_hms(2024, 9, 8, 4, 0, 0).unwrap());
    }

    #[test]
    fn next_minute_rounds_up() {
        assert_eq!(next_minute(utc(10, 0, 0)), utc(10, 1, 0));
        assert_eq!(next_minute(utc(10, 0, 59)), utc(10, 1, 0));
        assert_eq!(next_minute(utc(23, 59, 30)), utc(0, 0, 0) + Duration::days(1));
    }
}
