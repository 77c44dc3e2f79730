//! Hourly slot computation for the current day.
//!
//! Pure apart from the message pool draw: given the working-hour window, the
//! reminder offset and "now", produce the remaining reminders for today.
//!
//! Hours run over `(work_start_hour, work_end_hour]`. The first working hour
//! itself is skipped: a reminder at `H:00` means "you have worked through
//! hour H-1, time to move", so nothing fires the moment work starts.

use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::messages::MessagePool;
use crate::scheduler::Slot;
use crate::storage::ScheduleConfig;

/// Hours a reminder is considered for, before the "still in the future" filter.
///
/// Empty when the window is inactive.
pub fn candidate_hours(config: &ScheduleConfig) -> RangeInclusive<u32> {
    if config.is_active() {
        (config.work_start_hour + 1)..=config.work_end_hour
    } else {
        // An empty inclusive range.
        1..=0
    }
}

/// `date` at `hour:00:00` in `tz`.
///
/// Ambiguous local times resolve to the earlier instant; times skipped by a
/// DST jump yield `None`.
pub fn local_top_of_hour<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u32) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(hour, 0, 0)?;
    tz.from_local_datetime(&naive).earliest()
}

/// Today's remaining hourly slots, ordered by fire instant.
///
/// A slot fires `reminder_offset_minutes` before its hour and is kept only if
/// that instant is strictly after `now`. Messages are drawn from `pool` once
/// for the kept slots, in hour order.
pub fn compute_slots<Tz: TimeZone>(
    config: &ScheduleConfig,
    now: &DateTime<Tz>,
    pool: &mut MessagePool,
) -> Vec<Slot> {
    let tz = now.timezone();
    let today = now.date_naive();
    let now_utc = now.with_timezone(&Utc);

    let kept: Vec<(u32, DateTime<Utc>)> = candidate_hours(config)
        .filter_map(|hour| {
            let base = local_top_of_hour(&tz, today, hour)?;
            let fire_at = base.with_timezone(&Utc) - config.offset();
            (fire_at > now_utc).then_some((hour, fire_at))
        })
        .collect();

    if kept.is_empty() {
        return Vec::new();
    }

    let suggestions = pool.pick(kept.len(), today);
    kept.into_iter()
        .zip(suggestions)
        .map(|((hour, fire_at), suggestion)| {
            Slot::hourly(hour, fire_at, pool.pick_title().to_string(), suggestion)
        })
        .collect()
}
