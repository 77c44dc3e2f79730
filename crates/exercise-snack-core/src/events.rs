use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notification::Action;
use crate::timers::TimerKind;

/// Every state change of the reminder service produces an Event.
/// The shell logs them or streams them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Hourly slots were recomputed.
    RemindersScheduled {
        hourly: usize,
        snoozed: usize,
        next_reschedule: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
    /// A due slot was handed to the sink.
    ReminderDelivered {
        identifier: String,
        title: String,
        body: String,
        at: DateTime<Utc>,
    },
    /// The sink refused a due slot. The slot is gone from the pending set anyway.
    DeliveryFailed {
        identifier: String,
        error: String,
        at: DateTime<Utc>,
    },
    ReminderSnoozed {
        original: String,
        identifier: String,
        fire_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// "Do it now" or a plain dismiss.
    ReminderAcknowledged {
        identifier: String,
        action: Action,
        at: DateTime<Utc>,
    },
    PendingCleared {
        removed: usize,
        at: DateTime<Utc>,
    },
    StatusRefreshed {
        status: String,
        at: DateTime<Utc>,
    },
    /// A timer came due.
    TimerFired {
        kind: TimerKind,
        at: DateTime<Utc>,
    },
    /// Wall clock moved further than the loop slept (sleep/wake, manual change).
    ClockJumped {
        expected: DateTime<Utc>,
        actual: DateTime<Utc>,
    },
}
