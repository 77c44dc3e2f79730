//! The reminder service: one object owning all scheduling state.
//!
//! Constructed once at process start and shared as [`SharedService`], so
//! settings changes, timer firings and user actions are serialized through a
//! single lock. Like the scheduler it wraps, the service has no thread of its
//! own. The caller sleeps until [`ReminderService::next_wakeup`] and then
//! calls [`ReminderService::fire_due_timers`] and
//! [`ReminderService::deliver_due`].
//!
//! Every method takes the wall-clock `now` explicitly and recomputes from it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::events::Event;
use crate::messages::MessagePool;
use crate::notification::{Action, NotificationRequest, NotificationSink};
use crate::scheduler::{PendingView, ReminderScheduler, Slot, SlotId};
use crate::status::{status, Status};
use crate::storage::Config;
use crate::timers::{next_minute, TimerId, TimerKind, Timers};

/// Process-wide handle to the service.
pub type SharedService<S> = Arc<Mutex<ReminderService<S>>>;

/// Wall-clock drift, in seconds, beyond which a wake-up counts as a clock jump.
pub const CLOCK_JUMP_TOLERANCE_SECS: i64 = 60;

/// `true` when `actual` is further than [`CLOCK_JUMP_TOLERANCE_SECS`] from the
/// instant the caller expected to wake at, in either direction.
pub fn clock_jumped(expected: DateTime<Utc>, actual: DateTime<Utc>) -> bool {
    (actual - expected).num_seconds().abs() > CLOCK_JUMP_TOLERANCE_SECS
}

pub struct ReminderService<S> {
    config: Config,
    scheduler: ReminderScheduler,
    timers: Timers,
    sink: S,
    /// Delivered reminders still waiting for a user action, so a snooze can
    /// carry their text over.
    delivered: HashMap<SlotId, Slot>,
    last_status: Option<String>,
    /// Local date of the last reschedule.
    scheduled_day: Option<NaiveDate>,
}

impl<S: NotificationSink> ReminderService<S> {
    pub fn new(config: Config, pool: MessagePool, sink: S) -> Self {
        Self {
            config,
            scheduler: ReminderScheduler::new(pool),
            timers: Timers::new(),
            sink,
            delivered: HashMap::new(),
            last_status: None,
            scheduled_day: None,
        }
    }

    pub fn into_shared(self) -> SharedService<S> {
        Arc::new(Mutex::new(self))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Identifiers delivered and not yet answered.
    pub fn awaiting_action(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.delivered.keys().map(SlotId::to_string).collect();
        ids.sort();
        ids
    }

    /// Descriptors for every pending slot, earliest first.
    pub fn pending_requests(&self) -> Vec<NotificationRequest> {
        self.scheduler
            .pending()
            .sorted()
            .into_iter()
            .map(NotificationRequest::for_slot)
            .collect()
    }

    pub fn status<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Status {
        status(&self.config.schedule, &self.scheduler, now)
    }

    /// Earliest instant anything needs doing: a timer deadline or a pending
    /// slot, including slots already overdue.
    pub fn next_wakeup(&self) -> Option<DateTime<Utc>> {
        let next_slot = self.scheduler.pending().sorted().first().map(|s| s.fire_at);
        match (self.timers.next_deadline(), next_slot) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Initial schedule at process start.
    pub fn start<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<Event> {
        tracing::info!(
            start = self.config.schedule.work_start_hour,
            end = self.config.schedule.work_end_hour,
            offset = self.config.schedule.reminder_offset_minutes,
            "reminder service starting"
        );
        self.reschedule(now)
    }

    /// Single entry point for settings changes, already debounced by the caller.
    ///
    /// A config with out-of-range values is ignored and the old one kept.
    pub fn on_config_changed<Tz: TimeZone>(&mut self, config: Config, now: &DateTime<Tz>) -> Vec<Event> {
        if let Err(e) = config.schedule.validate() {
            tracing::warn!(error = %e, "ignoring invalid configuration");
            return Vec::new();
        }
        if config.schedule == self.config.schedule {
            tracing::debug!("schedule settings unchanged; rescheduling anyway");
        }
        self.config = config;
        self.reschedule(now)
    }

    /// Handle a timer firing. Stale ids (re-armed or cancelled since) are no-ops.
    pub fn on_timer<Tz: TimeZone>(&mut self, id: TimerId, now: &DateTime<Tz>) -> Vec<Event> {
        let at = now.with_timezone(&Utc);
        match self.timers.fire(id) {
            None => {
                tracing::debug!(?id, "ignoring stale timer");
                Vec::new()
            }
            Some(TimerKind::DayBoundary) => {
                tracing::info!("day boundary reached");
                let mut events = vec![Event::TimerFired {
                    kind: TimerKind::DayBoundary,
                    at,
                }];
                events.extend(self.reschedule(now));
                events
            }
            Some(TimerKind::StatusRefresh) => {
                self.timers.arm(TimerKind::StatusRefresh, next_minute(at));
                self.refresh_status(now).into_iter().collect()
            }
        }
    }

    /// Fire every timer whose deadline has passed.
    pub fn fire_due_timers<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<Event> {
        let due = self.timers.due(now.with_timezone(&Utc));
        due.into_iter().flat_map(|id| self.on_timer(id, now)).collect()
    }

    /// Move due slots out of the pending set and hand them to the sink.
    pub fn deliver_due<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<Event> {
        let at = now.with_timezone(&Utc);
        let mut events = Vec::new();

        for slot in self.scheduler.take_due(at) {
            let identifier = slot.identifier();
            if !self.config.notifications.enabled {
                tracing::debug!(%identifier, "notifications disabled; dropping due reminder");
                continue;
            }

            let request = NotificationRequest::for_delivery(&slot);
            match self.sink.deliver(&request) {
                Ok(()) => {
                    tracing::info!(%identifier, "reminder delivered");
                    events.push(Event::ReminderDelivered {
                        identifier,
                        title: request.title,
                        body: request.body,
                        at,
                    });
                    self.delivered.insert(slot.id, slot);
                }
                Err(e) => {
                    tracing::warn!(%identifier, error = %e, "reminder delivery failed");
                    events.push(Event::DeliveryFailed {
                        identifier,
                        error: e.to_string(),
                        at,
                    });
                }
            }
        }

        if !events.is_empty() {
            events.extend(self.refresh_status(now));
        }
        events
    }

    /// Apply a user response to the notification `identifier`.
    ///
    /// Unknown identifiers are logged and ignored.
    pub fn handle_action<Tz: TimeZone>(
        &mut self,
        identifier: &str,
        action: Action,
        now: &DateTime<Tz>,
    ) -> Vec<Event> {
        let at = now.with_timezone(&Utc);
        let id = match identifier.parse::<SlotId>() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(%identifier, error = %e, "ignoring action for unknown notification");
                return Vec::new();
            }
        };

        let mut events = match action {
            Action::Snooze => {
                let original = self
                    .delivered
                    .remove(&id)
                    .or_else(|| self.scheduler.pending().get(&id).cloned());
                let Some(original) = original else {
                    tracing::warn!(%identifier, "nothing to snooze");
                    return Vec::new();
                };
                let snooze_id = self.scheduler.snooze(
                    &self.config.schedule,
                    &original.title,
                    &original.suggestion,
                    at,
                );
                let fire_at = at + self.config.schedule.snooze_duration();
                vec![Event::ReminderSnoozed {
                    original: identifier.to_string(),
                    identifier: snooze_id.to_string(),
                    fire_at,
                    at,
                }]
            }
            Action::DoItNow | Action::Dismiss => {
                let was_delivered = self.delivered.remove(&id).is_some();
                let was_pending = match action {
                    Action::DoItNow => self.scheduler.do_it_now(&id),
                    _ => self.scheduler.dismiss(&id),
                }
                .is_some();
                if !was_delivered && !was_pending {
                    tracing::debug!(%identifier, "acknowledged notification is already gone");
                    return Vec::new();
                }
                tracing::info!(%identifier, %action, "reminder acknowledged");
                vec![Event::ReminderAcknowledged {
                    identifier: identifier.to_string(),
                    action,
                    at,
                }]
            }
        };

        events.extend(self.refresh_status(now));
        events
    }

    /// Explicit reschedule after sleep/wake.
    ///
    /// Waking on a later local day rolls the day over even though the
    /// day-boundary timer was never reached.
    pub fn on_wake<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<Event> {
        tracing::info!("wake: recomputing schedule");
        self.reschedule(now)
    }

    /// The wall clock moved away from where the caller expected to wake.
    pub fn on_clock_jump<Tz: TimeZone>(&mut self, expected: DateTime<Utc>, now: &DateTime<Tz>) -> Vec<Event> {
        let actual = now.with_timezone(&Utc);
        tracing::warn!(%expected, %actual, "clock jump detected");
        let mut events = vec![Event::ClockJumped { expected, actual }];
        events.extend(self.on_wake(now));
        events
    }

    /// Clear everything on process exit.
    pub fn shutdown<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<Event> {
        let removed = self.scheduler.clear_all();
        self.timers.cancel_all();
        self.delivered.clear();
        tracing::info!(removed, "reminder service shut down");
        vec![Event::PendingCleared {
            removed,
            at: now.with_timezone(&Utc),
        }]
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Every reschedule goes through here. The first one on a new local day
    /// rolls the day over first.
    fn reschedule<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<Event> {
        let at = now.with_timezone(&Utc);
        let mut events = Vec::new();
        if self.scheduled_day.is_some_and(|day| day != now.date_naive()) {
            events.extend(self.roll_over_day(now));
        }

        let outcome = self.scheduler.reschedule(&self.config.schedule, now);
        self.scheduled_day = Some(now.date_naive());

        self.timers.arm(TimerKind::DayBoundary, outcome.next_reschedule);
        self.timers.arm(TimerKind::StatusRefresh, next_minute(at));

        events.push(Event::RemindersScheduled {
            hourly: outcome.hourly,
            snoozed: self.scheduler.pending().snoozed().len(),
            next_reschedule: Some(outcome.next_reschedule),
            at,
        });
        events.extend(self.refresh_status(now));
        events
    }

    /// Forget unanswered notifications and drop snoozes from earlier days.
    fn roll_over_day<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Option<Event> {
        tracing::info!(day = %now.date_naive(), "starting a new day");
        self.delivered.clear();
        let removed = self.scheduler.drop_stale_snoozes(now);
        (removed > 0).then(|| Event::PendingCleared {
            removed,
            at: now.with_timezone(&Utc),
        })
    }

    fn refresh_status<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Option<Event> {
        let text = self.status(now).to_string();
        if self.last_status.as_deref() == Some(text.as_str()) {
            return None;
        }
        tracing::debug!(status = %text, next = ?self.scheduler.next_fire_instant(now.with_timezone(&Utc)), "status changed");
        self.last_status = Some(text.clone());
        Some(Event::StatusRefreshed {
            status: text,
            at: now.with_timezone(&Utc),
        })
    }
}
