//! Reminder scheduler: owner of the pending set.
//!
//! ## State Transitions
//!
//! ```text
//! Idle <-> Scheduled
//! ```
//!
//! The scheduler is `Scheduled` while at least one slot is pending. Every
//! transition comes from an explicit call (`reschedule`, `snooze`,
//! `do_it_now`/`dismiss`, `take_due`, `clear_all`); time alone never mutates
//! it. The owner drives the midnight reschedule from
//! [`ReminderScheduler::next_reschedule`].
//!
//! ## Reschedule and snoozes
//!
//! A reschedule replaces every hourly slot but keeps outstanding snoozes,
//! unless `clear_snoozes_on_reschedule` is set. Snoozes left over from an
//! earlier local day are removed with [`ReminderScheduler::drop_stale_snoozes`]
//! when the owner rolls over to a new day. Only [`ReminderScheduler::clear_all`]
//! always empties the whole set.

mod slot;

pub use slot::{Slot, SlotId};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::messages::{MessagePool, Suggestion};
use crate::schedule::compute_slots;
use crate::storage::ScheduleConfig;
use crate::timers::next_local_midnight;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Scheduled,
}

/// Outcome of [`ReminderScheduler::reschedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rescheduled {
    /// Hourly slots now pending.
    pub hourly: usize,
    /// Next local midnight, when the owner should reschedule again.
    pub next_reschedule: DateTime<Utc>,
}

/// Read access to "what fires next", shared by the scheduler and its parts.
pub trait PendingView {
    /// Earliest fire instant strictly after `now`.
    fn next_fire_instant(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>>;
}

/// Slots that have not fired or been resolved yet.
///
/// Holds at most one slot per hour; hourly slots are kept sorted.
#[derive(Debug, Clone, Default)]
pub struct PendingSet {
    hourly: Vec<Slot>,
    snoozed: Vec<Slot>,
}

impl PendingSet {
    pub fn len(&self) -> usize {
        self.hourly.len() + self.snoozed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hourly.is_empty() && self.snoozed.is_empty()
    }

    pub fn hourly(&self) -> &[Slot] {
        &self.hourly
    }

    pub fn snoozed(&self) -> &[Slot] {
        &self.snoozed
    }

    /// All slots ordered by fire instant.
    pub fn sorted(&self) -> Vec<&Slot> {
        let mut all: Vec<&Slot> = self.hourly.iter().chain(&self.snoozed).collect();
        all.sort_by_key(|s| s.fire_at);
        all
    }

    pub fn get(&self, id: &SlotId) -> Option<&Slot> {
        self.hourly
            .iter()
            .chain(&self.snoozed)
            .find(|s| &s.id == id)
    }

    fn replace_hourly(&mut self, mut slots: Vec<Slot>) {
        slots.sort_by_key(|s| s.fire_at);
        self.hourly = slots;
    }

    fn insert_snooze(&mut self, slot: Slot) {
        self.snoozed.push(slot);
    }

    fn remove(&mut self, id: &SlotId) -> Option<Slot> {
        let bucket = if id.is_snooze() {
            &mut self.snoozed
        } else {
            &mut self.hourly
        };
        let pos = bucket.iter().position(|s| &s.id == id)?;
        Some(bucket.remove(pos))
    }

    fn clear_snoozes(&mut self) -> usize {
        std::mem::take(&mut self.snoozed).len()
    }

    /// Keep only snoozes for which `keep` holds. Returns how many were removed.
    fn retain_snoozes(&mut self, keep: impl Fn(&Slot) -> bool) -> usize {
        let before = self.snoozed.len();
        self.snoozed.retain(|s| keep(s));
        before - self.snoozed.len()
    }

    fn clear(&mut self) -> usize {
        let removed = self.len();
        self.hourly.clear();
        self.snoozed.clear();
        removed
    }

    fn take_due(&mut self, now: DateTime<Utc>) -> Vec<Slot> {
        let mut due = Vec::new();
        for bucket in [&mut self.hourly, &mut self.snoozed] {
            let (fired, waiting): (Vec<Slot>, Vec<Slot>) =
                std::mem::take(bucket).into_iter().partition(|s| s.fire_at <= now);
            *bucket = waiting;
            due.extend(fired);
        }
        due.sort_by_key(|s| s.fire_at);
        due
    }
}

impl PendingView for PendingSet {
    fn next_fire_instant(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.hourly
            .iter()
            .chain(&self.snoozed)
            .map(|s| s.fire_at)
            .filter(|at| *at > now)
            .min()
    }
}

/// Stateful orchestrator over [`compute_slots`] and the pending set.
#[derive(Debug)]
pub struct ReminderScheduler {
    pool: MessagePool,
    pending: PendingSet,
    next_reschedule: Option<DateTime<Utc>>,
}

impl ReminderScheduler {
    pub fn new(pool: MessagePool) -> Self {
        Self {
            pool,
            pending: PendingSet::default(),
            next_reschedule: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SchedulerState {
        if self.pending.is_empty() {
            SchedulerState::Idle
        } else {
            SchedulerState::Scheduled
        }
    }

    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    /// When the owner should call [`reschedule`](Self::reschedule) again.
    pub fn next_reschedule(&self) -> Option<DateTime<Utc>> {
        self.next_reschedule
    }

    pub fn pool(&self) -> &MessagePool {
        &self.pool
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace today's hourly slots from `config` as seen at `now`.
    ///
    /// Snoozes survive unless the config asks for them to be cleared.
    pub fn reschedule<Tz: TimeZone>(
        &mut self,
        config: &ScheduleConfig,
        now: &DateTime<Tz>,
    ) -> Rescheduled {
        if config.clear_snoozes_on_reschedule {
            let dropped = self.pending.clear_snoozes();
            if dropped > 0 {
                tracing::debug!(dropped, "cleared snoozes on reschedule");
            }
        }

        let slots = compute_slots(config, now, &mut self.pool);
        let hourly = slots.len();
        self.pending.replace_hourly(slots);
        let next_reschedule = next_local_midnight(now);
        self.next_reschedule = Some(next_reschedule);

        tracing::info!(
            hourly,
            snoozed = self.pending.snoozed().len(),
            %next_reschedule,
            "reminders rescheduled"
        );
        Rescheduled {
            hourly,
            next_reschedule,
        }
    }

    /// Remove snoozes whose fire instant falls on a local date before `now`'s.
    ///
    /// A snooze taken late in the evening that fires after midnight is kept.
    pub fn drop_stale_snoozes<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> usize {
        let tz = now.timezone();
        let today: NaiveDate = now.date_naive();
        let dropped = self
            .pending
            .retain_snoozes(|s| s.fire_at.with_timezone(&tz).date_naive() >= today);
        if dropped > 0 {
            tracing::info!(dropped, "dropped snoozes from an earlier day");
        }
        dropped
    }

    /// Add a snooze of `suggestion` firing `snooze_duration_minutes` after `now`.
    ///
    /// Hourly slots are untouched. Returns the new slot's id.
    pub fn snooze(
        &mut self,
        config: &ScheduleConfig,
        title: &str,
        suggestion: &Suggestion,
        now: DateTime<Utc>,
    ) -> SlotId {
        let slot = Slot::snooze(
            now + config.snooze_duration(),
            title.to_string(),
            suggestion.clone(),
        );
        let id = slot.id;
        tracing::info!(id = %id, fire_at = %slot.fire_at, "reminder snoozed");
        self.pending.insert_snooze(slot);
        id
    }

    /// Acknowledge a slot with "Do it now". Fire-and-forget: the slot is dropped.
    pub fn do_it_now(&mut self, id: &SlotId) -> Option<Slot> {
        self.pending.remove(id)
    }

    /// Dismiss a slot without follow-up.
    pub fn dismiss(&mut self, id: &SlotId) -> Option<Slot> {
        self.pending.remove(id)
    }

    /// Remove and return every slot due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<Slot> {
        self.pending.take_due(now)
    }

    /// Empty the pending set. Returns how many slots were dropped.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.pending.clear();
        tracing::info!(removed, "pending reminders cleared");
        removed
    }
}

impl PendingView for ReminderScheduler {
    fn next_fire_instant(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.pending.next_fire_instant(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        tz().with_ymd_and_hms(2024, 3, 4, hour, minute, 0).unwrap()
    }

    fn scheduler() -> ReminderScheduler {
        ReminderScheduler::new(MessagePool::with_default_catalog(Some(3)))
    }

    fn config() -> ScheduleConfig {
        ScheduleConfig::hours(9, 17)
    }

    fn hours(s: &ReminderScheduler) -> Vec<u32> {
        s.pending().hourly().iter().filter_map(Slot::hour_label).collect()
    }

    #[test]
    fn starts_idle() {
        let s = scheduler();
        assert_eq!(s.state(), SchedulerState::Idle);
        assert_eq!(s.next_fire_instant(Utc::now()), None);
        assert_eq!(s.next_reschedule(), None);
    }

    #[test]
    fn reschedule_fills_pending_and_arms_midnight() {
        let mut s = scheduler();
        let now = at(10, 5);
        let outcome = s.reschedule(&config(), &now);
        assert_eq!(outcome.hourly, 7);
        assert_eq!(s.state(), SchedulerState::Scheduled);
        assert_eq!(hours(&s), vec![11, 12, 13, 14, 15, 16, 17]);
        let midnight = tz().with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(outcome.next_reschedule, midnight.with_timezone(&Utc));
        assert_eq!(s.next_reschedule(), Some(midnight.with_timezone(&Utc)));
    }

    #[test]
    fn reschedule_is_idempotent_for_hours() {
        let mut s = scheduler();
        s.reschedule(&config(), &at(8, 0));
        let first = hours(&s);
        s.reschedule(&config(), &at(8, 0));
        assert_eq!(hours(&s), first);
        assert_eq!(s.pending().len(), 8);
    }

    #[test]
    fn reschedule_with_same_pool_state_is_deterministic() {
        let mut a = scheduler();
        let mut b = scheduler();
        a.reschedule(&config(), &at(8, 0));
        b.reschedule(&config(), &at(8, 0));
        assert_eq!(a.pending().hourly(), b.pending().hourly());
    }

    #[test]
    fn inverted_config_goes_idle() {
        let mut s = scheduler();
        s.reschedule(&config(), &at(8, 0));
        assert_eq!(s.reschedule(&ScheduleConfig::hours(17, 9), &at(8, 0)).hourly, 0);
        assert_eq!(s.state(), SchedulerState::Idle);
    }

    #[test]
    fn snooze_fires_after_snooze_duration() {
        let mut s = scheduler();
        let now = at(10, 5);
        s.reschedule(&config(), &now);
        let hourly_before = s.pending().hourly().to_vec();

        let original = s.pending().hourly()[0].clone();
        let id = s.snooze(&config(), &original.title, &original.suggestion, now.with_timezone(&Utc));

        let snoozed = s.pending().get(&id).unwrap();
        assert_eq!(snoozed.fire_at, at(10, 15).with_timezone(&Utc));
        assert_eq!(snoozed.suggestion, original.suggestion);
        assert_eq!(snoozed.title, original.title);
        assert_eq!(s.pending().hourly(), hourly_before.as_slice());
        assert_eq!(s.next_fire_instant(now.with_timezone(&Utc)), Some(snoozed.fire_at));
    }

    #[test]
    fn snoozes_survive_plain_reschedule() {
        let mut s = scheduler();
        let now = at(10, 5);
        s.reschedule(&config(), &now);
        let original = s.pending().hourly()[0].clone();
        let id = s.snooze(&config(), &original.title, &original.suggestion, now.with_timezone(&Utc));

        s.reschedule(&config(), &at(10, 6));
        assert!(s.pending().get(&id).is_some());
    }

    #[test]
    fn snoozes_can_be_dropped_on_reschedule() {
        let mut s = scheduler();
        let now = at(10, 5);
        let cfg = ScheduleConfig {
            clear_snoozes_on_reschedule: true,
            ..config()
        };
        s.reschedule(&cfg, &now);
        let original = s.pending().hourly()[0].clone();
        let id = s.snooze(&cfg, &original.title, &original.suggestion, now.with_timezone(&Utc));

        s.reschedule(&cfg, &at(10, 6));
        assert!(s.pending().get(&id).is_none());
        assert!(s.pending().snoozed().is_empty());
    }

    #[test]
    fn stale_snoozes_are_the_ones_from_earlier_days() {
        let mut s = scheduler();
        let suggestion = Suggestion::new("10 squats", "Do 10 squats");
        s.snooze(&config(), "Break time!", &suggestion, at(10, 0).with_timezone(&Utc));
        let after_midnight = s.snooze(&config(), "Break time!", &suggestion, at(23, 55).with_timezone(&Utc));

        let midnight = tz().with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(s.drop_stale_snoozes(&midnight), 1);
        let kept: Vec<SlotId> = s.pending().snoozed().iter().map(|slot| slot.id).collect();
        assert_eq!(kept, vec![after_midnight]);
        assert_eq!(s.drop_stale_snoozes(&midnight), 0);
    }

    #[test]
    fn clear_all_drops_snoozes_too() {
        let mut s = scheduler();
        let now = at(10, 5);
        s.reschedule(&config(), &now);
        let original = s.pending().hourly()[0].clone();
        s.snooze(&config(), &original.title, &original.suggestion, now.with_timezone(&Utc));

        assert_eq!(s.clear_all(), 8);
        assert_eq!(s.state(), SchedulerState::Idle);
    }

    #[test]
    fn do_it_now_and_dismiss_remove_the_slot() {
        let mut s = scheduler();
        s.reschedule(&config(), &at(10, 5));
        assert!(s.do_it_now(&SlotId::Hourly(11)).is_some());
        assert!(s.dismiss(&SlotId::Hourly(12)).is_some());
        assert!(s.dismiss(&SlotId::Hourly(12)).is_none());
        assert_eq!(hours(&s), vec![13, 14, 15, 16, 17]);
    }

    #[test]
    fn next_fire_instant_is_strictly_after_now() {
        let mut s = scheduler();
        s.reschedule(&config(), &at(10, 0));
        assert_eq!(
            s.next_fire_instant(at(10, 0).with_timezone(&Utc)),
            Some(at(11, 0).with_timezone(&Utc))
        );
        assert_eq!(
            s.next_fire_instant(at(11, 0).with_timezone(&Utc)),
            Some(at(12, 0).with_timezone(&Utc))
        );
        assert_eq!(s.next_fire_instant(at(17, 0).with_timezone(&Utc)), None);
    }

    #[test]
    fn take_due_moves_slots_out_in_order() {
        let mut s = scheduler();
        let now = at(10, 55);
        s.reschedule(&config(), &now);
        let original = s.pending().hourly()[0].clone();
        let id = s.snooze(&config(), &original.title, &original.suggestion, now.with_timezone(&Utc));

        let due = s.take_due(at(11, 5).with_timezone(&Utc) + Duration::seconds(1));
        let ids: Vec<SlotId> = due.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![SlotId::Hourly(11), id]);
    }
}
