//! Drives a shared reminder service through a simulated working day.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use exercise_snack_core::{
    Action, Config, Event, MessagePool, RecordingSink, ReminderService, ScheduleConfig,
    SchedulerState, TimerKind,
};

fn tz() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap()
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    tz().with_ymd_and_hms(2024, 5, day, hour, minute, 0).unwrap()
}

fn config() -> Config {
    Config {
        schedule: ScheduleConfig {
            reminder_offset_minutes: 5,
            snooze_duration_minutes: 15,
            ..ScheduleConfig::hours(9, 12)
        },
        ..Config::default()
    }
}

/// Step the clock minute by minute, the way the daemon loop would wake.
fn run_until(
    svc: &mut ReminderService<RecordingSink>,
    from: DateTime<FixedOffset>,
    to: DateTime<FixedOffset>,
) -> Vec<Event> {
    let mut events = Vec::new();
    let mut now = from;
    while now <= to {
        events.extend(svc.fire_due_timers(&now));
        events.extend(svc.deliver_due(&now));
        now += Duration::minutes(1);
    }
    events
}

fn delivered_ids(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::ReminderDelivered { identifier, .. } => Some(identifier.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn full_day_with_snooze_and_rollover() {
    let shared = ReminderService::new(
        config(),
        MessagePool::with_default_catalog(Some(21)),
        RecordingSink::new(),
    )
    .into_shared();
    let mut svc = shared.lock().unwrap();

    svc.start(&at(6, 8, 0));
    assert_eq!(svc.scheduler().state(), SchedulerState::Scheduled);
    assert_eq!(svc.status(&at(6, 8, 0)).to_string(), "Outside working hours");
    assert_eq!(svc.status(&at(6, 9, 0)).to_string(), "Next reminder: 09:55");

    let morning = run_until(&mut svc, at(6, 8, 0), at(6, 10, 0));
    assert_eq!(delivered_ids(&morning), vec!["reminder-10"]);

    let snoozed = svc.handle_action("reminder-10", Action::Snooze, &at(6, 10, 0));
    let snooze_id = match &snoozed[0] {
        Event::ReminderSnoozed { identifier, fire_at, .. } => {
            assert_eq!(*fire_at, at(6, 10, 15).with_timezone(&Utc));
            identifier.clone()
        }
        other => panic!("unexpected event {other:?}"),
    };
    assert_eq!(svc.status(&at(6, 10, 1)).to_string(), "Next reminder: 10:15");

    let midday = run_until(&mut svc, at(6, 10, 1), at(6, 12, 0));
    assert_eq!(
        delivered_ids(&midday),
        vec![snooze_id.clone(), "reminder-11".into(), "reminder-12".into()]
    );
    assert_eq!(svc.scheduler().state(), SchedulerState::Idle);
    assert_eq!(svc.status(&at(6, 11, 59)).to_string(), "No more reminders today");

    svc.handle_action(&snooze_id, Action::DoItNow, &at(6, 12, 1));
    svc.handle_action("reminder-11", Action::Dismiss, &at(6, 12, 1));
    assert_eq!(svc.awaiting_action(), vec!["reminder-12".to_string()]);

    let overnight = run_until(&mut svc, at(6, 12, 1), at(7, 0, 0));
    assert!(overnight.iter().any(|e| matches!(
        e,
        Event::TimerFired { kind: TimerKind::DayBoundary, .. }
    )));
    assert!(svc.awaiting_action().is_empty());
    assert_eq!(svc.pending_requests().len(), 3);
    assert_eq!(svc.status(&at(7, 9, 30)).to_string(), "Next reminder: 09:55");
    assert_eq!(svc.sink().delivered().len(), 4);
}

#[test]
fn shutdown_then_restart_rebuilds_schedule() {
    let mut svc = ReminderService::new(
        config(),
        MessagePool::with_default_catalog(Some(4)),
        RecordingSink::new(),
    );
    svc.start(&at(6, 9, 0));
    svc.handle_action("reminder-11", Action::Snooze, &at(6, 9, 0));
    assert_eq!(svc.pending_requests().len(), 4);

    svc.shutdown(&at(6, 9, 1));
    assert!(svc.pending_requests().is_empty());
    assert_eq!(svc.next_wakeup(), None);

    svc.start(&at(6, 10, 30));
    assert_eq!(svc.pending_requests().len(), 2);
}
