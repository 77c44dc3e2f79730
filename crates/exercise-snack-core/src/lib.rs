//! # Exercise Snack Core Library
//!
//! Scheduling engine behind the Exercise Snack movement-break reminders.
//! During working hours it plans one reminder per hour, keeps track of
//! snoozes, and reports when the next one is due. Menu rendering and
//! notification display stay outside; the shell hands in configuration and
//! the wall clock, and receives notification descriptors and a status line.
//!
//! ## Architecture
//!
//! - **Messages**: randomised suggestion rotation without back-to-back repeats
//! - **Schedule**: pure computation of today's remaining hourly slots
//! - **Scheduler**: the pending set (hourly slots plus snoozes)
//! - **Status**: "Next reminder: HH:MM" and friends
//! - **Timers**: invalidatable one-shot deadlines for midnight and minute ticks
//! - **Service**: the single owner wiring all of the above to a notification sink
//!
//! ## Key Components
//!
//! - [`ReminderService`]: process-wide service object
//! - [`ReminderScheduler`]: pending-set state machine
//! - [`MessagePool`]: suggestion rotation
//! - [`Config`]: TOML configuration management

pub mod error;
pub mod events;
pub mod messages;
pub mod notification;
pub mod schedule;
pub mod scheduler;
pub mod service;
pub mod status;
pub mod storage;
pub mod timers;

pub use error::{ConfigError, ParseError, SinkError, ValidationError};
pub use events::Event;
pub use messages::{MessagePool, Suggestion};
pub use notification::{Action, NotificationRequest, NotificationSink, RecordingSink, Trigger};
pub use schedule::compute_slots;
pub use scheduler::{PendingView, ReminderScheduler, Rescheduled, SchedulerState, Slot, SlotId};
pub use service::{clock_jumped, ReminderService, SharedService};
pub use status::{status, Status};
pub use storage::{Config, ScheduleConfig};
pub use timers::{TimerId, TimerKind, Timers};
