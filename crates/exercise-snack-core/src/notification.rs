//! Notification descriptors and the delivery seam.
//!
//! The core never talks to a platform notification center. It produces
//! [`NotificationRequest`]s: timed ones for the pending schedule, and
//! immediate ones for the slots it hands to a [`NotificationSink`] as they
//! come due.
//! Delivery is fire-and-forget: a failing sink is logged by the caller and
//! never rolls back the pending set.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, SinkError};
use crate::scheduler::Slot;

pub const CATEGORY: &str = "EXERCISE_SNACK";

/// Response to a delivered notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    DoItNow,
    Snooze,
    /// Body tapped or notification dismissed; no follow-up.
    Dismiss,
}

impl Action {
    /// Buttons offered on every reminder.
    pub const BUTTONS: [Action; 2] = [Action::DoItNow, Action::Snooze];

    pub fn identifier(&self) -> &'static str {
        match self {
            Action::DoItNow => "DO_IT_NOW",
            Action::Snooze => "SNOOZE",
            Action::Dismiss => "DISMISS",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Action::DoItNow => "Do it now",
            Action::Snooze => "Snooze",
            Action::Dismiss => "Dismiss",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for Action {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "do_it_now" | "done" | "do" => Ok(Action::DoItNow),
            "snooze" => Ok(Action::Snooze),
            "dismiss" | "default" => Ok(Action::Dismiss),
            other => Err(ParseError::UnknownAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "at", rename_all = "snake_case")]
pub enum Trigger {
    At(DateTime<Utc>),
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionButton {
    pub identifier: String,
    pub title: String,
}

/// Platform-neutral description of one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub identifier: String,
    pub title: String,
    pub body: String,
    pub trigger: Trigger,
    pub category: String,
    pub actions: Vec<ActionButton>,
}

impl NotificationRequest {
    /// Descriptor firing at the slot's instant.
    pub fn for_slot(slot: &Slot) -> Self {
        Self::build(
            slot.identifier(),
            slot.title.clone(),
            slot.suggestion.message.clone(),
            Trigger::At(slot.fire_at),
        )
    }

    /// Descriptor for a slot that is due now, handed straight to a sink.
    pub fn for_delivery(slot: &Slot) -> Self {
        Self::immediate(slot.identifier(), slot.title.clone(), slot.suggestion.message.clone())
    }

    /// Descriptor shown right away.
    pub fn immediate(identifier: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::build(identifier.into(), title.into(), body.into(), Trigger::Immediate)
    }

    fn build(identifier: String, title: String, body: String, trigger: Trigger) -> Self {
        Self {
            identifier,
            title,
            body,
            trigger,
            category: CATEGORY.to_string(),
            actions: Action::BUTTONS
                .iter()
                .map(|a| ActionButton {
                    identifier: a.identifier().to_string(),
                    title: a.title().to_string(),
                })
                .collect(),
        }
    }
}

/// Delivery collaborator.
pub trait NotificationSink: Send {
    /// Show `request` to the user.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the platform refused or failed to show it.
    fn deliver(&mut self, request: &NotificationRequest) -> Result<(), SinkError>;
}

/// In-memory sink that keeps every delivered request.
#[derive(Debug, Default)]
pub struct RecordingSink {
    delivered: Vec<NotificationRequest>,
    deny: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that behaves as if notification permission was refused.
    pub fn denying() -> Self {
        Self {
            delivered: Vec::new(),
            deny: true,
        }
    }

    pub fn delivered(&self) -> &[NotificationRequest] {
        &self.delivered
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&mut self, request: &NotificationRequest) -> Result<(), SinkError> {
        if self.deny {
            return Err(SinkError::PermissionDenied);
        }
        self.delivered.push(request.clone());
        Ok(())
    }
}
