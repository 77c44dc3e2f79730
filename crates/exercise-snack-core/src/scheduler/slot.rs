//! Reminder slots and their notification identifiers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParseError;
use crate::messages::Suggestion;

const PREFIX: &str = "reminder-";
const SNOOZE_PREFIX: &str = "reminder-snooze-";

/// Identity of a slot, rendered as its notification identifier.
///
/// `reminder-<hour>` for hourly slots, `reminder-snooze-<uuid>` for snoozes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SlotId {
    Hourly(u32),
    Snooze(Uuid),
}

impl SlotId {
    pub fn is_snooze(&self) -> bool {
        matches!(self, SlotId::Snooze(_))
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotId::Hourly(hour) => write!(f, "{PREFIX}{hour}"),
            SlotId::Snooze(token) => write!(f, "{SNOOZE_PREFIX}{token}"),
        }
    }
}

impl FromStr for SlotId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(token) = s.strip_prefix(SNOOZE_PREFIX) {
            return Uuid::parse_str(token)
                .map(SlotId::Snooze)
                .map_err(|e| ParseError::InvalidSnoozeToken {
                    identifier: s.to_string(),
                    message: e.to_string(),
                });
        }
        match s.strip_prefix(PREFIX).map(str::parse::<u32>) {
            Some(Ok(hour)) if hour < 24 => Ok(SlotId::Hourly(hour)),
            _ => Err(ParseError::UnknownIdentifier(s.to_string())),
        }
    }
}

/// A single scheduled reminder occurrence, hourly or snooze-derived.
///
/// Immutable once created; reschedules replace slots wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub fire_at: DateTime<Utc>,
    pub title: String,
    pub suggestion: Suggestion,
}

impl Slot {
    /// Hourly slot for the top-of-hour `hour` it represents.
    pub fn hourly(hour: u32, fire_at: DateTime<Utc>, title: String, suggestion: Suggestion) -> Self {
        Self {
            id: SlotId::Hourly(hour),
            fire_at,
            title,
            suggestion,
        }
    }

    /// Snooze slot with a fresh token.
    pub fn snooze(fire_at: DateTime<Utc>, title: String, suggestion: Suggestion) -> Self {
        Self {
            id: SlotId::Snooze(Uuid::new_v4()),
            fire_at,
            title,
            suggestion,
        }
    }

    pub fn hour_label(&self) -> Option<u32> {
        match self.id {
            SlotId::Hourly(hour) => Some(hour),
            SlotId::Snooze(_) => None,
        }
    }

    pub fn identifier(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hourly_identifier_format() {
        assert_eq!(SlotId::Hourly(14).to_string(), "reminder-14");
        assert_eq!("reminder-14".parse::<SlotId>().unwrap(), SlotId::Hourly(14));
    }

    #[test]
    fn snooze_identifier_parses_back() {
        let id = SlotId::Snooze(Uuid::new_v4());
        let text = id.to_string();
        assert!(text.starts_with("reminder-snooze-"));
        assert_eq!(text.parse::<SlotId>().unwrap(), id);
        assert!(id.is_snooze());
    }

    #[test]
    fn rejects_foreign_identifiers() {
        assert_eq!(
            "reminder-24".parse::<SlotId>(),
            Err(ParseError::UnknownIdentifier("reminder-24".into()))
        );
        assert!(matches!(
            "reminder-snooze-nope".parse::<SlotId>(),
            Err(ParseError::InvalidSnoozeToken { .. })
        ));
        assert!("exercise-9".parse::<SlotId>().is_err());
        assert!("reminder-".parse::<SlotId>().is_err());
    }
}
