//! Core error types for exercise-snack-core.
//!
//! Scheduling itself is total: an inverted working-hour window is not an
//! error, it simply yields an empty day. The variants here cover the edges
//! around the scheduler (configuration files, notification delivery, parsing
//! identifiers and actions coming back from the shell) and the single setup
//! failure of building a message pool with no messages.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Could not resolve the configuration directory
    #[error("Could not resolve configuration directory: {0}")]
    NoDataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),
}

/// Errors reported by a [`NotificationSink`](crate::notification::NotificationSink).
///
/// Delivery is fire-and-forget from the scheduler's point of view, so these
/// are logged by the caller and never undo a scheduler mutation.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The platform refused to show notifications.
    #[error("Notification permission denied")]
    PermissionDenied,

    /// Delivery failed for some other reason.
    #[error("Failed to deliver '{identifier}': {message}")]
    DeliveryFailed { identifier: String, message: String },
}

/// Text from the shell that does not name a reminder or an action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("not a reminder identifier: '{0}'")]
    UnknownIdentifier(String),

    #[error("invalid snooze identifier '{identifier}': {message}")]
    InvalidSnoozeToken { identifier: String, message: String },

    #[error("unknown action: {0}")]
    UnknownAction(String),
}
