//! Core error types for medrem-core.
//!
//! This module defines the error hierarchy using thiserror. Storage and
//! configuration failures propagate to the caller; unreadable persisted data
//! does not, see [`crate::storage::ReminderStore::load`].

use std::path::PathBuf;
use thiserror::Error;

use crate::reminder::Frequency;

/// Core error type for medrem-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// No reminder with the given id exists in the store.
    #[error("Reminder {0} not found")]
    NotFound(i64),

    /// The reminder exists but has no slot at the given index.
    #[error("Reminder {id} has no dose slot at index {index} (length: {len})")]
    SlotOutOfRange { id: i64, index: usize, len: usize },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the reminders file failed
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing the reminder collection failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The data directory could not be determined or created
    #[error("Failed to access data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors raised while building a reminder from a draft.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required free-text field is blank
    #[error("'{0}' must not be empty")]
    EmptyField(&'static str),

    /// A dose slot is missing its period or meal timing
    #[error("Dose slot {index} is missing {missing}")]
    IncompleteSlot { index: usize, missing: &'static str },

    /// Wrong number of dose slots for the frequency
    #[error("{frequency} needs {expected} dose slot(s), got {actual}")]
    SlotCount {
        frequency: Frequency,
        expected: usize,
        actual: usize,
    },

    /// End date lies before the start date
    #[error("Invalid date range: end date ({end}) is before start date ({start})")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = CoreError::NotFound(42);
        assert_eq!(err.to_string(), "Reminder 42 not found");
    }

    #[test]
    fn validation_converts_into_core_error() {
        let err: CoreError = ValidationError::EmptyField("medicine name").into();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(err.to_string().contains("medicine name"));
    }

    #[test]
    fn slot_count_mentions_frequency() {
        let err = ValidationError::SlotCount {
            frequency: Frequency::TwiceDaily,
            expected: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "Twice Daily needs 2 dose slot(s), got 1");
    }
}
