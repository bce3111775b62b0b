//! Error types for the Treeline tracker.
//!
//! This module defines the error types used throughout the tracker crate,
//! providing structured error handling with clear, human-readable messages.
//!
//! Lifecycle guard violations are returned synchronously to the caller.
//! Failures inside the emit path (a panicking subscriber) are never surfaced
//! here; they are isolated and logged so delivery to the remaining
//! subscribers continues.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during tracker operations.
///
/// This is the primary error type for the tracker crate, encompassing all
/// possible failure modes of the lifecycle and subscription APIs.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// `start()` was called while the tracker is running or paused.
    ///
    /// The tracker state is unchanged; a started tracker must be stopped and
    /// a fresh instance created before tracking again.
    #[error("cannot start an already started tracker")]
    AlreadyStarted,

    /// A lifecycle operation requiring a started tracker was called while
    /// the tracker is ready or stopped.
    #[error("cannot {operation} an unstarted tracker; call `start()` first")]
    NotStarted {
        /// The operation that was attempted (`pause`, `resume`, or `stop`).
        operation: &'static str,
    },

    /// A subscription could not be registered.
    ///
    /// Handlers themselves are always callable in Rust; this surfaces
    /// registration-time validation failures such as an empty topic name.
    #[error("invalid subscription: {0}")]
    InvalidHandler(String),

    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl TrackerError {
    pub(crate) fn not_started(operation: &'static str) -> Self {
        Self::NotStarted { operation }
    }
}

/// A specialized `Result` type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackingLevel;

    #[test]
    fn already_started_display() {
        let err = TrackerError::AlreadyStarted;
        assert_eq!(err.to_string(), "cannot start an already started tracker");
    }

    #[test]
    fn not_started_display_names_operation() {
        let err = TrackerError::not_started("pause");
        assert_eq!(
            err.to_string(),
            "cannot pause an unstarted tracker; call `start()` first"
        );
    }

    #[test]
    fn invalid_handler_display() {
        let err = TrackerError::InvalidHandler("empty topic".to_string());
        assert_eq!(err.to_string(), "invalid subscription: empty topic");
    }

    #[test]
    fn config_error_conversion() {
        let config_err = ConfigError::EmptyEvents {
            level: TrackingLevel::Marked,
        };
        let err: TrackerError = config_err.into();
        assert!(matches!(err, TrackerError::Config(_)));
        assert!(err.to_string().starts_with("configuration error:"));
    }

    #[test]
    fn error_source_chain() {
        use std::error::Error;

        let config_err = ConfigError::EmptyEvents {
            level: TrackingLevel::Interaction,
        };
        let err: TrackerError = config_err.into();
        assert!(err.source().is_some());
    }

    #[test]
    fn result_type_alias_works() {
        fn guarded() -> Result<()> {
            Err(TrackerError::AlreadyStarted)
        }
        assert!(guarded().is_err());
    }
}
