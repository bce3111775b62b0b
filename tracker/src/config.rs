//! Configuration for the Treeline tracker.
//!
//! A [`TrackerConfig`] is resolved once at construction and stays immutable
//! for the tracker's lifetime. The tracking level decides what gets wired to
//! the tree adapter:
//!
//! | Level | Wiring |
//! |-------|--------|
//! | `Mutation` | activity signal + recursive change observer |
//! | `Interaction` | one capture listener per configured event type |
//! | `Marked` | same as `Interaction`, but only marked targets emit |
//!
//! # Example
//!
//! ```
//! use treeline_tracker::config::{TrackerConfig, TrackingLevel};
//!
//! let config = TrackerConfig::new(TrackingLevel::Interaction)
//!     .with_identifier("checkout-funnel")
//!     .with_events(["click", "submit"]);
//!
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Event types wired by default when none are configured.
///
/// Matches the built-in interaction set: pointer, selection, keyboard,
/// drag-and-drop, and media signals.
pub const DEFAULT_EVENTS: [&str; 10] = [
    "click",
    "dblclick",
    "contextmenu",
    "select",
    "wheel",
    "keypress",
    "drag",
    "drop",
    "play",
    "pause",
];

/// Errors that can occur during configuration validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Interaction or marked tracking was requested with no event types.
    #[error("event list cannot be empty for {level:?} tracking")]
    EmptyEvents {
        /// The level the configuration asked for.
        level: TrackingLevel,
    },
}

/// What class of tree activity the tracker captures.
///
/// Mutually exclusive; chosen at construction and immutable afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingLevel {
    /// Structural and attribute mutations on the whole tree.
    Mutation,
    /// Every configured interaction signal, regardless of target.
    Interaction,
    /// Configured interaction signals whose target carries at least one
    /// marked attribute.
    #[default]
    Marked,
}

/// Resolved tracker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Opaque label for this tracker instance. Surfaced in logs only; useful
    /// when running several trackers side by side.
    pub identifier: Option<String>,

    /// Tracking level, see [`TrackingLevel`].
    pub level: TrackingLevel,

    /// Event types to listen for, in wiring order. Ignored when `level` is
    /// [`TrackingLevel::Mutation`]. Duplicates are dropped, keeping the
    /// first occurrence.
    pub events: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new(TrackingLevel::default())
    }
}

impl TrackerConfig {
    /// Creates a configuration for `level` with the default event list.
    #[must_use]
    pub fn new(level: TrackingLevel) -> Self {
        Self {
            identifier: None,
            level,
            events: DEFAULT_EVENTS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Sets the instance identifier.
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Replaces the event list, deduplicating while preserving order.
    #[must_use]
    pub fn with_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = Vec::new();
        for event in events {
            let event = event.into();
            if !seen.contains(&event) {
                seen.push(event);
            }
        }
        self.events = seen;
        self
    }

    /// Checks the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyEvents`] when the level is
    /// [`TrackingLevel::Interaction`] or [`TrackingLevel::Marked`] and the
    /// event list is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level != TrackingLevel::Mutation && self.events.is_empty() {
            return Err(ConfigError::EmptyEvents { level: self.level });
        }
        Ok(())
    }
}
