//! Treeline Tracker - UI-element tree interaction and mutation tracker.
//!
//! This crate provides an in-process instrumentation component that attaches
//! to a live UI-element tree and publishes a normalized stream of interaction
//! and mutation events for downstream consumers (analytics pipelines,
//! debugging overlays).
//!
//! # Overview
//!
//! A [`Tracker`] is constructed with a [`TrackerConfig`] and an injected
//! [`TreeAdapter`] implementation. Starting it wires signal listeners and a
//! change observer on the adapter according to the configured
//! [`TrackingLevel`]; each raw signal is filtered, enriched with a timestamp
//! and ambient context, and published as a [`NormalizedEvent`] on the
//! `"track"` topic. Stopping removes exactly what starting wired.
//!
//! The tracker never touches ambient global state: headless or test
//! environments inject a fake adapter, and an unavailable tree degrades to a
//! running tracker with no subscriptions.
//!
//! # Modules
//!
//! - [`adapter`]: The injected tree abstraction and its data types
//! - [`bus`]: Synchronous publish/subscribe bus for normalized events
//! - [`config`]: Tracking level and event-list configuration
//! - [`error`]: Error types for tracker operations
//! - [`marks`]: Marked-attribute metadata extraction
//! - [`tracker`]: Lifecycle state machine and capture pipeline
//! - [`types`]: Normalized event schema

pub mod adapter;
pub mod bus;
pub mod config;
pub mod error;
pub mod marks;
pub mod tracker;
pub mod types;

pub use adapter::{
    AgentContext, ChangeKind, ChangeRecord, Element, ListenerId, ListenerOptions, LocationContext,
    ObserveOptions, ObserverId, TreeAdapter, UiEvent,
};
pub use bus::{EventBus, SubscriptionId};
pub use config::{ConfigError, TrackerConfig, TrackingLevel, DEFAULT_EVENTS};
pub use error::{Result, TrackerError};
pub use marks::{marked_metadata, MARK_PREFIX};
pub use tracker::{Tracker, TrackerState, TRACK_TOPIC};
pub use types::{NormalizedEvent, RawPayload, MUTATION_EVENT_TYPE};
