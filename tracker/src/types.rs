//! Event types for Treeline tracking.
//!
//! This module defines the normalized event schema published on the tracker's
//! bus. Raw tree signals are enriched into a [`NormalizedEvent`] before
//! emission; subscribers receive the normalized form only, never the raw
//! adapter callback arguments.

use std::collections::BTreeMap;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::adapter::{AgentContext, ChangeRecord, LocationContext, UiEvent};

/// Length of the random alphanumeric suffix in event IDs.
const EVENT_ID_SUFFIX_LEN: usize = 20;

/// Prefix for all event IDs.
const EVENT_ID_PREFIX: &str = "evt_";

/// Event type name used for change-notification batches.
pub const MUTATION_EVENT_TYPE: &str = "mutation";

/// The raw signal carried inside a normalized event.
///
/// Uses serde's adjacently tagged representation so both the single-signal
/// and batch forms serialize with an explicit `kind` discriminant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum RawPayload {
    /// A single interaction signal.
    Interaction(UiEvent),
    /// An ordered batch of change records.
    Mutation(Vec<ChangeRecord>),
}

/// A normalized tracking event.
///
/// Produced fresh for every captured signal that survives the pipeline's
/// filters, then handed to each subscriber independently. The tracker keeps
/// no history; storage is the consumer's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Unique event identifier with format `evt_` followed by 20 alphanumeric
    /// characters.
    pub id: String,

    /// Wall-clock capture time, milliseconds since the Unix epoch.
    pub timestamp: i64,

    /// `"mutation"` for change batches, otherwise the raw event type name.
    #[serde(rename = "type")]
    pub event_type: String,

    /// The raw signal as delivered by the tree adapter.
    pub payload: RawPayload,

    /// Ambient location context at capture time, if available.
    pub location: Option<LocationContext>,

    /// Ambient agent context at capture time, if available.
    pub agent: Option<AgentContext>,

    /// Marked metadata extracted from the originating element. Empty for
    /// change batches, which carry no single target.
    pub metadata: BTreeMap<String, String>,
}

impl NormalizedEvent {
    /// Creates an event with a fresh id and the current wall-clock timestamp.
    #[must_use]
    pub fn new(
        event_type: impl Into<String>,
        payload: RawPayload,
        location: Option<LocationContext>,
        agent: Option<AgentContext>,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: generate_event_id(),
            timestamp: Utc::now().timestamp_millis(),
            event_type: event_type.into(),
            payload,
            location,
            agent,
            metadata,
        }
    }
}

/// Generates a unique event ID with the format `evt_` followed by 20
/// alphanumeric characters.
fn generate_event_id() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = rand::rng();
    let suffix: String = (0..EVENT_ID_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();

    format!("{EVENT_ID_PREFIX}{suffix}")
}
