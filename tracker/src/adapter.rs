//! Tree adapter abstraction over the observed UI-element tree.
//!
//! The tracker never touches an ambient document or global tree. Everything it
//! needs from the outside world (signal listeners, change observation,
//! attribute inspection, location/agent lookups) goes through the
//! [`TreeAdapter`] trait, which is injected at construction time. This keeps
//! the core testable with a fake adapter and usable in headless contexts.
//!
//! # Contract
//!
//! An adapter implementation must:
//!
//! - invoke signal handlers synchronously, in capture order (outermost
//!   ancestor first) when [`ListenerOptions::capture`] is set, so the tracker
//!   observes a signal before bubbling-phase application handlers can stop it
//! - deliver change notifications as ordered batches of [`ChangeRecord`]s
//! - snapshot an element's attributes into the [`Element`] handed to the
//!   tracker at signal time (the tracker inspects attributes only then)
//!
//! # Example
//!
//! ```
//! use treeline_tracker::adapter::Element;
//!
//! let element = Element::new("button")
//!     .with_attribute("track-action", "checkout")
//!     .with_attribute("class", "btn");
//!
//! assert_eq!(element.attribute("track-action"), Some("checkout"));
//! assert_eq!(element.attribute_names().count(), 2);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handler invoked by the adapter for each raw interaction signal.
pub type SignalHandler = Arc<dyn Fn(UiEvent) + Send + Sync>;

/// Handler invoked by the adapter for each batch of change records.
pub type ChangeHandler = Arc<dyn Fn(Vec<ChangeRecord>) + Send + Sync>;

/// Handle identifying a registered signal listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Creates a fresh listener handle. Called by adapter implementations.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle identifying a registered change observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObserverId(Uuid);

impl ObserverId {
    /// Creates a fresh observer handle. Called by adapter implementations.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for signal listener registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerOptions {
    /// Register in the capture phase (outermost ancestor first).
    pub capture: bool,
}

impl ListenerOptions {
    /// Capture-phase registration, the mode the tracker always uses.
    #[must_use]
    pub const fn capture() -> Self {
        Self { capture: true }
    }
}

/// Options for change observation over a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserveOptions {
    /// Report attribute changes.
    pub attributes: bool,
    /// Report node additions and removals.
    pub child_list: bool,
    /// Observe the whole subtree, not just the root element.
    pub subtree: bool,
}

impl ObserveOptions {
    /// Full recursive observation: attributes, child list, and subtree.
    #[must_use]
    pub const fn recursive() -> Self {
        Self {
            attributes: true,
            child_list: true,
            subtree: true,
        }
    }
}

/// Read-only snapshot of a tree element at signal time.
///
/// Adapters build one of these for the signal's target. Attribute order is
/// stable (sorted by name) so serialized events are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Element tag name (e.g. `button`).
    pub tag: String,
    attributes: BTreeMap<String, String>,
}

impl Element {
    /// Creates an element snapshot with no attributes.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute, replacing any previous value for the same name.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Returns the value of `name`, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Iterates over all attribute names.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Iterates over `(name, value)` pairs.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A raw interaction signal delivered by the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiEvent {
    /// Raw event type name (e.g. `click`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Snapshot of the originating element, if the signal has one.
    pub target: Option<Element>,
}

impl UiEvent {
    /// Creates a signal with a target element.
    #[must_use]
    pub fn new(event_type: impl Into<String>, target: Element) -> Self {
        Self {
            event_type: event_type.into(),
            target: Some(target),
        }
    }

    /// Creates a signal without a target element.
    #[must_use]
    pub fn without_target(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            target: None,
        }
    }
}

/// Classification of a single change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// An attribute on an observed element changed.
    Attributes,
    /// Children were added to or removed from an observed element.
    ChildList,
}

/// One structural or attribute mutation observed on the subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// What kind of mutation this record describes.
    pub kind: ChangeKind,
    /// Snapshot of the affected element, when the adapter can provide one.
    pub target: Option<Element>,
    /// Name of the changed attribute for [`ChangeKind::Attributes`] records.
    pub attribute_name: Option<String>,
    /// Number of nodes added for [`ChangeKind::ChildList`] records.
    pub added_nodes: u32,
    /// Number of nodes removed for [`ChangeKind::ChildList`] records.
    pub removed_nodes: u32,
}

impl ChangeRecord {
    /// Creates an attribute-change record.
    #[must_use]
    pub fn attribute_change(target: Element, attribute_name: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Attributes,
            target: Some(target),
            attribute_name: Some(attribute_name.into()),
            added_nodes: 0,
            removed_nodes: 0,
        }
    }

    /// Creates a child-list record.
    #[must_use]
    pub fn child_list(target: Option<Element>, added_nodes: u32, removed_nodes: u32) -> Self {
        Self {
            kind: ChangeKind::ChildList,
            target,
            attribute_name: None,
            added_nodes,
            removed_nodes,
        }
    }
}

/// Ambient location of the observed tree (page URL components).
///
/// Opaque to the tracker: it is captured as-is into emitted events, never
/// parsed or interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationContext {
    /// Full location string.
    pub href: String,
    /// Host component, when the provider exposes one.
    pub host: Option<String>,
    /// Path component, when the provider exposes one.
    pub path: Option<String>,
    /// Query string, when the provider exposes one.
    pub query: Option<String>,
}

/// Ambient user-agent description of the environment hosting the tree.
///
/// Opaque to the tracker, same as [`LocationContext`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentContext {
    /// Raw agent string.
    pub raw: String,
    /// Platform name, when the provider exposes one.
    pub platform: Option<String>,
    /// Preferred language, when the provider exposes one.
    pub language: Option<String>,
}

/// Access to the live UI-element tree the tracker instruments.
///
/// Implemented by the embedding application (or a test fake); consumed, never
/// implemented, by this crate.
pub trait TreeAdapter: Send + Sync {
    /// Registers `handler` for signals of `event_type` and returns a handle
    /// used to remove it later.
    fn add_signal_listener(
        &self,
        event_type: &str,
        handler: SignalHandler,
        options: ListenerOptions,
    ) -> ListenerId;

    /// Removes a previously registered signal listener. Unknown handles are
    /// ignored.
    fn remove_signal_listener(&self, id: ListenerId);

    /// Starts observing the whole tree for changes and returns a handle used
    /// to disconnect later.
    fn observe_changes(&self, options: ObserveOptions, handler: ChangeHandler) -> ObserverId;

    /// Disconnects a previously registered change observer. Unknown handles
    /// are ignored.
    fn disconnect_change_observer(&self, id: ObserverId);

    /// Current location context, if the environment provides one.
    fn location(&self) -> Option<LocationContext>;

    /// Current agent context, if the environment provides one.
    fn agent(&self) -> Option<AgentContext>;

    /// Whether the underlying tree is reachable at all. A tracker started
    /// against an unavailable adapter runs in degraded mode with no
    /// registrations.
    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_attribute_lookup() {
        let element = Element::new("div")
            .with_attribute("id", "main")
            .with_attribute("track-page", "home");

        assert_eq!(element.attribute("id"), Some("main"));
        assert_eq!(element.attribute("track-page"), Some("home"));
        assert_eq!(element.attribute("missing"), None);
    }

    #[test]
    fn element_attribute_names_are_sorted() {
        let element = Element::new("div")
            .with_attribute("zeta", "1")
            .with_attribute("alpha", "2");

        let names: Vec<&str> = element.attribute_names().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn element_with_attribute_replaces_existing() {
        let element = Element::new("div")
            .with_attribute("id", "old")
            .with_attribute("id", "new");

        assert_eq!(element.attribute("id"), Some("new"));
        assert_eq!(element.attribute_names().count(), 1);
    }

    #[test]
    fn ui_event_serializes_type_field() {
        let event = UiEvent::new("click", Element::new("button"));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "click");
        assert_eq!(json["target"]["tag"], "button");
    }

    #[test]
    fn change_kind_serializes_to_snake_case() {
        assert_eq!(
            serde_json::to_string(&ChangeKind::Attributes).unwrap(),
            "\"attributes\""
        );
        assert_eq!(
            serde_json::to_string(&ChangeKind::ChildList).unwrap(),
            "\"child_list\""
        );
    }

    #[test]
    fn change_record_constructors() {
        let attr = ChangeRecord::attribute_change(Element::new("input"), "value");
        assert_eq!(attr.kind, ChangeKind::Attributes);
        assert_eq!(attr.attribute_name.as_deref(), Some("value"));
        assert_eq!(attr.added_nodes, 0);

        let children = ChangeRecord::child_list(None, 2, 1);
        assert_eq!(children.kind, ChangeKind::ChildList);
        assert!(children.target.is_none());
        assert_eq!(children.added_nodes, 2);
        assert_eq!(children.removed_nodes, 1);
    }

    #[test]
    fn observe_options_recursive_enables_everything() {
        let options = ObserveOptions::recursive();
        assert!(options.attributes);
        assert!(options.child_list);
        assert!(options.subtree);
    }

    #[test]
    fn listener_ids_are_unique() {
        assert_ne!(ListenerId::new(), ListenerId::new());
    }
}
