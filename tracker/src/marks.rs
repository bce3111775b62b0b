//! Marked-metadata extraction.
//!
//! Elements opt into marked-level tracking by carrying attributes with the
//! reserved `track-` prefix. Every such attribute becomes a metadata entry on
//! the emitted event, keyed by the local name with the prefix stripped:
//! `track-action="checkout"` yields `{"action": "checkout"}`.
//!
//! Extraction is a read-only scan of the element snapshot taken at signal
//! time; no attribute state is cached between signals.

use std::collections::BTreeMap;

use crate::adapter::Element;

/// Reserved attribute prefix that marks an element for tracking.
pub const MARK_PREFIX: &str = "track-";

/// Collects the marked attributes of `element` into a metadata mapping.
///
/// Returns an empty mapping when the element carries no marked attributes.
/// An attribute named exactly [`MARK_PREFIX`] (empty local name) is ignored.
#[must_use]
pub fn marked_metadata(element: &Element) -> BTreeMap<String, String> {
    element
        .attributes()
        .filter_map(|(name, value)| {
            let local = name.strip_prefix(MARK_PREFIX)?;
            if local.is_empty() {
                return None;
            }
            Some((local.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_marked_attributes_with_prefix_stripped() {
        let element = Element::new("button")
            .with_attribute("track-action", "checkout")
            .with_attribute("track-step", "3");

        let metadata = marked_metadata(&element);
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.get("action").map(String::as_str), Some("checkout"));
        assert_eq!(metadata.get("step").map(String::as_str), Some("3"));
    }

    #[test]
    fn ignores_unmarked_attributes() {
        let element = Element::new("button")
            .with_attribute("class", "btn")
            .with_attribute("data-id", "42")
            .with_attribute("track-name", "cta");

        let metadata = marked_metadata(&element);
        assert_eq!(metadata.len(), 1);
        assert!(metadata.contains_key("name"));
    }

    #[test]
    fn empty_for_element_without_marks() {
        let element = Element::new("div").with_attribute("id", "main");
        assert!(marked_metadata(&element).is_empty());
    }

    #[test]
    fn prefix_only_attribute_is_ignored() {
        let element = Element::new("div").with_attribute("track-", "orphan");
        assert!(marked_metadata(&element).is_empty());
    }

    #[test]
    fn prefix_must_match_exactly() {
        // "tracking-" shares a leading substring but is not the reserved prefix.
        let element = Element::new("div").with_attribute("tracking-id", "x");
        assert!(marked_metadata(&element).is_empty());
    }

    #[test]
    fn marked_value_may_be_empty() {
        let element = Element::new("div").with_attribute("track-flag", "");
        let metadata = marked_metadata(&element);
        assert_eq!(metadata.get("flag").map(String::as_str), Some(""));
    }
}
