//! Publish/subscribe bus for normalized events.
//!
//! The tracker owns a bus instance by composition rather than inheriting
//! emitter behavior, so the tracker's public surface stays limited to its
//! lifecycle and subscription API.
//!
//! Delivery is synchronous fan-out: `publish` invokes every handler
//! registered for the topic at the moment of publish, in registration order.
//! There is no buffering and no replay for late subscribers. A panicking
//! handler is isolated and logged; it never suppresses delivery to the
//! handlers registered after it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, TrackerError};
use crate::types::NormalizedEvent;

/// Handler invoked with every event published on a subscribed topic.
pub type BusHandler = Arc<dyn Fn(&NormalizedEvent) + Send + Sync>;

/// Handle identifying a bus subscription, returned by
/// [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

struct Subscription {
    id: SubscriptionId,
    topic: String,
    handler: BusHandler,
}

/// Synchronous, in-process publish/subscribe bus.
#[derive(Default)]
pub struct EventBus {
    // Vec keeps registration order; subscriber counts are small.
    subscriptions: Mutex<Vec<Subscription>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events published on `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidHandler`] when `topic` is empty.
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(&NormalizedEvent) + Send + Sync + 'static,
    {
        if topic.is_empty() {
            return Err(TrackerError::InvalidHandler(
                "topic name cannot be empty".to_string(),
            ));
        }

        let id = SubscriptionId(Uuid::new_v4());
        self.lock().push(Subscription {
            id,
            topic: topic.to_string(),
            handler: Arc::new(handler),
        });
        Ok(id)
    }

    /// Removes a subscription. Returns `true` when the handle was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.lock();
        let before = subscriptions.len();
        subscriptions.retain(|sub| sub.id != id);
        subscriptions.len() < before
    }

    /// Number of live subscriptions for `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock().iter().filter(|sub| sub.topic == topic).count()
    }

    /// Publishes `event` to every handler registered for `topic` and returns
    /// the number of handlers that were invoked.
    ///
    /// The subscriber set is snapshotted before delivery; handlers run
    /// outside the bus lock, so a handler may subscribe, unsubscribe, or
    /// publish without deadlocking.
    pub fn publish(&self, topic: &str, event: &NormalizedEvent) -> usize {
        let handlers: Vec<(SubscriptionId, BusHandler)> = self
            .lock()
            .iter()
            .filter(|sub| sub.topic == topic)
            .map(|sub| (sub.id, Arc::clone(&sub.handler)))
            .collect();

        let mut delivered = 0;
        for (id, handler) in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    warn!(
                        subscription = ?id,
                        topic,
                        event_id = %event.id,
                        "subscriber panicked during delivery; continuing with remaining subscribers"
                    );
                }
            }
        }

        debug!(topic, event_id = %event.id, delivered, "event published");
        delivered
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        // A poisoned lock only means a subscriber panicked mid-delivery;
        // the subscription list itself is still consistent.
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
