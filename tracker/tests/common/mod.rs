//! Shared test helpers: an in-memory tree adapter and tracing setup.

use std::sync::{Arc, Mutex};

use treeline_tracker::adapter::{
    AgentContext, ChangeRecord, ListenerId, ListenerOptions, LocationContext, ObserveOptions,
    ObserverId, TreeAdapter, UiEvent,
};

type SignalHandler = Arc<dyn Fn(UiEvent) + Send + Sync>;
type ChangeHandler = Arc<dyn Fn(Vec<ChangeRecord>) + Send + Sync>;

/// Initializes tracing for tests; safe to call repeatedly.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "treeline_tracker=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

struct Listener {
    id: ListenerId,
    event_type: String,
    options: ListenerOptions,
    handler: SignalHandler,
}

struct Observer {
    id: ObserverId,
    options: ObserveOptions,
    handler: ChangeHandler,
}

/// In-memory tree adapter recording every registration in order and
/// replaying signals to the matching handlers.
pub struct FakeTreeAdapter {
    available: bool,
    listeners: Mutex<Vec<Listener>>,
    observers: Mutex<Vec<Observer>>,
}

#[allow(dead_code)]
impl FakeTreeAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            available: true,
            listeners: Mutex::new(Vec::new()),
            observers: Mutex::new(Vec::new()),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            available: false,
            listeners: Mutex::new(Vec::new()),
            observers: Mutex::new(Vec::new()),
        })
    }

    /// Total number of live registrations (listeners + observers).
    pub fn live_registrations(&self) -> usize {
        self.listeners.lock().unwrap().len() + self.observers.lock().unwrap().len()
    }

    /// Event types of the live listeners, in registration order.
    pub fn wired_event_types(&self) -> Vec<String> {
        self.listeners
            .lock()
            .unwrap()
            .iter()
            .map(|listener| listener.event_type.clone())
            .collect()
    }

    /// Whether every live listener was registered in capture mode.
    pub fn all_capture_mode(&self) -> bool {
        self.listeners
            .lock()
            .unwrap()
            .iter()
            .all(|listener| listener.options.capture)
    }

    /// Whether every live observer watches attributes, child list, and subtree.
    pub fn all_observers_recursive(&self) -> bool {
        self.observers
            .lock()
            .unwrap()
            .iter()
            .all(|observer| observer.options == ObserveOptions::recursive())
    }

    /// Delivers `event` to every listener registered for its type.
    pub fn emit(&self, event: UiEvent) {
        let handlers: Vec<SignalHandler> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|listener| listener.event_type == event.event_type)
            .map(|listener| Arc::clone(&listener.handler))
            .collect();
        for handler in handlers {
            handler(event.clone());
        }
    }

    /// Delivers a change batch to every registered observer.
    pub fn emit_changes(&self, records: Vec<ChangeRecord>) {
        let handlers: Vec<ChangeHandler> = self
            .observers
            .lock()
            .unwrap()
            .iter()
            .map(|observer| Arc::clone(&observer.handler))
            .collect();
        for handler in handlers {
            handler(records.clone());
        }
    }
}

impl TreeAdapter for FakeTreeAdapter {
    fn add_signal_listener(
        &self,
        event_type: &str,
        handler: SignalHandler,
        options: ListenerOptions,
    ) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.lock().unwrap().push(Listener {
            id,
            event_type: event_type.to_string(),
            options,
            handler,
        });
        id
    }

    fn remove_signal_listener(&self, id: ListenerId) {
        self.listeners
            .lock()
            .unwrap()
            .retain(|listener| listener.id != id);
    }

    fn observe_changes(&self, options: ObserveOptions, handler: ChangeHandler) -> ObserverId {
        let id = ObserverId::new();
        self.observers.lock().unwrap().push(Observer {
            id,
            options,
            handler,
        });
        id
    }

    fn disconnect_change_observer(&self, id: ObserverId) {
        self.observers
            .lock()
            .unwrap()
            .retain(|observer| observer.id != id);
    }

    fn location(&self) -> Option<LocationContext> {
        Some(LocationContext {
            href: "https://shop.example.test/cart?step=2".to_string(),
            host: Some("shop.example.test".to_string()),
            path: Some("/cart".to_string()),
            query: Some("step=2".to_string()),
        })
    }

    fn agent(&self) -> Option<AgentContext> {
        Some(AgentContext {
            raw: "treeline-test/1.0".to_string(),
            platform: Some("linux".to_string()),
            language: Some("en".to_string()),
        })
    }

    fn is_available(&self) -> bool {
        self.available
    }
}
