//! Tracker lifecycle and event pipeline.
//!
//! A [`Tracker`] attaches to a UI-element tree through an injected
//! [`TreeAdapter`] and publishes [`NormalizedEvent`]s on its internal bus
//! under the [`TRACK_TOPIC`] topic.
//!
//! # Lifecycle
//!
//! ```text
//! READY --start()--> RUNNING <--resume()/pause()--> PAUSED
//!                       |                              |
//!                       +-----------stop()-------------+--> STOPPED (terminal)
//! ```
//!
//! `start()` wires listeners on the adapter according to the configured
//! tracking level; `stop()` removes exactly what `start()` wired and is
//! terminal; tracking again requires a fresh instance. While paused, the
//! tracker drops incoming signals without emission.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use treeline_tracker::adapter::TreeAdapter;
//! use treeline_tracker::config::{TrackerConfig, TrackingLevel};
//! use treeline_tracker::tracker::{Tracker, TRACK_TOPIC};
//!
//! fn run(adapter: Arc<dyn TreeAdapter>) -> treeline_tracker::Result<()> {
//!     let tracker = Tracker::init(
//!         TrackerConfig::new(TrackingLevel::Interaction).with_events(["click"]),
//!         adapter,
//!     )?;
//!
//!     tracker.subscribe(TRACK_TOPIC, |event| {
//!         println!("captured {} at {}", event.event_type, event.timestamp);
//!     })?;
//!
//!     tracker.start()?;
//!     // ... signals flow ...
//!     tracker.stop()?;
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::adapter::{
    ChangeHandler, ChangeRecord, ListenerId, ListenerOptions, ObserveOptions, ObserverId,
    SignalHandler, TreeAdapter, UiEvent,
};
use crate::bus::{EventBus, SubscriptionId};
use crate::config::{TrackerConfig, TrackingLevel};
use crate::error::{Result, TrackerError};
use crate::marks::marked_metadata;
use crate::types::{NormalizedEvent, RawPayload, MUTATION_EVENT_TYPE};

/// Topic all normalized events are published under.
pub const TRACK_TOPIC: &str = "track";

/// Low-level signal wired at mutation level to detect user activity.
const ACTIVITY_EVENT: &str = "mousemove";

/// Lifecycle state of a tracker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Constructed, never started.
    Ready,
    /// Started and capturing signals.
    Running,
    /// Started but ignoring signals.
    Paused,
    /// Stopped; terminal.
    Stopped,
}

impl TrackerState {
    /// Whether the tracker has been started and not yet stopped.
    #[must_use]
    pub fn is_started(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Whether the tracker has no live wiring (never started, or stopped).
    #[must_use]
    pub fn is_stopped_group(self) -> bool {
        matches!(self, Self::Ready | Self::Stopped)
    }
}

/// Adapter registrations made by `start()`, removed by `stop()`.
#[derive(Default)]
struct Wiring {
    listeners: Vec<ListenerId>,
    observer: Option<ObserverId>,
}

struct Inner {
    state: TrackerState,
    /// Set while paused; checked first for every incoming signal.
    ignore_signals: bool,
    wiring: Wiring,
}

struct Shared {
    config: TrackerConfig,
    adapter: Arc<dyn TreeAdapter>,
    bus: EventBus,
    inner: Mutex<Inner>,
}

/// Tracks interactions and mutations on a UI-element tree.
///
/// Cheap to clone the subscription side of: the tracker is a thin handle
/// around shared state, and adapter callbacks hold only weak references to
/// it, so dropping the last `Tracker` disarms any pending pause timer.
pub struct Tracker {
    shared: Arc<Shared>,
}

impl Tracker {
    /// Creates a tracker in the `Ready` state.
    ///
    /// The adapter is injected here and never looked up ambiently, so the
    /// tracker can run against a fake tree in tests or degrade gracefully in
    /// headless contexts.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `config` fails validation (empty
    /// event list for interaction/marked tracking).
    pub fn init(config: TrackerConfig, adapter: Arc<dyn TreeAdapter>) -> Result<Self> {
        config.validate()?;
        debug!(
            identifier = config.identifier.as_deref().unwrap_or_default(),
            level = ?config.level,
            "tracker initialized"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                adapter,
                bus: EventBus::new(),
                inner: Mutex::new(Inner {
                    state: TrackerState::Ready,
                    ignore_signals: false,
                    wiring: Wiring::default(),
                }),
            }),
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TrackerState {
        self.shared.lock().state
    }

    /// Whether the tracker has never been started.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == TrackerState::Ready
    }

    /// Whether the tracker is started and capturing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == TrackerState::Running
    }

    /// Whether the tracker is started but ignoring signals.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state() == TrackerState::Paused
    }

    /// Whether the tracker has been stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state() == TrackerState::Stopped
    }

    /// Starts capturing: wires listeners on the tree adapter per the
    /// configured tracking level and moves to `Running`.
    ///
    /// When the adapter reports the tree unavailable, the tracker logs a
    /// warning and still moves to `Running` with zero registrations, matching
    /// the host application's tolerance for headless contexts.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::AlreadyStarted`] when called while `Running`
    /// or `Paused`, and also from the terminal `Stopped` state: a stopped
    /// tracker cannot be restarted; create a fresh instance instead. The
    /// state is unchanged on error.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.shared.lock();
        if inner.state != TrackerState::Ready {
            return Err(TrackerError::AlreadyStarted);
        }

        if !self.shared.adapter.is_available() {
            warn!(
                identifier = self.shared.config.identifier.as_deref().unwrap_or_default(),
                "tree adapter unavailable; tracker running without subscriptions"
            );
            inner.ignore_signals = false;
            inner.state = TrackerState::Running;
            return Ok(());
        }

        inner.wiring = wire(&self.shared);
        inner.ignore_signals = false;
        inner.state = TrackerState::Running;
        debug!(
            listeners = inner.wiring.listeners.len(),
            observer = inner.wiring.observer.is_some(),
            "tracker started"
        );
        Ok(())
    }

    /// Pauses capturing until [`resume`](Self::resume) is called: incoming
    /// signals are dropped without emission.
    ///
    /// Pausing an already paused tracker logs a warning and stays paused.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotStarted`] when called while `Ready` or
    /// `Stopped`.
    pub fn pause(&self) -> Result<()> {
        self.pause_impl(None)
    }

    /// Pauses capturing for `duration`, then resumes automatically.
    ///
    /// The timer is armed once and cannot be cancelled: a manual `resume()`
    /// before expiry leaves it pending, and when it later fires the resume
    /// path is an idempotent no-op. If the tracker is stopped (or dropped)
    /// before expiry, the fire is guarded and only logs a warning.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotStarted`] when called while `Ready` or
    /// `Stopped`.
    pub fn pause_for(&self, duration: Duration) -> Result<()> {
        self.pause_impl(Some(duration))
    }

    fn pause_impl(&self, duration: Option<Duration>) -> Result<()> {
        {
            let mut inner = self.shared.lock();
            if inner.state.is_stopped_group() {
                return Err(TrackerError::not_started("pause"));
            }
            if inner.ignore_signals {
                warn!("called `pause()` on an already paused tracker");
            }
            inner.ignore_signals = true;
            inner.state = TrackerState::Paused;
        }

        if let Some(after) = duration {
            let weak = Arc::downgrade(&self.shared);
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                if let Err(err) = shared.resume() {
                    warn!(%err, "scheduled resume fired after tracker stopped");
                }
            });
            debug!(?after, "tracker paused with auto-resume");
        } else {
            debug!("tracker paused");
        }
        Ok(())
    }

    /// Resumes capturing after a pause: clears the ignore flag and moves to
    /// `Running`.
    ///
    /// Resuming a tracker that is not paused logs a warning and is otherwise
    /// a no-op, so a pending pause timer firing after a manual resume is
    /// harmless.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotStarted`] when called while `Ready` or
    /// `Stopped`.
    pub fn resume(&self) -> Result<()> {
        self.shared.resume()
    }

    /// Stops capturing: removes every registration made by `start()` and
    /// moves to the terminal `Stopped` state.
    ///
    /// Unwiring mirrors wiring exactly; afterwards the adapter holds zero
    /// live registrations from this tracker. A stopped tracker cannot be
    /// restarted.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotStarted`] when called while `Ready` or
    /// `Stopped`.
    pub fn stop(&self) -> Result<()> {
        let mut inner = self.shared.lock();
        if inner.state.is_stopped_group() {
            return Err(TrackerError::not_started("stop"));
        }

        for id in inner.wiring.listeners.drain(..) {
            self.shared.adapter.remove_signal_listener(id);
        }
        if let Some(observer) = inner.wiring.observer.take() {
            self.shared.adapter.disconnect_change_observer(observer);
        }
        inner.ignore_signals = false;
        inner.state = TrackerState::Stopped;
        debug!("tracker stopped");
        Ok(())
    }

    /// Registers `handler` for events published on `topic` (normally
    /// [`TRACK_TOPIC`]). Handlers receive every event exactly once, in
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidHandler`] when the subscription is
    /// rejected (empty topic).
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(&NormalizedEvent) + Send + Sync + 'static,
    {
        self.shared.bus.subscribe(topic, handler)
    }

    /// Removes a subscription. Returns `true` when the handle was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.bus.unsubscribe(id)
    }
}

/// Registers adapter listeners for the configured tracking level.
///
/// Handlers capture only a `Weak` reference to the shared state: a signal
/// arriving after the tracker is dropped upgrades to `None` and is discarded.
fn wire(shared: &Arc<Shared>) -> Wiring {
    let mut wiring = Wiring::default();

    match shared.config.level {
        TrackingLevel::Mutation => {
            let weak = Arc::downgrade(shared);
            let handler: SignalHandler = Arc::new(move |event| {
                if let Some(shared) = weak.upgrade() {
                    shared.process_signal(event);
                }
            });
            wiring.listeners.push(shared.adapter.add_signal_listener(
                ACTIVITY_EVENT,
                handler,
                ListenerOptions::capture(),
            ));

            let weak = Arc::downgrade(shared);
            let handler: ChangeHandler = Arc::new(move |records| {
                if let Some(shared) = weak.upgrade() {
                    shared.process_changes(records);
                }
            });
            wiring.observer = Some(
                shared
                    .adapter
                    .observe_changes(ObserveOptions::recursive(), handler),
            );
        }
        TrackingLevel::Interaction | TrackingLevel::Marked => {
            // Capture order: the tracker sees the signal before application
            // handlers can stop it from bubbling.
            for event_type in &shared.config.events {
                let weak = Arc::downgrade(shared);
                let handler: SignalHandler = Arc::new(move |event| {
                    if let Some(shared) = weak.upgrade() {
                        shared.process_signal(event);
                    }
                });
                wiring.listeners.push(shared.adapter.add_signal_listener(
                    event_type,
                    handler,
                    ListenerOptions::capture(),
                ));
            }
        }
    }

    wiring
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Poisoning can only come from a panic inside a guarded section;
        // the lifecycle fields remain consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resume(&self) -> Result<()> {
        let mut inner = self.lock();
        if inner.state.is_stopped_group() {
            return Err(TrackerError::not_started("resume"));
        }
        if !inner.ignore_signals {
            warn!("called `resume()` on an already running tracker");
        }
        inner.ignore_signals = false;
        inner.state = TrackerState::Running;
        debug!("tracker resumed");
        Ok(())
    }

    /// Capture → filter → enrich → emit for a single interaction signal.
    fn process_signal(&self, event: UiEvent) {
        if self.lock().ignore_signals {
            trace!(event_type = %event.event_type, "signal dropped: tracker paused");
            return;
        }

        let metadata = event
            .target
            .as_ref()
            .map(marked_metadata)
            .unwrap_or_default();

        if self.config.level == TrackingLevel::Marked && metadata.is_empty() {
            trace!(event_type = %event.event_type, "signal dropped: target not marked");
            return;
        }

        let normalized = NormalizedEvent::new(
            event.event_type.clone(),
            RawPayload::Interaction(event),
            self.adapter.location(),
            self.adapter.agent(),
            metadata,
        );
        self.bus.publish(TRACK_TOPIC, &normalized);
    }

    /// Enrich → emit for a change-notification batch. Batches have no single
    /// target, so the metadata mapping is always empty and the marked filter
    /// does not apply.
    fn process_changes(&self, records: Vec<ChangeRecord>) {
        if self.lock().ignore_signals {
            trace!(records = records.len(), "change batch dropped: tracker paused");
            return;
        }

        let normalized = NormalizedEvent::new(
            MUTATION_EVENT_TYPE,
            RawPayload::Mutation(records),
            self.adapter.location(),
            self.adapter.agent(),
            BTreeMap::new(),
        );
        self.bus.publish(TRACK_TOPIC, &normalized);
    }
}
