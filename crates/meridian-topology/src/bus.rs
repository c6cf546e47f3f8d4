//! Typed synchronous publish/subscribe for topology events
//!
//! Handlers are keyed by [`EventKind`] so every payload is statically known
//! at the subscription site. Dispatch runs handlers in registration order on
//! the emitting thread; a panicking handler is caught and logged so it can
//! neither poison the store nor starve later subscribers.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::error;

use meridian_core::{EventKind, HandlerId, TopologyEvent};

type Handler = Arc<dyn Fn(&TopologyEvent) + Send + Sync>;

struct Subscriber {
    id: HandlerId,
    kind: EventKind,
    handler: Handler,
}

/// Registry of typed event handlers
pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `handler` for events of `kind`
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&TopologyEvent) + Send + Sync + 'static,
    {
        let id = HandlerId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().unwrap().push(Subscriber {
            id,
            kind,
            handler: Arc::new(handler),
        });
        id
    }

    /// Drop the handler registered under `id`
    ///
    /// Returns false when the id is unknown (already unsubscribed).
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        let mut subscribers = self.subscribers.lock().unwrap();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    /// Dispatch `event` to every handler subscribed to its kind
    ///
    /// The registry lock is released before handlers run, so a handler may
    /// subscribe or unsubscribe re-entrantly without deadlocking.
    pub fn dispatch(&self, event: &TopologyEvent) {
        let kind = event.kind();
        let matching: Vec<(HandlerId, Handler)> = {
            let subscribers = self.subscribers.lock().unwrap();
            subscribers
                .iter()
                .filter(|s| s.kind == kind)
                .map(|s| (s.id, Arc::clone(&s.handler)))
                .collect()
        };

        for (id, handler) in matching {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!(handler = id.raw(), kind = %kind, "event handler panicked, continuing");
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
