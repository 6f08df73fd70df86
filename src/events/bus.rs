//! Typed publish/subscribe registry.
//!
//! Handlers are kept per [`EventKind`] in registration order. Emission is
//! synchronous: [`EventBus::emit`] returns after every handler has run.
//!
//! Each handler call is isolated; a panicking handler is logged and the
//! remaining handlers still run. The handler list is snapshotted before
//! dispatch, so a handler may subscribe or unsubscribe without deadlocking.

// ============================================================================
// Imports
// ============================================================================

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{error, trace};

use crate::error::Error;
use crate::identifiers::SubscriptionId;
use crate::protocol::Frame;

use super::{EventKind, SocketEvent};

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
pub type EventHandler = Arc<dyn Fn(&SocketEvent) + Send + Sync>;

type Registry = FxHashMap<EventKind, Vec<(SubscriptionId, EventHandler)>>;

// ============================================================================
// EventBus
// ============================================================================

/// Registry mapping event kinds to ordered handler lists.
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<Registry>,
}

impl EventBus {
    /// Creates an empty bus.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `kind`.
    ///
    /// The same handler may be registered more than once; every
    /// registration fires.
    pub fn subscribe(&self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId::generate();
        self.handlers
            .lock()
            .entry(kind)
            .or_default()
            .push((id, handler));

        trace!(kind = kind.as_str(), %id, "Subscribed");
        id
    }

    /// Removes exactly one registration. Returns `false` if it was not found.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock();
        let Some(list) = handlers.get_mut(&kind) else {
            return false;
        };

        let Some(index) = list.iter().position(|(sub, _)| *sub == id) else {
            return false;
        };
        list.remove(index);

        if list.is_empty() {
            handlers.remove(&kind);
        }
        true
    }

    /// Removes every registration for `kind`.
    pub fn unsubscribe_all(&self, kind: EventKind) {
        self.handlers.lock().remove(&kind);
    }

    /// Invokes every handler registered for the event's kind, in order.
    pub fn emit(&self, event: &SocketEvent) {
        let kind = event.kind();

        let snapshot: Vec<EventHandler> = match self.handlers.lock().get(&kind) {
            Some(list) => list.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => return,
        };

        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!(kind = kind.as_str(), "Event handler panicked");
            }
        }
    }

    /// Drops all registrations.
    pub fn clear(&self) {
        self.handlers.lock().clear();
    }

    /// Returns the number of handlers registered for `kind`.
    #[must_use]
    pub fn len(&self, kind: EventKind) -> usize {
        self.handlers.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Returns `true` if no handler is registered for any kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.lock().values().all(Vec::is_empty)
    }
}

// ============================================================================
// Typed Subscriptions
// ============================================================================

impl EventBus {
    /// Subscribes to connection state changes.
    pub fn on_connected<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.subscribe(
            EventKind::Connected,
            Arc::new(move |event| {
                if let SocketEvent::Connected(connected) = event {
                    handler(*connected);
                }
            }),
        )
    }

    /// Subscribes to camera frames.
    pub fn on_frame<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.subscribe(
            EventKind::Frame,
            Arc::new(move |event| {
                if let SocketEvent::Frame(frame) = event {
                    handler(frame);
                }
            }),
        )
    }

    /// Subscribes to device status updates.
    pub fn on_status<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(
            EventKind::Status,
            Arc::new(move |event| {
                if let SocketEvent::Status(data) = event {
                    handler(data);
                }
            }),
        )
    }

    /// Subscribes to errors.
    pub fn on_error<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.subscribe(
            EventKind::Error,
            Arc::new(move |event| {
                if let SocketEvent::Error(err) = event {
                    handler(err);
                }
            }),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
