//! Notification Bus
//!
//! A small in-process event channel with named events, modelled on the
//! desktop-shell `listen`/`emit` contract the kiosk consumes: the scanner
//! backend emits a JSON payload under an event name and every current
//! listener receives a copy.
//!
//! # Scoped Subscriptions
//!
//! `subscribe` returns a [`Subscription`] guard. Dropping the guard removes
//! the listener from the registry, so nothing emitted afterwards can reach a
//! component that has been torn down. There is no explicit unsubscribe call
//! to forget.
//!
//! # Thread Safety
//!
//! The registry sits behind `Arc<RwLock<>>` (emits take the read lock, the
//! listener set only changes on subscribe/drop). Clones of the bus share one
//! registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

/// Errors from the notification bus
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The bus has been closed; no new listeners can attach
    #[error("notification bus is closed")]
    Closed,

    /// A payload could not be serialized to JSON
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Unique identifier for one listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Raw numeric value
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Debug)]
struct Listener {
    id: SubscriptionId,
    tx: mpsc::UnboundedSender<Value>,
}

#[derive(Debug, Default)]
struct Registry {
    listeners: HashMap<String, Vec<Listener>>,
    closed: bool,
}

/// Named-event notification bus
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    registry: Arc<RwLock<Registry>>,
}

impl EventBus {
    /// Create an open bus with no listeners
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start listening for `event`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Closed`] once the bus has been closed.
    pub fn subscribe(&self, event: &str) -> Result<Subscription, BusError> {
        let mut registry = self.registry.write();
        if registry.closed {
            return Err(BusError::Closed);
        }

        let id = SubscriptionId::next();
        let (tx, rx) = mpsc::unbounded_channel();
        registry
            .listeners
            .entry(event.to_string())
            .or_default()
            .push(Listener { id, tx });

        tracing::debug!(event, subscription = %id, "listener attached");

        Ok(Subscription {
            id,
            event: event.to_string(),
            rx,
            registry: Arc::downgrade(&self.registry),
        })
    }

    /// Deliver `payload` to every listener of `event`.
    ///
    /// Returns how many listeners received it. Listeners whose receiving end
    /// is gone are pruned.
    pub fn emit(&self, event: &str, payload: Value) -> usize {
        let mut delivered = 0;
        let mut stale = false;

        {
            let registry = self.registry.read();
            if let Some(listeners) = registry.listeners.get(event) {
                for listener in listeners {
                    if listener.tx.send(payload.clone()).is_ok() {
                        delivered += 1;
                    } else {
                        stale = true;
                    }
                }
            }
        }

        if stale {
            let mut registry = self.registry.write();
            if let Some(listeners) = registry.listeners.get_mut(event) {
                listeners.retain(|l| !l.tx.is_closed());
            }
        }

        tracing::trace!(event, delivered, "event emitted");
        delivered
    }

    /// Serialize `payload` and emit it
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Serialize`] if the payload can't become JSON.
    pub fn emit_json<T: Serialize>(&self, event: &str, payload: &T) -> Result<usize, BusError> {
        let value = serde_json::to_value(payload)?;
        Ok(self.emit(event, value))
    }

    /// Number of live listeners for `event`
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.registry
            .read()
            .listeners
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Close the bus.
    ///
    /// Existing subscriptions see end-of-stream and new subscriptions fail.
    pub fn close(&self) {
        let mut registry = self.registry.write();
        registry.closed = true;
        registry.listeners.clear();
        tracing::debug!("notification bus closed");
    }

    /// Whether [`close`](Self::close) has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.registry.read().closed
    }
}

/// A live listener registration. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    event: String,
    rx: mpsc::UnboundedReceiver<Value>,
    registry: Weak<RwLock<Registry>>,
}

impl Subscription {
    /// Wait for the next payload. `None` means the bus dropped this listener.
    ///
    /// Cancel safe: a payload is never lost if the future is dropped.
    pub async fn recv(&mut self) -> Option<Value> {
        self.rx.recv().await
    }

    /// Take a payload if one is already queued
    pub fn try_recv(&mut self) -> Option<Value> {
        self.rx.try_recv().ok()
    }

    /// Registration id
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Event name this subscription listens to
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.rx.close();

        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.write();
        if let Some(listeners) = registry.listeners.get_mut(&self.event) {
            listeners.retain(|l| l.id != self.id);
            if listeners.is_empty() {
                registry.listeners.remove(&self.event);
            }
        }

        tracing::debug!(event = %self.event, subscription = %self.id, "listener detached");
    }
}
