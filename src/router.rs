//! Type-indexed publish/subscribe registry for push events.
//!
//! The connection task hands every decoded [`Envelope`] to
//! [`EventRouter::dispatch`], which fans it out to the handlers registered
//! for that event kind. Handler failures are isolated: one failing handler
//! is logged and the rest still run, for this envelope and all later ones.
//!
//! Delivery follows transport arrival order; the router never buffers,
//! batches, or reorders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use crate::error::Result;
use crate::models::{Envelope, EventKind};

/// A registered event handler.
///
/// Handlers run synchronously on the dispatch path; anything that needs to
/// await (fallback fetches, forced refetches) must spawn its own task so
/// dispatch of subsequent envelopes is never blocked.
pub type Handler = Arc<dyn Fn(&Envelope) -> Result<()> + Send + Sync>;

type Registry = RwLock<HashMap<EventKind, Vec<(u64, Handler)>>>;

/// Revokes a subscription when dropped or explicitly released.
///
/// Returned by [`EventRouter::subscribe`] and
/// [`ConnectionManager::add_state_listener`](crate::ConnectionManager::add_state_listener).
pub struct ListenerGuard {
    revoke: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerGuard {
    pub(crate) fn new(revoke: impl FnOnce() + Send + 'static) -> Self {
        Self {
            revoke: Some(Box::new(revoke)),
        }
    }

    /// Revoke the subscription now instead of at drop time.
    pub fn unsubscribe(mut self) {
        if let Some(revoke) = self.revoke.take() {
            revoke();
        }
    }

    /// Leak the guard, keeping the subscription alive for the registry's
    /// lifetime.
    pub fn forever(mut self) {
        self.revoke = None;
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(revoke) = self.revoke.take() {
            revoke();
        }
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("active", &self.revoke.is_some())
            .finish()
    }
}

/// Fans decoded envelopes out to per-kind handler sets.
#[derive(Default)]
pub struct EventRouter {
    handlers: Arc<Registry>,
    next_slot: AtomicU64,
}

impl EventRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`. Multiple handlers per kind are
    /// allowed; each registration is individually revocable via the
    /// returned guard.
    pub fn subscribe(
        &self,
        kind: EventKind,
        handler: impl Fn(&Envelope) -> Result<()> + Send + Sync + 'static,
    ) -> ListenerGuard {
        let slot = self.next_slot.fetch_add(1, Ordering::Relaxed);
        {
            let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
            handlers
                .entry(kind)
                .or_default()
                .push((slot, Arc::new(handler)));
        }

        let registry: Weak<Registry> = Arc::downgrade(&self.handlers);
        ListenerGuard::new(move || {
            if let Some(registry) = registry.upgrade() {
                let mut handlers = registry.write().unwrap_or_else(|e| e.into_inner());
                if let Some(set) = handlers.get_mut(&kind) {
                    set.retain(|(id, _)| *id != slot);
                    if set.is_empty() {
                        handlers.remove(&kind);
                    }
                }
            }
        })
    }

    /// Number of handlers currently registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Invoke every handler registered for the envelope's kind.
    ///
    /// A handler returning `Err` is logged and does not prevent subsequent
    /// handlers from running. No handlers registered is not an error.
    pub fn dispatch(&self, envelope: &Envelope) {
        let kind = envelope.kind();
        let snapshot: Vec<Handler> = {
            let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
            match handlers.get(&kind) {
                Some(set) => set.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return,
            }
        };

        for handler in snapshot {
            if let Err(e) = handler(envelope) {
                log::warn!(
                    "Handler for {} failed (group {}): {}",
                    kind.as_wire(),
                    envelope.group_id,
                    e
                );
            }
        }
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("EventRouter")
            .field("kinds", &handlers.len())
            .finish()
    }
}
