//! Ephemeral live state driven by `queue.status` events.
//!
//! Queue progress is deliberately excluded from cache reconciliation: it is
//! a momentary figure, and caching it would present stale progress as
//! durable data. Consumers read the counters directly for display.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::models::QueueStatusPayload;

/// Live ingestion-queue counters.
///
/// Updated in place by the reconciler on every `queue.status` event; never
/// written to the cache, never persisted.
#[derive(Debug, Default)]
pub struct QueueState {
    pending_count: AtomicU32,
    is_processing: AtomicBool,
}

impl QueueState {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Episodes currently waiting in the ingestion queue.
    pub fn pending_count(&self) -> u32 {
        self.pending_count.load(Ordering::Relaxed)
    }

    /// Whether a worker is currently processing.
    pub fn is_processing(&self) -> bool {
        self.is_processing.load(Ordering::Relaxed)
    }

    /// Overwrite the counters from a `queue.status` payload.
    pub(crate) fn apply(&self, status: &QueueStatusPayload) {
        self.pending_count.store(status.pending_count, Ordering::Relaxed);
        self.is_processing.store(status.is_processing, Ordering::Relaxed);
    }
}
