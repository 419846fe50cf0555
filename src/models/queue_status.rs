use serde::Deserialize;

/// Payload of `queue.status` events.
///
/// Queue depth is a momentary server-side figure. It drives the live
/// counters in [`QueueState`](crate::live::QueueState) and is never written
/// into the cache.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QueueStatusPayload {
    /// Episodes waiting in the ingestion queue.
    pub pending_count: u32,
    /// Whether a worker is currently processing.
    pub is_processing: bool,
}
