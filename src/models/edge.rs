use serde::Deserialize;

/// Payload of `edge.created` / `edge.updated` / `edge.deleted` events.
///
/// Edge events are the most aggressively trimmed on the wire: a created edge
/// typically carries only its `id`, and a deleted edge may not even name its
/// endpoints. Reconciliation fetches the full edge over REST when it needs
/// the endpoint ids to target relationship caches.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EdgePayload {
    /// Edge UUID.
    pub id: Option<String>,
    /// Source node UUID, when denormalized.
    pub source_id: Option<String>,
    /// Target node UUID, when denormalized.
    pub target_id: Option<String>,
    /// Relation name.
    pub name: Option<String>,
    /// Natural-language fact the edge represents.
    pub fact: Option<String>,
}
