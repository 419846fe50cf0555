use serde::Deserialize;

/// Payload of `entity.created` / `entity.deleted` events.
///
/// Only `id` is reliably present; creation events from the ingestion pipeline
/// often arrive before denormalization completes, so every descriptive field
/// is optional and reconciliation falls back to refetching.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EntityPayload {
    /// Node UUID.
    pub id: Option<String>,
    /// Display name, when the server included it.
    pub name: Option<String>,
    /// Type labels attached to the node.
    pub labels: Option<Vec<String>>,
    /// Model-generated summary, when available.
    pub summary: Option<String>,
}
