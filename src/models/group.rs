use serde::Deserialize;

/// Payload of `group.deleted` events.
///
/// The envelope's `group_id` names the deleted group; the payload itself
/// carries nothing the reconciler relies on.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupPayload {
    /// Reason the server deleted the group, when provided.
    pub reason: Option<String>,
}
