use serde::Deserialize;

/// Payload of `session.deleted` events.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionPayload {
    /// Session UUID.
    pub id: Option<String>,
}
