use serde::Deserialize;

/// Payload of `project.deleted` events.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectPayload {
    /// Project UUID.
    pub id: Option<String>,
    /// Project display name, for the user-facing notification.
    pub name: Option<String>,
}
