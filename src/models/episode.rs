use serde::Deserialize;

/// Payload of `episode.created` / `episode.deleted` events.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EpisodePayload {
    /// Episode UUID.
    pub id: Option<String>,
    /// Owning session, when the episode belongs to one.
    pub session_id: Option<String>,
}
