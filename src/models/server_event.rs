use serde::Deserialize;

use super::edge::EdgePayload;
use super::entity::EntityPayload;
use super::episode::EpisodePayload;
use super::group::GroupPayload;
use super::project::ProjectPayload;
use super::queue_status::QueueStatusPayload;
use super::session::SessionPayload;

/// Typed push event decoded from the stream.
///
/// This is a closed enum: adding a server event type means adding a variant
/// here, which the compiler then forces through every dispatch site. Frames
/// carrying an `event_type` outside this set are dropped before decoding
/// (see [`decode_frame`](super::envelope::decode_frame)).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event_type", content = "data")]
pub enum ServerEvent {
    /// A node was added to the graph.
    #[serde(rename = "entity.created")]
    EntityCreated(EntityPayload),

    /// A node was removed from the graph.
    #[serde(rename = "entity.deleted")]
    EntityDeleted(EntityPayload),

    /// A relationship was added. The payload usually lacks denormalized
    /// endpoint names; reconciliation fetches the full edge over REST.
    #[serde(rename = "edge.created")]
    EdgeCreated(EdgePayload),

    /// A relationship's fact or validity changed.
    #[serde(rename = "edge.updated")]
    EdgeUpdated(EdgePayload),

    /// A relationship was removed. Endpoints are not known from the event.
    #[serde(rename = "edge.deleted")]
    EdgeDeleted(EdgePayload),

    /// An episode finished ingestion.
    #[serde(rename = "episode.created")]
    EpisodeCreated(EpisodePayload),

    /// An episode was removed.
    #[serde(rename = "episode.deleted")]
    EpisodeDeleted(EpisodePayload),

    /// A session was removed.
    #[serde(rename = "session.deleted")]
    SessionDeleted(SessionPayload),

    /// A project was removed.
    #[serde(rename = "project.deleted")]
    ProjectDeleted(ProjectPayload),

    /// The whole group (tenant graph) was destroyed server-side.
    #[serde(rename = "group.deleted")]
    GroupDeleted(GroupPayload),

    /// Ingestion queue progress. Live state only, never cached.
    #[serde(rename = "queue.status")]
    QueueStatus(QueueStatusPayload),
}

impl ServerEvent {
    /// The fieldless discriminant used as the router registry key.
    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::EntityCreated(_) => EventKind::EntityCreated,
            ServerEvent::EntityDeleted(_) => EventKind::EntityDeleted,
            ServerEvent::EdgeCreated(_) => EventKind::EdgeCreated,
            ServerEvent::EdgeUpdated(_) => EventKind::EdgeUpdated,
            ServerEvent::EdgeDeleted(_) => EventKind::EdgeDeleted,
            ServerEvent::EpisodeCreated(_) => EventKind::EpisodeCreated,
            ServerEvent::EpisodeDeleted(_) => EventKind::EpisodeDeleted,
            ServerEvent::SessionDeleted(_) => EventKind::SessionDeleted,
            ServerEvent::ProjectDeleted(_) => EventKind::ProjectDeleted,
            ServerEvent::GroupDeleted(_) => EventKind::GroupDeleted,
            ServerEvent::QueueStatus(_) => EventKind::QueueStatus,
        }
    }
}

/// Recognized event types, as router registry keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    EntityCreated,
    EntityDeleted,
    EdgeCreated,
    EdgeUpdated,
    EdgeDeleted,
    EpisodeCreated,
    EpisodeDeleted,
    SessionDeleted,
    ProjectDeleted,
    GroupDeleted,
    QueueStatus,
}

impl EventKind {
    /// All recognized kinds, in no particular order.
    pub const ALL: [EventKind; 11] = [
        EventKind::EntityCreated,
        EventKind::EntityDeleted,
        EventKind::EdgeCreated,
        EventKind::EdgeUpdated,
        EventKind::EdgeDeleted,
        EventKind::EpisodeCreated,
        EventKind::EpisodeDeleted,
        EventKind::SessionDeleted,
        EventKind::ProjectDeleted,
        EventKind::GroupDeleted,
        EventKind::QueueStatus,
    ];

    /// Map a wire `event_type` string to its kind, or `None` if unrecognized.
    pub fn from_wire(event_type: &str) -> Option<EventKind> {
        let kind = match event_type {
            "entity.created" => EventKind::EntityCreated,
            "entity.deleted" => EventKind::EntityDeleted,
            "edge.created" => EventKind::EdgeCreated,
            "edge.updated" => EventKind::EdgeUpdated,
            "edge.deleted" => EventKind::EdgeDeleted,
            "episode.created" => EventKind::EpisodeCreated,
            "episode.deleted" => EventKind::EpisodeDeleted,
            "session.deleted" => EventKind::SessionDeleted,
            "project.deleted" => EventKind::ProjectDeleted,
            "group.deleted" => EventKind::GroupDeleted,
            "queue.status" => EventKind::QueueStatus,
            _ => return None,
        };
        Some(kind)
    }

    /// The wire `event_type` string for this kind.
    pub fn as_wire(&self) -> &'static str {
        match self {
            EventKind::EntityCreated => "entity.created",
            EventKind::EntityDeleted => "entity.deleted",
            EventKind::EdgeCreated => "edge.created",
            EventKind::EdgeUpdated => "edge.updated",
            EventKind::EdgeDeleted => "edge.deleted",
            EventKind::EpisodeCreated => "episode.created",
            EventKind::EpisodeDeleted => "episode.deleted",
            EventKind::SessionDeleted => "session.deleted",
            EventKind::ProjectDeleted => "project.deleted",
            EventKind::GroupDeleted => "group.deleted",
            EventKind::QueueStatus => "queue.status",
        }
    }
}
