//! Data models for the lattice-link client.
//!
//! Wire types decoded from the push stream, connection state, and the
//! configuration surface. One type per file; everything is re-exported here.

pub mod connection_state;
pub mod edge;
pub mod entity;
pub mod envelope;
pub mod episode;
pub mod group;
pub mod project;
pub mod queue_status;
pub mod server_event;
pub mod session;
pub mod sync_options;

#[cfg(test)]
mod tests;

pub use connection_state::ConnectionState;
pub use edge::EdgePayload;
pub use entity::EntityPayload;
pub use envelope::{decode_frame, Envelope};
pub use episode::EpisodePayload;
pub use group::GroupPayload;
pub use project::ProjectPayload;
pub use queue_status::QueueStatusPayload;
pub use server_event::{EventKind, ServerEvent};
pub use session::SessionPayload;
pub use sync_options::SyncOptions;
