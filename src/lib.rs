//! # lattice-link
//!
//! Rust client for Lattice knowledge-graph servers. Keeps a locally held,
//! query-oriented cache in sync with server-side mutations performed by
//! background agents, by consuming a push event stream over a persistent
//! WebSocket instead of polling.
//!
//! The crate is built around three pieces:
//!
//! - [`ConnectionManager`] — one transport per topic, a finite connection
//!   state machine, and reconnection with exponential backoff;
//! - [`EventRouter`] — a type-indexed publish/subscribe registry fanning
//!   decoded envelopes out to handlers, with per-handler failure isolation;
//! - [`CacheReconciler`] — per-event-type rules translating envelopes into
//!   cache mutations (patch, invalidate, remove, clear).
//!
//! External collaborators are capability traits: [`CacheStore`] for the
//! cache, [`GraphApi`] for fallback REST fetches when a push payload is
//! partial, and [`Notifier`] for terminal user-facing conditions.
//!
//! # Example
//!
//! ```rust,no_run
//! use lattice_link::LatticeLinkClient;
//! # use std::sync::Arc;
//! # use lattice_link::CacheStore;
//!
//! # async fn example(cache: Arc<dyn CacheStore>) -> Result<(), Box<dyn std::error::Error>> {
//! let client = LatticeLinkClient::builder()
//!     .base_url("https://graph.example.com")
//!     .cache(cache)
//!     .build()?;
//!
//! client.connect("proj1").await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod client;
pub mod connection;
pub mod error;
pub mod live;
pub mod models;
pub mod notify;
pub mod reconcile;
pub mod router;

pub use api::{FullEdge, GraphApi, HttpGraphApi};
pub use cache::{CacheKey, CacheStore, InvalidateMode, KeyScope};
pub use client::{LatticeLinkClient, LatticeLinkClientBuilder};
pub use connection::{resolve_stream_url, ConnectionManager};
pub use error::{LatticeLinkError, Result};
pub use live::QueueState;
pub use models::{
    decode_frame, ConnectionState, Envelope, EventKind, QueueStatusPayload, ServerEvent,
    SyncOptions,
};
pub use notify::{LogNotifier, Notifier, NotifyLevel};
pub use reconcile::CacheReconciler;
pub use router::{EventRouter, ListenerGuard};
