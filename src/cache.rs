//! The external cache capability.
//!
//! The query cache itself lives outside this crate (it belongs to whatever
//! data layer the consuming application uses). Reconciliation talks to it
//! through [`CacheStore`], addressed by the typed [`CacheKey`] space below.
//!
//! Rules are not the cache's only writers — optimistic updates from direct
//! user actions land in the same store — so every rule tolerates arbitrary
//! prior state.

use serde_json::Value as JsonValue;
use std::fmt;

/// Addressable cache entries the reconciler knows about.
///
/// Keys with an id address a single object or the collection scoped to that
/// object; the rest address topic-wide collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The entity list for the active topic (including type-filtered views).
    Entities,
    /// A single entity by id.
    Entity(String),
    /// Facts derived from edges touching an entity.
    EntityFacts(String),
    /// Relationships (edges) touching an entity.
    Relationships(String),
    /// Search results. Invalidated broadly; queries are not addressable here.
    Search,
    /// The episode list for the active topic.
    Episodes,
    /// The session list for the active topic.
    Sessions,
    /// A single session's detail view.
    Session(String),
    /// Per-day ingestion statistics.
    DayStats,
    /// The project list.
    Projects,
    /// The project navigation tree.
    ProjectNav,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Entities => write!(f, "entities"),
            CacheKey::Entity(id) => write!(f, "entity/{}", id),
            CacheKey::EntityFacts(id) => write!(f, "entity-facts/{}", id),
            CacheKey::Relationships(id) => write!(f, "relationships/{}", id),
            CacheKey::Search => write!(f, "search"),
            CacheKey::Episodes => write!(f, "episodes"),
            CacheKey::Sessions => write!(f, "sessions"),
            CacheKey::Session(id) => write!(f, "session/{}", id),
            CacheKey::DayStats => write!(f, "day-stats"),
            CacheKey::Projects => write!(f, "projects"),
            CacheKey::ProjectNav => write!(f, "project-nav"),
        }
    }
}

/// A whole family of id-parameterized keys, for broad invalidation when the
/// affected ids are unknown (e.g. a deleted edge whose endpoints the event
/// does not name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyScope {
    /// Every `Relationships(_)` key.
    Relationships,
    /// Every `EntityFacts(_)` key.
    EntityFacts,
}

/// How an invalidation should behave for views that are currently rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidateMode {
    /// Mark stale; the next read refetches.
    Lazy,
    /// Mark stale and refetch immediately if the view is active.
    ForceIfActive,
}

/// Capability handle to the external cache.
///
/// Implementations must be safe to call from spawned reconciliation tasks.
/// Every method is a plain in-memory mutation from the reconciler's point of
/// view; any network refetch triggered by an invalidation is the store's
/// own concern.
pub trait CacheStore: Send + Sync {
    /// Read the cached value for `key`, if present.
    fn read(&self, key: &CacheKey) -> Option<JsonValue>;

    /// Replace the cached value for `key`.
    fn write(&self, key: CacheKey, value: JsonValue);

    /// Transform the cached value for `key` in place. The updater receives
    /// the current value (or `None`) and returns the new value (or `None`
    /// to remove the entry).
    fn update(&self, key: CacheKey, updater: &mut dyn FnMut(Option<JsonValue>) -> Option<JsonValue>);

    /// Mark `key` stale so the next read triggers a refetch.
    fn invalidate(&self, key: CacheKey, mode: InvalidateMode);

    /// Mark every key in `scope` stale. Used when an event does not carry
    /// enough ids to target individual keys.
    fn invalidate_scope(&self, scope: KeyScope, mode: InvalidateMode);

    /// Delete the entry for `key`. Must be a no-op when the entry is absent.
    fn remove(&self, key: CacheKey);

    /// Drop the entire cache. Used only for destructive group deletion.
    fn clear(&self);
}
