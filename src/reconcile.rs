//! Per-event-type cache reconciliation rules.
//!
//! Each rule translates one inbound envelope into cache mutations: patch an
//! entry in place, invalidate keys for refetch, remove an entry, or clear
//! the whole cache. Rules run synchronously on the dispatch path in arrival
//! order; only fallback REST fetches are spawned, so the router never waits
//! on the network.
//!
//! Every rule is idempotent — delivery is at-least-once, and the cache is
//! shared with optimistic writers, so a rule may observe (and must tolerate)
//! any prior state.

use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::api::GraphApi;
use crate::cache::{CacheKey, CacheStore, InvalidateMode, KeyScope};
use crate::error::Result;
use crate::live::QueueState;
use crate::models::{
    EdgePayload, EntityPayload, Envelope, EpisodePayload, EventKind, ProjectPayload,
    ServerEvent, SessionPayload,
};
use crate::notify::{Notifier, NotifyLevel};
use crate::router::{EventRouter, ListenerGuard};

/// Applies reconciliation rules for a single active topic.
///
/// Constructed by the client per `connect(topic)` and registered on the
/// router via [`attach`](CacheReconciler::attach). Stateless across
/// invocations except for the external cache and live counters it mutates.
pub struct CacheReconciler {
    topic: String,
    cache: Arc<dyn CacheStore>,
    api: Arc<dyn GraphApi>,
    notifier: Arc<dyn Notifier>,
    queue: Arc<QueueState>,
}

impl CacheReconciler {
    /// Create a reconciler scoped to `topic`.
    pub fn new(
        topic: impl Into<String>,
        cache: Arc<dyn CacheStore>,
        api: Arc<dyn GraphApi>,
        notifier: Arc<dyn Notifier>,
        queue: Arc<QueueState>,
    ) -> Self {
        Self {
            topic: topic.into(),
            cache,
            api,
            notifier,
            queue,
        }
    }

    /// The topic this reconciler filters for.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Register one handler per recognized event kind on `router`.
    ///
    /// The returned guards own the registrations; dropping them detaches the
    /// reconciler.
    pub fn attach(self: &Arc<Self>, router: &EventRouter) -> Vec<ListenerGuard> {
        EventKind::ALL
            .iter()
            .map(|kind| {
                let this = Arc::clone(self);
                router.subscribe(*kind, move |envelope| this.apply(envelope))
            })
            .collect()
    }

    /// Apply the rule for one envelope.
    ///
    /// Events scoped to a different group are no-ops with respect to both
    /// the cache and the live counters.
    pub fn apply(&self, envelope: &Envelope) -> Result<()> {
        if envelope.group_id != self.topic {
            log::debug!(
                "Ignoring {} for group {} (active topic is {})",
                envelope.kind().as_wire(),
                envelope.group_id,
                self.topic
            );
            return Ok(());
        }

        match &envelope.event {
            ServerEvent::EntityCreated(payload) => self.on_entity_created(payload),
            ServerEvent::EntityDeleted(payload) => self.on_entity_deleted(payload),
            ServerEvent::EdgeCreated(payload) => self.on_edge_created(payload),
            ServerEvent::EdgeUpdated(payload) => self.on_edge_updated(payload),
            ServerEvent::EdgeDeleted(payload) => self.on_edge_deleted(payload),
            ServerEvent::EpisodeCreated(payload) => self.on_episode_created(payload),
            ServerEvent::EpisodeDeleted(payload) => self.on_episode_deleted(payload),
            ServerEvent::SessionDeleted(payload) => self.on_session_deleted(payload),
            ServerEvent::ProjectDeleted(payload) => self.on_project_deleted(payload),
            ServerEvent::GroupDeleted(_) => self.on_group_deleted(),
            ServerEvent::QueueStatus(payload) => {
                // Live state only; the cache is never touched.
                self.queue.apply(payload);
            },
        }
        Ok(())
    }

    // ── Entity rules ────────────────────────────────────────────────────

    fn on_entity_created(&self, payload: &EntityPayload) {
        // The list (and its type-filtered views) always needs a refetch.
        self.cache.invalidate(CacheKey::Entities, InvalidateMode::Lazy);

        // Patch the single-entity entry only when the payload is complete
        // enough to merge safely; partial payloads degrade to the refetch
        // already triggered above.
        if let Some(id) = &payload.id {
            if payload.name.is_some() && payload.labels.is_some() {
                let patch = serde_json::json!({
                    "id": id,
                    "name": payload.name,
                    "labels": payload.labels,
                    "summary": payload.summary,
                });
                merge_entry(self.cache.as_ref(), CacheKey::Entity(id.clone()), patch);
            } else {
                self.cache
                    .invalidate(CacheKey::Entity(id.clone()), InvalidateMode::Lazy);
            }
        }
    }

    fn on_entity_deleted(&self, payload: &EntityPayload) {
        match &payload.id {
            Some(id) => {
                self.cache.remove(CacheKey::Entity(id.clone()));
                remove_list_member(self.cache.as_ref(), CacheKey::Entities, id);
                self.cache
                    .invalidate(CacheKey::Relationships(id.clone()), InvalidateMode::Lazy);
                self.cache
                    .invalidate(CacheKey::EntityFacts(id.clone()), InvalidateMode::Lazy);
            },
            None => {
                // Without an id there is nothing to target; refetch the list.
                self.cache.invalidate(CacheKey::Entities, InvalidateMode::Lazy);
            },
        }
    }

    // ── Edge rules ──────────────────────────────────────────────────────

    fn on_edge_created(&self, payload: &EdgePayload) {
        let Some(id) = payload.id.clone() else {
            self.cache.invalidate(CacheKey::Search, InvalidateMode::Lazy);
            return;
        };

        // The event lacks denormalized endpoints; fetch the full edge to
        // target the relationship caches. Fire-and-forget so dispatch of
        // later envelopes is not held up by the network.
        let cache = Arc::clone(&self.cache);
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            match api.fetch_edge(&id).await {
                Ok(edge) => {
                    for endpoint in [edge.source_id, edge.target_id].into_iter().flatten() {
                        cache.invalidate(
                            CacheKey::Relationships(endpoint.clone()),
                            InvalidateMode::Lazy,
                        );
                        cache.invalidate(
                            CacheKey::EntityFacts(endpoint),
                            InvalidateMode::Lazy,
                        );
                    }
                    cache.invalidate(CacheKey::Search, InvalidateMode::Lazy);
                },
                Err(e) => {
                    log::warn!("Fallback fetch for edge {} failed: {}", id, e);
                    // Endpoints stay unknown; degrade to broad invalidation.
                    cache.invalidate_scope(KeyScope::Relationships, InvalidateMode::Lazy);
                    cache.invalidate(CacheKey::Search, InvalidateMode::Lazy);
                },
            }
        });
    }

    fn on_edge_updated(&self, payload: &EdgePayload) {
        self.cache
            .invalidate(CacheKey::Search, InvalidateMode::ForceIfActive);

        let endpoints: Vec<&String> = [payload.source_id.as_ref(), payload.target_id.as_ref()]
            .into_iter()
            .flatten()
            .collect();

        if endpoints.is_empty() {
            self.cache
                .invalidate_scope(KeyScope::Relationships, InvalidateMode::ForceIfActive);
            self.cache
                .invalidate_scope(KeyScope::EntityFacts, InvalidateMode::ForceIfActive);
            return;
        }

        for endpoint in endpoints {
            self.cache.invalidate(
                CacheKey::Relationships(endpoint.clone()),
                InvalidateMode::ForceIfActive,
            );
            self.cache.invalidate(
                CacheKey::EntityFacts(endpoint.clone()),
                InvalidateMode::ForceIfActive,
            );
        }
    }

    fn on_edge_deleted(&self, _payload: &EdgePayload) {
        // Endpoints are unknown from the event alone.
        self.cache
            .invalidate_scope(KeyScope::Relationships, InvalidateMode::Lazy);
        self.cache
            .invalidate_scope(KeyScope::EntityFacts, InvalidateMode::Lazy);
        self.cache.invalidate(CacheKey::Search, InvalidateMode::Lazy);
    }

    // ── Episode / session rules ─────────────────────────────────────────

    fn on_episode_created(&self, payload: &EpisodePayload) {
        self.cache.invalidate(CacheKey::Episodes, InvalidateMode::Lazy);
        self.cache.invalidate(CacheKey::Sessions, InvalidateMode::Lazy);
        self.cache.invalidate(CacheKey::DayStats, InvalidateMode::Lazy);
        if let Some(session_id) = &payload.session_id {
            self.cache
                .invalidate(CacheKey::Session(session_id.clone()), InvalidateMode::Lazy);
        }
    }

    fn on_episode_deleted(&self, payload: &EpisodePayload) {
        if let Some(id) = &payload.id {
            remove_list_member(self.cache.as_ref(), CacheKey::Episodes, id);
        } else {
            self.cache.invalidate(CacheKey::Episodes, InvalidateMode::Lazy);
        }
        self.cache.invalidate(CacheKey::Sessions, InvalidateMode::Lazy);
        self.cache.invalidate(CacheKey::DayStats, InvalidateMode::Lazy);
        if let Some(session_id) = &payload.session_id {
            self.cache
                .invalidate(CacheKey::Session(session_id.clone()), InvalidateMode::Lazy);
        }
    }

    fn on_session_deleted(&self, payload: &SessionPayload) {
        match &payload.id {
            Some(id) => {
                remove_list_member(self.cache.as_ref(), CacheKey::Sessions, id);
                self.cache.remove(CacheKey::Session(id.clone()));
            },
            None => {
                self.cache.invalidate(CacheKey::Sessions, InvalidateMode::Lazy);
            },
        }
        self.cache.invalidate(CacheKey::DayStats, InvalidateMode::Lazy);
    }

    // ── Project / group rules ───────────────────────────────────────────

    fn on_project_deleted(&self, payload: &ProjectPayload) {
        self.cache.invalidate(CacheKey::Projects, InvalidateMode::Lazy);
        self.cache.invalidate(CacheKey::ProjectNav, InvalidateMode::Lazy);
        self.cache.invalidate(CacheKey::Sessions, InvalidateMode::Lazy);

        let name = payload.name.as_deref().unwrap_or("A project");
        self.notifier
            .notify(NotifyLevel::Info, &format!("{} was deleted", name));
    }

    fn on_group_deleted(&self) {
        log::warn!("Group {} deleted server-side; clearing cache", self.topic);
        self.cache.clear();
        self.notifier.notify(
            NotifyLevel::Error,
            "This group was deleted on the server. All local data has been cleared.",
        );
    }
}

impl std::fmt::Debug for CacheReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheReconciler")
            .field("topic", &self.topic)
            .finish()
    }
}

/// Remove the list member with `"id" == id` from the array cached at `key`.
///
/// Absent entries, non-array values, and ids not present in the list are
/// all no-ops: duplicate deliveries and optimistic writers leave the cache
/// in states a rule cannot predict.
fn remove_list_member(cache: &dyn CacheStore, key: CacheKey, id: &str) {
    cache.update(key, &mut |current| match current {
        Some(JsonValue::Array(items)) => Some(JsonValue::Array(
            items
                .into_iter()
                .filter(|item| item.get("id").and_then(JsonValue::as_str) != Some(id))
                .collect(),
        )),
        other => other,
    });
}

/// Merge the fields of `patch` into the object cached at `key`, writing the
/// patch as-is when no entry exists yet.
fn merge_entry(cache: &dyn CacheStore, key: CacheKey, patch: JsonValue) {
    cache.update(key, &mut |current| match current {
        Some(JsonValue::Object(mut existing)) => {
            if let JsonValue::Object(fields) = patch.clone() {
                for (field, value) in fields {
                    if !value.is_null() {
                        existing.insert(field, value);
                    }
                }
            }
            Some(JsonValue::Object(existing))
        },
        _ => Some(patch.clone()),
    });
}
