//! Shared test doubles: an in-memory cache, a recording notifier, and a
//! scriptable graph API.

#![allow(dead_code)]

use async_trait::async_trait;
use lattice_link::{
    CacheKey, CacheStore, FullEdge, GraphApi, InvalidateMode, KeyScope, LatticeLinkError,
    Notifier, NotifyLevel,
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory [`CacheStore`] that records every invalidation.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, JsonValue>>,
    invalidations: Mutex<Vec<(CacheKey, InvalidateMode)>>,
    scope_invalidations: Mutex<Vec<(KeyScope, InvalidateMode)>>,
    clears: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> HashMap<CacheKey, JsonValue> {
        self.entries.lock().unwrap().clone()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn invalidations_of(&self, key: &CacheKey) -> usize {
        self.invalidations
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .count()
    }

    pub fn scope_invalidations_of(&self, scope: KeyScope) -> usize {
        self.scope_invalidations
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == scope)
            .count()
    }

    pub fn last_mode_of(&self, key: &CacheKey) -> Option<InvalidateMode> {
        self.invalidations
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, mode)| *mode)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn invalidation_count(&self) -> usize {
        self.invalidations.lock().unwrap().len() + self.scope_invalidations.lock().unwrap().len()
    }
}

impl CacheStore for MemoryCache {
    fn read(&self, key: &CacheKey) -> Option<JsonValue> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn write(&self, key: CacheKey, value: JsonValue) {
        self.entries.lock().unwrap().insert(key, value);
    }

    fn update(&self, key: CacheKey, updater: &mut dyn FnMut(Option<JsonValue>) -> Option<JsonValue>) {
        let mut entries = self.entries.lock().unwrap();
        let current = entries.remove(&key);
        if let Some(next) = updater(current) {
            entries.insert(key, next);
        }
    }

    fn invalidate(&self, key: CacheKey, mode: InvalidateMode) {
        self.invalidations.lock().unwrap().push((key, mode));
    }

    fn invalidate_scope(&self, scope: KeyScope, mode: InvalidateMode) {
        self.scope_invalidations.lock().unwrap().push((scope, mode));
    }

    fn remove(&self, key: CacheKey) {
        self.entries.lock().unwrap().remove(&key);
    }

    fn clear(&self) {
        self.entries.lock().unwrap().clear();
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

/// [`Notifier`] that records every call.
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(NotifyLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(NotifyLevel, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        self.calls.lock().unwrap().push((level, message.to_string()));
    }
}

/// Scriptable [`GraphApi`]: maps edge ids to full edges, errors otherwise.
#[derive(Default)]
pub struct StubGraphApi {
    edges: Mutex<HashMap<String, FullEdge>>,
    fetches: AtomicUsize,
}

impl StubGraphApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edge(self, id: &str, source_id: &str, target_id: &str) -> Self {
        self.edges.lock().unwrap().insert(
            id.to_string(),
            FullEdge {
                id: id.to_string(),
                source_id: Some(source_id.to_string()),
                target_id: Some(target_id.to_string()),
                name: None,
                fact: None,
            },
        );
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphApi for StubGraphApi {
    async fn fetch_edge(&self, id: &str) -> lattice_link::Result<FullEdge> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.edges
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| LatticeLinkError::ApiError {
                status_code: 404,
                message: format!("edge {} not found", id),
            })
    }
}

/// Poll `condition` until it holds or the deadline passes.
pub async fn wait_for(condition: impl Fn() -> bool, what: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
