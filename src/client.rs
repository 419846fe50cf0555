//! Main lattice-link client with builder pattern.
//!
//! Wires the router, the reconciler, the live queue counters, and the
//! connection manager into one explicitly constructed instance. The owning
//! context (whatever manages the active topic) creates it, passes it by
//! reference to consumers, and drops it on topic change or teardown.

use std::sync::Arc;

use crate::api::{GraphApi, HttpGraphApi};
use crate::cache::CacheStore;
use crate::connection::ConnectionManager;
use crate::error::{LatticeLinkError, Result};
use crate::live::QueueState;
use crate::models::{ConnectionState, SyncOptions};
use crate::notify::{LogNotifier, Notifier};
use crate::reconcile::CacheReconciler;
use crate::router::{EventRouter, ListenerGuard};

/// Client for one Lattice server, synchronizing one topic at a time.
///
/// # Examples
///
/// ```rust,no_run
/// use lattice_link::LatticeLinkClient;
/// # use std::sync::Arc;
/// # use lattice_link::CacheStore;
/// # async fn example(cache: Arc<dyn CacheStore>) -> Result<(), Box<dyn std::error::Error>> {
/// let client = LatticeLinkClient::builder()
///     .base_url("https://graph.example.com")
///     .cache(cache)
///     .build()?;
///
/// client.connect("proj1").await?;
/// println!("state: {}", client.state());
/// client.disconnect().await;
/// # Ok(())
/// # }
/// ```
pub struct LatticeLinkClient {
    base_url: String,
    cache: Arc<dyn CacheStore>,
    api: Arc<dyn GraphApi>,
    notifier: Arc<dyn Notifier>,
    options: SyncOptions,
    router: Arc<EventRouter>,
    queue: Arc<QueueState>,
    manager: ConnectionManager,
    // Guards for the active reconciler's router registrations. Replaced
    // wholesale on topic change so stale rules never fire for a new topic.
    reconciler_guards: std::sync::Mutex<Vec<ListenerGuard>>,
}

impl LatticeLinkClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> LatticeLinkClientBuilder {
        LatticeLinkClientBuilder::new()
    }

    /// Connect to the push stream for `topic`, replacing any previous topic.
    ///
    /// Registers a fresh [`CacheReconciler`] scoped to `topic` before the
    /// transport opens, so no event can slip through unfiltered.
    pub async fn connect(&self, topic: &str) -> Result<()> {
        let reconciler = Arc::new(CacheReconciler::new(
            topic,
            Arc::clone(&self.cache),
            Arc::clone(&self.api),
            Arc::clone(&self.notifier),
            Arc::clone(&self.queue),
        ));
        let guards = reconciler.attach(&self.router);
        {
            let mut held = self
                .reconciler_guards
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            *held = guards;
        }
        self.manager.connect(&self.base_url, topic).await
    }

    /// Close the transport, cancel reconnection, and detach the active
    /// reconciler.
    pub async fn disconnect(&self) {
        self.manager.disconnect().await;
        self.reconciler_guards
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Current connection state, for display.
    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    /// Register a connection-state listener.
    pub fn add_state_listener(
        &self,
        listener: impl Fn(ConnectionState) + Send + Sync + 'static,
    ) -> ListenerGuard {
        self.manager.add_state_listener(listener)
    }

    /// The event router, for consumers that want raw envelopes alongside
    /// cache reconciliation.
    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }

    /// Live ingestion-queue counters.
    pub fn queue_state(&self) -> &Arc<QueueState> {
        &self.queue
    }

    /// The configured options.
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }
}

impl std::fmt::Debug for LatticeLinkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatticeLinkClient")
            .field("base_url", &self.base_url)
            .field("state", &self.state())
            .finish()
    }
}

/// Builder for [`LatticeLinkClient`].
#[derive(Default)]
pub struct LatticeLinkClientBuilder {
    base_url: Option<String>,
    cache: Option<Arc<dyn CacheStore>>,
    api: Option<Arc<dyn GraphApi>>,
    notifier: Option<Arc<dyn Notifier>>,
    options: Option<SyncOptions>,
}

impl LatticeLinkClientBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server's HTTP(S) origin. Required.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the external cache the reconciler mutates. Required.
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the fallback-fetch client. Defaults to [`HttpGraphApi`]
    /// against the configured base URL.
    pub fn graph_api(mut self, api: Arc<dyn GraphApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Override the notifier. Defaults to [`LogNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Override the connection options.
    pub fn options(mut self, options: SyncOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Build the client. Validates the base URL eagerly and spawns the
    /// (idle) connection task.
    pub fn build(self) -> Result<LatticeLinkClient> {
        let base_url = self.base_url.ok_or_else(|| {
            LatticeLinkError::ConfigurationError("base_url is required".to_string())
        })?;
        // Fail fast on unusable origins; the topic is validated per connect.
        crate::connection::resolve_stream_url(&base_url, "probe")?;

        let cache = self.cache.ok_or_else(|| {
            LatticeLinkError::ConfigurationError("a cache store is required".to_string())
        })?;
        let api: Arc<dyn GraphApi> = self
            .api
            .unwrap_or_else(|| Arc::new(HttpGraphApi::new(base_url.clone())));
        let notifier: Arc<dyn Notifier> =
            self.notifier.unwrap_or_else(|| Arc::new(LogNotifier));
        let options = self.options.unwrap_or_default();

        let router = Arc::new(EventRouter::new());
        let queue = Arc::new(QueueState::new());
        let manager = ConnectionManager::new(
            Arc::clone(&router),
            Arc::clone(&notifier),
            options.clone(),
        );

        Ok(LatticeLinkClient {
            base_url,
            cache,
            api,
            notifier,
            options,
            router,
            queue,
            manager,
            reconciler_guards: std::sync::Mutex::new(Vec::new()),
        })
    }
}
