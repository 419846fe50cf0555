//! Push-stream connection manager.
//!
//! Owns one WebSocket per active topic and drives the connection state
//! machine:
//!
//! ```text
//! disconnected → connecting → connected
//! connected → reconnecting          (abnormal close)
//! reconnecting → connecting → connected | error
//! ```
//!
//! `error` is reached only after the reconnect attempt counter exceeds the
//! configured maximum, and is terminal until a manual `connect`. Reconnection
//! uses exponential backoff with a cap, accelerated further when a fresh
//! connection drops inside the stability window.
//!
//! The public [`ConnectionManager`] is a handle; a background tokio task owns
//! the socket, the backoff sleep, and the keepalive deadlines, and receives
//! commands over an mpsc channel. Teardown deterministically cancels any
//! pending backoff sleep, so a stale timer can never reconnect an old topic.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream};
use url::Url;

use crate::error::{LatticeLinkError, Result};
use crate::models::{decode_frame, ConnectionState, SyncOptions};
use crate::notify::{Notifier, NotifyLevel};
use crate::router::{EventRouter, ListenerGuard};

type WebSocketStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close codes that suppress reconnection: 1000 (normal), 1001 (going away).
const CLEAN_CLOSE_CODES: [u16; 2] = [1000, 1001];

/// Fixed path prefix for the push stream; the topic id is appended.
const STREAM_PATH_PREFIX: &str = "/v1/stream";

/// Sleep duration far enough out to be effectively "never".
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Compute the backoff delay before reconnect attempt `attempts`.
///
/// `delay = min(2^attempts * base_delay_ms, max_reconnect_delay_ms)`.
pub(crate) fn backoff_delay(attempts: u32, options: &SyncOptions) -> Duration {
    let ms = std::cmp::min(
        options.base_delay_ms.saturating_mul(2u64.saturating_pow(attempts)),
        options.max_reconnect_delay_ms,
    );
    Duration::from_millis(ms)
}

/// Derive the WebSocket URL for `topic` from an HTTP(S) origin.
///
/// `http` becomes `ws`, `https` becomes `wss`; `ws`/`wss` pass through. The
/// path is fixed at `/v1/stream/<topic>`. URLs carrying credentials, query
/// parameters, or fragments are rejected to fail fast on programmer error.
pub fn resolve_stream_url(base_url: &str, topic: &str) -> Result<String> {
    let base = Url::parse(base_url.trim()).map_err(|e| {
        LatticeLinkError::ConfigurationError(format!("Invalid base_url '{}': {}", base_url, e))
    })?;

    if base.host_str().is_none() {
        return Err(LatticeLinkError::ConfigurationError(
            "base_url must include a host".to_string(),
        ));
    }
    if !base.username().is_empty() || base.password().is_some() {
        return Err(LatticeLinkError::ConfigurationError(
            "base_url must not include credentials".to_string(),
        ));
    }
    if base.query().is_some() || base.fragment().is_some() {
        return Err(LatticeLinkError::ConfigurationError(
            "base_url must not include query parameters or fragments".to_string(),
        ));
    }
    if topic.is_empty() || topic.contains('/') {
        return Err(LatticeLinkError::ConfigurationError(format!(
            "Invalid topic '{}'",
            topic
        )));
    }

    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(LatticeLinkError::ConfigurationError(format!(
                "Unsupported base_url scheme '{}'; expected http(s) or ws(s)",
                other
            )));
        },
    };

    let mut ws_url = base;
    ws_url.set_scheme(scheme).map_err(|_| {
        LatticeLinkError::ConfigurationError("Failed to set stream URL scheme".to_string())
    })?;
    ws_url.set_path(&format!("{}/{}", STREAM_PATH_PREFIX, topic));

    Ok(ws_url.to_string())
}

// ── State cell with listeners ───────────────────────────────────────────────

type StateListener = Arc<dyn Fn(ConnectionState) + Send + Sync>;

/// Current connection state plus the listener set notified on transitions.
struct StateCell {
    current: RwLock<ConnectionState>,
    listeners: RwLock<HashMap<u64, StateListener>>,
    next_id: AtomicU64,
}

impl StateCell {
    fn new() -> Self {
        Self {
            current: RwLock::new(ConnectionState::Disconnected),
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn get(&self) -> ConnectionState {
        *self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Move to `next`, notifying listeners. A transition to the current
    /// state is suppressed entirely.
    fn transition(&self, next: ConnectionState) {
        {
            let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
            if *current == next {
                return;
            }
            log::debug!("Connection state: {} -> {}", *current, next);
            *current = next;
        }
        let snapshot: Vec<StateListener> = {
            let listeners = self.listeners.read().unwrap_or_else(|e| e.into_inner());
            listeners.values().cloned().collect()
        };
        for listener in snapshot {
            listener(next);
        }
    }

    fn add_listener(self: &Arc<Self>, listener: StateListener) -> ListenerGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, listener);

        let cell: Weak<StateCell> = Arc::downgrade(self);
        ListenerGuard::new(move || {
            if let Some(cell) = cell.upgrade() {
                cell.listeners
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&id);
            }
        })
    }
}

// ── Commands ────────────────────────────────────────────────────────────────

/// Commands sent from the public handle to the background connection task.
enum ConnCmd {
    /// Open (or switch to) a session for `(ws_url, topic)`. No-op when the
    /// same session is already open.
    Connect { ws_url: String, topic: String },
    /// Close the transport and stop all reconnection.
    Disconnect,
    /// Tear the task down entirely.
    Shutdown,
}

/// The (url, topic) pair a session is bound to.
#[derive(Clone, PartialEq, Eq)]
struct Session {
    ws_url: String,
    topic: String,
}

// ── Public handle ───────────────────────────────────────────────────────────

/// Handle to the push-stream connection for one topic context.
///
/// Constructed explicitly by whichever context manages the active topic;
/// dropping it tears the background task (and any pending reconnect) down.
pub struct ConnectionManager {
    cmd_tx: mpsc::Sender<ConnCmd>,
    state: Arc<StateCell>,
    _task: JoinHandle<()>,
}

impl ConnectionManager {
    /// Create a manager that dispatches decoded envelopes to `router` and
    /// reports terminal conditions through `notifier`. No connection is
    /// opened until [`connect`](Self::connect).
    pub fn new(
        router: Arc<EventRouter>,
        notifier: Arc<dyn Notifier>,
        options: SyncOptions,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<ConnCmd>(64);
        let state = Arc::new(StateCell::new());

        let task_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            connection_task(cmd_rx, router, notifier, options, task_state).await;
        });

        Self {
            cmd_tx,
            state,
            _task: task,
        }
    }

    /// Connect to the push stream for `topic` on the given HTTP(S) origin.
    ///
    /// No-op when already connected to the same (url, topic) with an open
    /// transport; otherwise any existing session is torn down first. An
    /// invalid URL or topic fails fast with a
    /// [`ConfigurationError`](LatticeLinkError::ConfigurationError).
    pub async fn connect(&self, base_url: &str, topic: &str) -> Result<()> {
        let ws_url = resolve_stream_url(base_url, topic)?;
        self.cmd_tx
            .send(ConnCmd::Connect {
                ws_url,
                topic: topic.to_string(),
            })
            .await
            .map_err(|_| {
                LatticeLinkError::TransportError("Connection task is not running".to_string())
            })
    }

    /// Close the transport, cancel any pending reconnect, and transition to
    /// `Disconnected`. The only path (besides attempt exhaustion) that
    /// permanently stops reconnection.
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(ConnCmd::Disconnect).await;
    }

    /// The current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Register a listener for state transitions. Transitions to the
    /// current state are suppressed; the guard revokes on drop.
    pub fn add_state_listener(
        &self,
        listener: impl Fn(ConnectionState) + Send + Sync + 'static,
    ) -> ListenerGuard {
        self.state.add_listener(Arc::new(listener))
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        // Best-effort shutdown signal.
        let _ = self.cmd_tx.try_send(ConnCmd::Shutdown);
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state.get())
            .finish()
    }
}

// ── Background connection task ──────────────────────────────────────────────

/// What the select loop decided should happen next.
enum LoopStep {
    /// Transport lost abnormally; schedule a reconnect.
    Reconnect,
    /// Server closed cleanly; stop without reconnecting.
    CleanClose,
    /// A command replaced or ended the session.
    Handled,
}

async fn connection_task(
    mut cmd_rx: mpsc::Receiver<ConnCmd>,
    router: Arc<EventRouter>,
    notifier: Arc<dyn Notifier>,
    options: SyncOptions,
    state: Arc<StateCell>,
) {
    let mut session: Option<Session> = None;
    let mut ws: Option<WebSocketStream> = None;
    // Failed/unstable attempt counter. Reset only by a stable open or an
    // explicit connect/disconnect.
    let mut attempts: u32 = 0;
    let mut last_open: Option<Instant> = None;
    // Set when a transport loss requires a scheduled retry; cleared when the
    // session is parked (terminal error) or torn down.
    let mut reconnect_pending = false;
    // Skip the backoff sleep for the attempt right after an explicit connect.
    let mut immediate_attempt = false;
    let mut shutdown = false;

    loop {
        if shutdown {
            if let Some(mut stream) = ws.take() {
                let _ = stream.close(None).await;
            }
            state.transition(ConnectionState::Disconnected);
            return;
        }

        if let Some(stream) = ws.as_mut() {
            let step = run_connected(
                stream,
                &mut cmd_rx,
                &router,
                &options,
                &mut session,
                &mut attempts,
                &mut shutdown,
                &mut immediate_attempt,
            )
            .await;

            match step {
                LoopStep::Reconnect => {
                    ws = None;
                    state.transition(ConnectionState::Reconnecting);
                    reconnect_pending = true;
                },
                LoopStep::CleanClose => {
                    ws = None;
                    session = None;
                    attempts = 0;
                    reconnect_pending = false;
                    state.transition(ConnectionState::Disconnected);
                },
                LoopStep::Handled => {
                    // A Connect command swapped the session out, or a
                    // Disconnect ended it. Close the old transport.
                    if let Some(mut stream) = ws.take() {
                        let _ = stream.close(None).await;
                    }
                    if session.is_none() {
                        attempts = 0;
                        reconnect_pending = false;
                        state.transition(ConnectionState::Disconnected);
                    }
                },
            }
            continue;
        }

        let Some(current) = session.clone() else {
            // Parked with nothing to do; wait for commands.
            match cmd_rx.recv().await {
                Some(ConnCmd::Connect { ws_url, topic }) => {
                    session = Some(Session { ws_url, topic });
                    attempts = 0;
                    last_open = None;
                    immediate_attempt = true;
                    reconnect_pending = false;
                },
                Some(ConnCmd::Disconnect) => {
                    state.transition(ConnectionState::Disconnected);
                },
                Some(ConnCmd::Shutdown) | None => {
                    shutdown = true;
                },
            }
            continue;
        };

        // ── Not connected with a live session: attempt or schedule ──────
        if !immediate_attempt && reconnect_pending {
            if attempts >= options.max_reconnect_attempts {
                let err = LatticeLinkError::CapacityError(format!(
                    "maximum reconnection attempts ({}) reached for topic {}",
                    options.max_reconnect_attempts, current.topic
                ));
                log::warn!("{}", err);
                notifier.notify(
                    NotifyLevel::Error,
                    "Connection lost: maximum reconnection attempts reached. Reconnect manually to resume updates.",
                );
                state.transition(ConnectionState::Error);
                reconnect_pending = false;
                // The session stays recorded but parked; only an explicit
                // connect restarts it.
                session = None;
                continue;
            }

            let delay = backoff_delay(attempts, &options);
            attempts += 1;
            log::info!(
                "Reconnecting to topic {} in {:?} (attempt {})",
                current.topic,
                delay,
                attempts
            );

            // The backoff sleep is cancellable: any command interrupts it.
            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);
            let mut interrupted = false;
            loop {
                tokio::select! {
                    biased;
                    cmd = cmd_rx.recv() => {
                        match cmd {
                            Some(ConnCmd::Connect { ws_url, topic }) => {
                                session = Some(Session { ws_url, topic });
                                attempts = 0;
                                last_open = None;
                                immediate_attempt = true;
                                reconnect_pending = false;
                                interrupted = true;
                                break;
                            },
                            Some(ConnCmd::Disconnect) => {
                                session = None;
                                attempts = 0;
                                reconnect_pending = false;
                                state.transition(ConnectionState::Disconnected);
                                interrupted = true;
                                break;
                            },
                            Some(ConnCmd::Shutdown) | None => {
                                shutdown = true;
                                interrupted = true;
                                break;
                            },
                        }
                    }
                    _ = &mut sleep => break,
                }
            }
            if interrupted {
                continue;
            }
        }
        immediate_attempt = false;

        // Attempt the connection.
        state.transition(ConnectionState::Connecting);
        match establish(&current.ws_url, &options).await {
            Ok(stream) => {
                let now = Instant::now();
                let unstable = attempts > 0
                    && last_open.is_some_and(|prev| {
                        now.duration_since(prev)
                            < Duration::from_millis(options.stability_window_ms)
                    });
                if unstable {
                    // Still flapping: keep accelerating the backoff. Note
                    // this counter was already bumped when the retry was
                    // scheduled, so one flaky cycle can count twice.
                    attempts += 1;
                    log::debug!(
                        "Connection to {} reopened inside the stability window (attempts now {})",
                        current.topic,
                        attempts
                    );
                } else {
                    attempts = 0;
                }
                last_open = Some(now);
                reconnect_pending = false;
                ws = Some(stream);
                state.transition(ConnectionState::Connected);
                log::info!("Connected to push stream for topic {}", current.topic);
            },
            Err(e) => {
                log::warn!(
                    "Connection attempt to topic {} failed: {}",
                    current.topic,
                    e
                );
                state.transition(ConnectionState::Reconnecting);
                reconnect_pending = true;
            },
        }
    }
}

/// Open the WebSocket, honoring the configured handshake timeout.
async fn establish(ws_url: &str, options: &SyncOptions) -> Result<WebSocketStream> {
    let connect = connect_async(ws_url);
    let result = if options.connect_timeout_ms > 0 {
        match tokio::time::timeout(options.connect_timeout(), connect).await {
            Ok(inner) => inner,
            Err(_) => {
                return Err(LatticeLinkError::TimeoutError(format!(
                    "Connection timeout ({:?})",
                    options.connect_timeout()
                )));
            },
        }
    } else {
        connect.await
    };

    match result {
        Ok((stream, _response)) => Ok(stream),
        Err(e) => Err(LatticeLinkError::TransportError(format!(
            "Connection failed: {}",
            e
        ))),
    }
}

/// Drive one open connection: read frames, process commands, send keepalive
/// pings, and watch the pong deadline. Returns when the transport is lost,
/// closed, or replaced.
#[allow(clippy::too_many_arguments)]
async fn run_connected(
    stream: &mut WebSocketStream,
    cmd_rx: &mut mpsc::Receiver<ConnCmd>,
    router: &EventRouter,
    options: &SyncOptions,
    session: &mut Option<Session>,
    attempts: &mut u32,
    shutdown: &mut bool,
    immediate_attempt: &mut bool,
) -> LoopStep {
    let keepalive = options.keepalive_interval();
    let has_keepalive = !keepalive.is_zero();
    let keepalive_dur = if has_keepalive { keepalive } else { FAR_FUTURE };
    let mut idle_deadline = Instant::now() + keepalive_dur;

    let pong_timeout = options.pong_timeout();
    let has_pong_timeout = has_keepalive && !pong_timeout.is_zero();
    let mut awaiting_pong = false;
    let mut pong_deadline = Instant::now() + FAR_FUTURE;

    loop {
        let idle_sleep = tokio::time::sleep_until(idle_deadline);
        tokio::pin!(idle_sleep);
        let pong_sleep = tokio::time::sleep_until(pong_deadline);
        tokio::pin!(pong_sleep);

        tokio::select! {
            biased;

            // No frame arrived since our ping: the connection is dead.
            _ = &mut pong_sleep, if has_pong_timeout && awaiting_pong => {
                log::warn!(
                    "Pong timeout ({:?}): server unresponsive, reconnecting",
                    pong_timeout
                );
                return LoopStep::Reconnect;
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ConnCmd::Connect { ws_url, topic }) => {
                        let same = session
                            .as_ref()
                            .is_some_and(|s| s.ws_url == ws_url && s.topic == topic);
                        if same {
                            log::debug!("connect: already connected to {}, no-op", topic);
                            continue;
                        }
                        *session = Some(Session { ws_url, topic });
                        *attempts = 0;
                        *immediate_attempt = true;
                        return LoopStep::Handled;
                    },
                    Some(ConnCmd::Disconnect) => {
                        *session = None;
                        return LoopStep::Handled;
                    },
                    Some(ConnCmd::Shutdown) | None => {
                        *shutdown = true;
                        return LoopStep::Handled;
                    },
                }
            }

            _ = &mut idle_sleep, if has_keepalive && !awaiting_pong => {
                if let Err(e) = stream.send(Message::Ping(Bytes::new())).await {
                    log::warn!("Keepalive ping failed: {}", e);
                    return LoopStep::Reconnect;
                }
                if has_pong_timeout {
                    awaiting_pong = true;
                    pong_deadline = Instant::now() + pong_timeout;
                }
                idle_deadline = Instant::now() + keepalive_dur;
            }

            frame = stream.next() => {
                // Any frame proves the connection is alive.
                idle_deadline = Instant::now() + keepalive_dur;
                if awaiting_pong {
                    awaiting_pong = false;
                    pong_deadline = Instant::now() + FAR_FUTURE;
                }

                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match decode_frame(&text) {
                            Ok(Some(envelope)) => router.dispatch(&envelope),
                            Ok(None) => {}, // unrecognized event_type, already logged
                            Err(e) => {
                                // Malformed frames are dropped; the stream
                                // itself stays healthy.
                                log::warn!("Dropping undecodable frame: {}", e);
                            },
                        }
                    },
                    Some(Ok(Message::Binary(data))) => {
                        log::debug!("Ignoring unexpected binary frame ({} bytes)", data.len());
                    },
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = stream.send(Message::Pong(payload)).await;
                    },
                    Some(Ok(Message::Pong(_))) => {},
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.as_ref().map(|f| u16::from(f.code));
                        let clean = code.is_none_or(|c| CLEAN_CLOSE_CODES.contains(&c));
                        if clean {
                            log::info!("Server closed the stream (code {:?})", code);
                            return LoopStep::CleanClose;
                        }
                        log::warn!("Abnormal close (code {:?}), reconnecting", code);
                        return LoopStep::Reconnect;
                    },
                    Some(Ok(Message::Frame(_))) => {},
                    Some(Err(e)) => {
                        log::warn!("Transport error: {}", e);
                        return LoopStep::Reconnect;
                    },
                    None => {
                        log::warn!("Stream ended without close frame, reconnecting");
                        return LoopStep::Reconnect;
                    },
                }
            }
        }
    }
}
