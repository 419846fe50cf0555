use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection-level options for the push-stream client.
///
/// Controls reconnection timing, the retry limit, and the stability window
/// used to decide whether a fresh connection has settled.
///
/// # Example
///
/// ```rust
/// use lattice_link::SyncOptions;
///
/// let options = SyncOptions::default()
///     .with_max_reconnect_attempts(5)
///     .with_base_delay_ms(500)
///     .with_max_reconnect_delay_ms(10_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Maximum reconnection attempts before entering the terminal error
    /// state. Default: 10.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Initial delay in milliseconds between reconnection attempts.
    /// Doubles per attempt up to `max_reconnect_delay_ms`. Default: 1000.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Cap on the exponential backoff delay, in milliseconds.
    /// Default: 30000.
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// A connection that drops within this window of opening, while prior
    /// attempts are outstanding, is treated as still unstable: the attempt
    /// counter keeps growing instead of resetting. Default: 5000.
    #[serde(default = "default_stability_window_ms")]
    pub stability_window_ms: u64,

    /// Timeout for the WebSocket handshake, in milliseconds. Default: 10000.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Keep-alive ping interval in milliseconds; 0 disables keepalive.
    /// Default: 30000.
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,

    /// Maximum wait for any frame after a keepalive ping before the
    /// connection is considered dead; 0 disables the check. Default: 5000.
    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u64,
}

fn default_max_reconnect_attempts() -> u32 {
    10
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_reconnect_delay_ms() -> u64 {
    30_000
}

fn default_stability_window_ms() -> u64 {
    5000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_keepalive_interval_ms() -> u64 {
    30_000
}

fn default_pong_timeout_ms() -> u64 {
    5000
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: default_max_reconnect_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            stability_window_ms: default_stability_window_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            keepalive_interval_ms: default_keepalive_interval_ms(),
            pong_timeout_ms: default_pong_timeout_ms(),
        }
    }
}

impl SyncOptions {
    /// Create options with defaults. Equivalent to `Default::default()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of reconnection attempts.
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Set the initial reconnection delay in milliseconds.
    pub fn with_base_delay_ms(mut self, ms: u64) -> Self {
        self.base_delay_ms = ms;
        self
    }

    /// Set the backoff delay cap in milliseconds.
    pub fn with_max_reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.max_reconnect_delay_ms = ms;
        self
    }

    /// Set the stability window in milliseconds.
    pub fn with_stability_window_ms(mut self, ms: u64) -> Self {
        self.stability_window_ms = ms;
        self
    }

    /// Set the handshake timeout in milliseconds.
    pub fn with_connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Set the keepalive ping interval in milliseconds (0 disables).
    pub fn with_keepalive_interval_ms(mut self, ms: u64) -> Self {
        self.keepalive_interval_ms = ms;
        self
    }

    /// Set the pong timeout in milliseconds (0 disables).
    pub fn with_pong_timeout_ms(mut self, ms: u64) -> Self {
        self.pong_timeout_ms = ms;
        self
    }

    /// Handshake timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Keepalive interval as a `Duration` (zero when disabled).
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }

    /// Pong timeout as a `Duration` (zero when disabled).
    pub fn pong_timeout(&self) -> Duration {
        Duration::from_millis(self.pong_timeout_ms)
    }
}
