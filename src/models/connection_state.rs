use std::fmt;

/// Current state of the push-stream connection.
///
/// Exactly one value is current per [`ConnectionManager`](crate::ConnectionManager)
/// instance; every transition notifies registered state listeners, with
/// duplicate transitions suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport; nothing scheduled. Initial state, and the result of an
    /// explicit `disconnect()`.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The transport is open and the stream is being consumed.
    Connected,
    /// The transport dropped abnormally; a reconnect is scheduled.
    Reconnecting,
    /// Reconnect attempts exhausted. Terminal until a manual `connect`.
    Error,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Error => "error",
        };
        write!(f, "{}", s)
    }
}
