//! Error types for lattice-link operations.

use std::fmt;

/// Errors surfaced by connection management, frame decoding, and cache
/// reconciliation.
#[derive(Debug)]
pub enum LatticeLinkError {
    /// Invalid client configuration (bad base URL, missing required field).
    ConfigurationError(String),

    /// The WebSocket transport failed to open or was lost.
    TransportError(String),

    /// A frame or response body violated the wire contract.
    ProtocolError(String),

    /// A reconciliation rule failed to apply.
    ReconciliationError(String),

    /// A deadline elapsed (connect handshake, request).
    TimeoutError(String),

    /// The REST API answered with a non-success status.
    ApiError {
        /// HTTP status code.
        status_code: u16,
        /// Response body, if any.
        message: String,
    },

    /// Reconnection attempts were exhausted.
    CapacityError(String),
}

impl fmt::Display for LatticeLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatticeLinkError::ConfigurationError(msg) => {
                write!(f, "Configuration error: {}", msg)
            },
            LatticeLinkError::TransportError(msg) => write!(f, "Transport error: {}", msg),
            LatticeLinkError::ProtocolError(msg) => write!(f, "Protocol error: {}", msg),
            LatticeLinkError::ReconciliationError(msg) => {
                write!(f, "Reconciliation error: {}", msg)
            },
            LatticeLinkError::TimeoutError(msg) => write!(f, "Timeout: {}", msg),
            LatticeLinkError::ApiError {
                status_code,
                message,
            } => write!(f, "API error ({}): {}", status_code, message),
            LatticeLinkError::CapacityError(msg) => write!(f, "Capacity error: {}", msg),
        }
    }
}

impl std::error::Error for LatticeLinkError {}

impl From<reqwest::Error> for LatticeLinkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LatticeLinkError::TimeoutError(e.to_string())
        } else if let Some(status) = e.status() {
            LatticeLinkError::ApiError {
                status_code: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            LatticeLinkError::TransportError(e.to_string())
        }
    }
}

impl From<serde_json::Error> for LatticeLinkError {
    fn from(e: serde_json::Error) -> Self {
        LatticeLinkError::ProtocolError(e.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LatticeLinkError>;
