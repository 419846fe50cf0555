//! The user-notification capability.
//!
//! The core never renders anything. Terminal conditions (reconnect attempts
//! exhausted, destructive group deletion, project removal) are emitted
//! through [`Notifier`]; an adapter at the UI boundary decides how to show
//! them.

use std::fmt;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    /// Informational: something changed that the user may want to know about.
    Info,
    /// Warning: degraded but recovering.
    Warning,
    /// Terminal: explicit user action is required to recover.
    Error,
}

impl fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyLevel::Info => write!(f, "info"),
            NotifyLevel::Warning => write!(f, "warning"),
            NotifyLevel::Error => write!(f, "error"),
        }
    }
}

/// Capability for surfacing terminal or noteworthy conditions to the user.
pub trait Notifier: Send + Sync {
    /// Deliver a notification. Implementations should not block.
    fn notify(&self, level: NotifyLevel, message: &str);
}

/// A notifier that only logs. Useful as a default and in headless contexts.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        match level {
            NotifyLevel::Info => log::info!("[notify] {}", message),
            NotifyLevel::Warning => log::warn!("[notify] {}", message),
            NotifyLevel::Error => log::error!("[notify] {}", message),
        }
    }
}
