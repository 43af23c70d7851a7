//! Debugger driver errors and their classification.

use thiserror::Error;

use crate::types::TabId;

/// Phrases the driver uses when the debuggee is already gone.
const NOT_ATTACHED_PHRASES: &[&str] = &[
    "No debugger with given target id",
    "Target is not attached",
    "Debugger is not attached",
    "Session with given id not found",
];

#[derive(Debug, Error)]
pub enum DriverError {
    /// The driver refused to attach.
    #[error("Cannot attach to tab {tab}: {message}")]
    AttachRefused { tab: TabId, message: String },

    /// No session exists for the tab.
    #[error("Debugger is not attached to the tab with id: {0}")]
    NotAttached(TabId),

    /// A protocol command failed.
    #[error("{method} failed: {message}")]
    Command { method: String, message: String },

    /// Transport-level failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Classified driver failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// The session is already gone; state should be corrected silently.
    NotAttached,
    /// Anything else; surfaced to the user.
    Other,
}

impl DriverError {
    pub fn kind(&self) -> DriverErrorKind {
        match self {
            DriverError::NotAttached(_) => DriverErrorKind::NotAttached,
            other if is_not_attached_message(&other.to_string()) => DriverErrorKind::NotAttached,
            _ => DriverErrorKind::Other,
        }
    }

    pub fn is_not_attached(&self) -> bool {
        self.kind() == DriverErrorKind::NotAttached
    }
}

/// The single place raw driver text is matched.
pub fn is_not_attached_message(message: &str) -> bool {
    NOT_ATTACHED_PHRASES
        .iter()
        .any(|phrase| message.contains(phrase))
}
