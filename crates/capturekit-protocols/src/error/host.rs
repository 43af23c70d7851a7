//! Tab host errors.

use thiserror::Error;

use crate::types::TabId;

#[derive(Debug, Error)]
pub enum HostError {
    /// The on-page picker is not present in the tab (tab closed or never injected).
    #[error("Receiving end does not exist in tab {0}")]
    ReceiverMissing(TabId),

    #[error("Tab not found: {0}")]
    TabNotFound(TabId),

    #[error("Script injection failed: {0}")]
    InjectionFailed(String),

    #[error("Host error: {0}")]
    Other(String),
}

impl HostError {
    /// Whether the failure only means the page side is gone.
    pub fn is_receiver_missing(&self) -> bool {
        matches!(self, HostError::ReceiverMissing(_) | HostError::TabNotFound(_))
    }
}
