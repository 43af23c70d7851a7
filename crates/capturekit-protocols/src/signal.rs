//! Lifecycle signals delivered by the browser.

use serde_json::Value;

use crate::types::{CapturedElement, TabId};

/// Load status carried by a tab update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    Loading,
    Complete,
}

/// Everything the browser side can tell the core.
#[derive(Debug, Clone)]
pub enum BrowserSignal {
    /// The user switched to `tab`.
    TabActivated { tab: TabId },
    /// `tab` changed load status or URL.
    TabUpdated {
        tab: TabId,
        status: TabStatus,
        url: Option<String>,
    },
    /// `tab` was closed.
    TabRemoved { tab: TabId },
    /// A protocol event from a debugged tab.
    DebuggerEvent {
        tab: TabId,
        method: String,
        params: Value,
    },
    /// The driver dropped the session on its own (tab closed, user cancelled, ...).
    DebuggerDetached { tab: TabId, reason: String },
    /// The on-page picker captured an element.
    ElementCaptured { element: CapturedElement },
    /// The user aborted the picker (e.g. pressed Escape).
    SelectionCancelled { tab: TabId },
}
