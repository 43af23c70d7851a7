//! Tab host capability: everything the core needs from the browser besides
//! the debugger itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::types::TabId;

/// The active tab as reported by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub url: Option<String>,
}

impl TabInfo {
    /// Whether the URL falls under one of the given scheme prefixes.
    pub fn is_restricted(&self, schemes: &[String]) -> bool {
        match &self.url {
            Some(url) => schemes.iter().any(|s| url.starts_with(s.as_str())),
            None => false,
        }
    }
}

/// Commands understood by the on-page picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PickerDirective {
    StartSelection,
    CleanupSelector,
}

/// Toolbar indicator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Cleared,
    Success,
}

#[async_trait]
pub trait TabHost: Send + Sync {
    /// The active tab of the focused window, if any.
    async fn active_tab(&self) -> Result<Option<TabInfo>, HostError>;

    /// Inject the picker into a tab (idempotent).
    async fn inject_picker(&self, tab: TabId) -> Result<(), HostError>;

    /// Send a directive to the picker in a tab.
    async fn send_directive(&self, tab: TabId, directive: PickerDirective) -> Result<(), HostError>;

    /// Update the toolbar indicator.
    fn set_indicator(&self, indicator: Indicator);
}
