//! Captured DOM element snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::TabId;

/// Computed style per pseudo-state (`default`, `:hover`, ...), then per property.
pub type ComputedCss = BTreeMap<String, BTreeMap<String, String>>;

/// Snapshot of a user-picked DOM node.
///
/// Only meaningful together with `tab_id`: consumers must treat it as absent
/// while another tab is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedElement {
    #[serde(rename = "outerHTML")]
    pub outer_html: String,
    pub selector: String,
    pub tab_id: TabId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_css: Option<ComputedCss>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<BoxMetrics>,
}

impl CapturedElement {
    /// Whether this capture belongs to `tab`.
    pub fn is_owned_by(&self, tab: TabId) -> bool {
        self.tab_id == tab
    }

    /// Last segment of the DOM path, used as a short label.
    pub fn summary(&self) -> &str {
        self.selector
            .rsplit('>')
            .next()
            .map(str::trim)
            .unwrap_or(&self.selector)
    }
}

/// Box-model metrics of a captured element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxMetrics {
    pub width: f64,
    pub height: f64,
    pub margin: Edges,
    pub padding: Edges,
    pub border: Edges,
}

/// Four CSS edge values as rendered by the page (e.g. `"8px"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl std::fmt::Display for Edges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}
