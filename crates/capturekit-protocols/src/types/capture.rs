//! Capture flags and panel view state.

use serde::{Deserialize, Serialize};

/// User-selected diagnostic context.
///
/// `css` only affects the submitted task; it never drives the debugger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFlags {
    pub logs: bool,
    pub network: bool,
    pub css: bool,
}

impl CaptureFlags {
    /// Whether a debugger session should exist.
    pub fn wants_debugger(&self) -> bool {
        self.logs || self.network
    }
}

/// Which panel the UI is showing. Passed through, never interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    #[default]
    Select,
    Task,
    Result,
    History,
}

impl std::fmt::Display for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ViewState::Select => "select",
            ViewState::Task => "task",
            ViewState::Result => "result",
            ViewState::History => "history",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ViewState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "select" => Ok(ViewState::Select),
            "task" => Ok(ViewState::Task),
            "result" => Ok(ViewState::Result),
            "history" => Ok(ViewState::History),
            other => Err(format!("unknown view state: {}", other)),
        }
    }
}
