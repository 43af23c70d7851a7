//! User intents and their replies.

use serde::Serialize;
use tokio::sync::oneshot;

use capturekit_debugger::SessionPhase;
use capturekit_protocols::{CaptureFlags, CapturedElement, Source, TabId, ViewState};

/// Something the user asked for from the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Panel opened; answers with the saved draft.
    PanelOpened,
    SaveDraft(String),
    SetView(ViewState),
    GetPanelData,
    StartSelection,
    CancelSelection,
    SubmitTask {
        task: String,
        /// Source resource name.
        repository_id: String,
        branch: Option<String>,
    },
    ToggleLogCapture(bool),
    ToggleNetworkCapture(bool),
    ToggleCssCapture(bool),
    FetchSources,
    FetchHistory,
    SetApiKey(String),
    Status,
}

/// What the panel needs to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelData {
    /// Present only when the active tab owns the capture.
    pub element: Option<CapturedElement>,
    pub recent_repos: Vec<Source>,
    pub flags: CaptureFlags,
    pub view: ViewState,
}

/// Diagnostic view of the core.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub phase: SessionPhase,
    pub debugging_tab: Option<TabId>,
    pub captured_tab: Option<TabId>,
    pub flags: CaptureFlags,
    pub view: ViewState,
    pub log_records: usize,
    pub network_records: usize,
    pub has_api_key: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ack,
    Draft(String),
    PanelData(Box<PanelData>),
    Status(StatusReport),
}

/// An intent plus an optional reply slot.
#[derive(Debug)]
pub struct Command {
    pub intent: Intent,
    pub reply: Option<oneshot::Sender<Reply>>,
}

impl Command {
    /// Command whose reply the caller waits for.
    pub fn request(intent: Intent) -> (Self, oneshot::Receiver<Reply>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                intent,
                reply: Some(tx),
            },
            rx,
        )
    }

    /// Fire-and-forget command.
    pub fn send(intent: Intent) -> Self {
        Self {
            intent,
            reply: None,
        }
    }
}
