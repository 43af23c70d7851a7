//! Storage keys, per partition.

// Durable partition.
pub const MOST_RECENT_REPOS: &str = "mostRecentRepos";
pub const IS_CAPTURING_LOGS: &str = "isCapturingLogs";
pub const IS_CAPTURING_NETWORK: &str = "isCapturingNetwork";
pub const IS_CAPTURING_CSS: &str = "isCapturingCSS";
pub const DEBUGGING_TAB_ID: &str = "debuggingTabId";
pub const SOURCES_CACHE: &str = "sourcesCache";
pub const HISTORY_CACHE: &str = "historyCache";
pub const API_KEY: &str = "apiKey";

pub const DURABLE: &[&str] = &[
    MOST_RECENT_REPOS,
    IS_CAPTURING_LOGS,
    IS_CAPTURING_NETWORK,
    IS_CAPTURING_CSS,
    DEBUGGING_TAB_ID,
    SOURCES_CACHE,
    HISTORY_CACHE,
    API_KEY,
];

// Ephemeral partition.
pub const CAPTURED_ELEMENT: &str = "capturedElement";
pub const CAPTURED_TAB_ID: &str = "capturedTabId";
pub const VIEW_STATE: &str = "viewState";
pub const DRAFT_TASK_TEXT: &str = "draftTaskText";

pub const EPHEMERAL: &[&str] = &[CAPTURED_ELEMENT, CAPTURED_TAB_ID, VIEW_STATE, DRAFT_TASK_TEXT];
