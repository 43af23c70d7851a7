//! Records accumulated while a debugger session is attached.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One console API call seen on the debugged tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedLogRecord {
    /// ISO-8601 timestamp with millisecond precision.
    pub timestamp: String,
    /// Console severity as reported by the page (`log`, `warning`, `error`, ...).
    pub level: String,
    pub message: String,
}

/// One network request seen on the debugged tab.
///
/// Response fields are filled in later and may never arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedNetworkRecord {
    pub request_id: String,
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_data: Option<String>,
    /// Monotonic protocol timestamp in seconds.
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
}

impl CapturedNetworkRecord {
    /// Whether the response has not been seen yet.
    pub fn is_pending(&self) -> bool {
        self.status.is_none()
    }
}
