//! Protocol event payloads to capture records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use capturekit_protocols::{CapturedLogRecord, CapturedNetworkRecord};

const UNSERIALIZABLE: &str = "Unserializable object";

/// Build a log record from `Runtime.consoleAPICalled` params.
pub fn console_record(params: &Value) -> CapturedLogRecord {
    let args = params
        .get("args")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    CapturedLogRecord {
        timestamp: iso_timestamp(params.get("timestamp").and_then(Value::as_f64)),
        level: params
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("log")
            .to_string(),
        message: console_message(args),
    }
}

/// Join console arguments with single spaces.
///
/// Strings contribute their value; anything else its description, then its
/// JSON value, then a fixed placeholder.
pub fn console_message(args: &[Value]) -> String {
    args.iter()
        .map(render_arg)
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_arg(arg: &Value) -> String {
    if arg.get("type").and_then(Value::as_str) == Some("string") {
        return arg
            .get("value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
    }
    if let Some(desc) = arg
        .get("description")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
    {
        return desc.to_string();
    }
    match arg.get("value") {
        Some(value) => serde_json::to_string(value).unwrap_or_else(|_| UNSERIALIZABLE.to_string()),
        None => UNSERIALIZABLE.to_string(),
    }
}

/// ISO-8601 UTC with milliseconds, from a protocol wall-clock time in ms.
pub fn iso_timestamp(ms: Option<f64>) -> String {
    let at = ms
        .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms as i64))
        .unwrap_or_else(Utc::now);
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build a pending network record from `Network.requestWillBeSent` params.
pub fn request_record(params: &Value) -> Option<CapturedNetworkRecord> {
    let request_id = params.get("requestId")?.as_str()?;
    let request = params.get("request")?;

    Some(CapturedNetworkRecord {
        request_id: request_id.to_string(),
        url: str_field(request, "url"),
        method: str_field(request, "method"),
        headers: object_field(request, "headers").unwrap_or_default(),
        post_data: request
            .get("postData")
            .and_then(Value::as_str)
            .map(str::to_string),
        timestamp: params
            .get("timestamp")
            .and_then(Value::as_f64)
            .unwrap_or_default(),
        status: None,
        response_headers: None,
        response_body: None,
    })
}

/// Response fields carried by `Network.responseReceived`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseInfo {
    pub request_id: String,
    pub status: Option<i64>,
    pub headers: Option<Map<String, Value>>,
}

pub fn response_info(params: &Value) -> Option<ResponseInfo> {
    let request_id = params.get("requestId")?.as_str()?.to_string();
    let response = params.get("response");
    Some(ResponseInfo {
        request_id,
        status: response
            .and_then(|r| r.get("status"))
            .and_then(Value::as_f64)
            .map(|s| s as i64),
        headers: response.and_then(|r| object_field(r, "headers")),
    })
}

impl ResponseInfo {
    /// Copy status and headers onto the matching record.
    pub fn apply(&self, record: &mut CapturedNetworkRecord) {
        record.status = self.status;
        record.response_headers = self.headers.clone();
    }
}

/// First `limit` characters of `body`.
pub fn truncate_chars(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((end, _)) => body[..end].to_string(),
        None => body.to_string(),
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn object_field(value: &Value, key: &str) -> Option<Map<String, Value>> {
    value.get(key).and_then(Value::as_object).cloned()
}
