use super::*;
use serde_json::json;

#[test]
fn test_request_omits_empty_fields() {
    let req = CdpRequest {
        id: 7,
        method: "Target.getTargets".to_string(),
        params: None,
        session_id: None,
    };
    let text = serde_json::to_string(&req).unwrap();
    assert_eq!(text, r#"{"id":7,"method":"Target.getTargets"}"#);
}

#[test]
fn test_request_with_session() {
    let req = CdpRequest {
        id: 1,
        method: "Runtime.enable".to_string(),
        params: Some(json!({})),
        session_id: Some("S1".to_string()),
    };
    let value = serde_json::to_value(&req).unwrap();
    assert_eq!(value["sessionId"], "S1");
}

#[test]
fn test_event_frame() {
    let frame: CdpResponse = serde_json::from_value(json!({
        "method": "Runtime.consoleAPICalled",
        "params": {"type": "log"},
        "sessionId": "S1"
    }))
    .unwrap();
    assert!(frame.id.is_none());
    let event = frame.into_event().unwrap();
    assert_eq!(event.method, "Runtime.consoleAPICalled");
    assert_eq!(event.session_id.as_deref(), Some("S1"));
}

#[test]
fn test_error_frame() {
    let frame: CdpResponse = serde_json::from_value(json!({
        "id": 3,
        "error": {"code": -32000, "message": "No target with given id found"}
    }))
    .unwrap();
    assert_eq!(frame.error.unwrap().code, -32000);
}

#[test]
fn test_browser_version_names() {
    let version: BrowserVersion = serde_json::from_value(json!({
        "Browser": "Chrome/126.0",
        "Protocol-Version": "1.3",
        "User-Agent": "Mozilla/5.0",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/browser/abc"
    }))
    .unwrap();
    assert_eq!(version.protocol_version, "1.3");
}

#[test]
fn test_target_info_page() {
    let info: TargetInfo = serde_json::from_value(json!({
        "targetId": "T1",
        "type": "page",
        "title": "Example",
        "url": "https://example.com",
        "attached": false
    }))
    .unwrap();
    assert!(info.is_page());
}
