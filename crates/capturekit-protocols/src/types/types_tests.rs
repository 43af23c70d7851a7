use super::*;

#[test]
fn test_captured_element_wire_names() {
    let json = serde_json::json!({
        "outerHTML": "<button>Go</button>",
        "selector": "body > main > button",
        "tabId": 7
    });
    let element: CapturedElement = serde_json::from_value(json).unwrap();
    assert_eq!(element.outer_html, "<button>Go</button>");
    assert_eq!(element.tab_id, 7);
    assert!(element.computed_css.is_none());
    assert_eq!(element.summary(), "button");
    assert!(element.is_owned_by(7));
    assert!(!element.is_owned_by(8));
}

#[test]
fn test_flags_drive_debugger() {
    let mut flags = CaptureFlags::default();
    assert!(!flags.wants_debugger());
    flags.css = true;
    assert!(!flags.wants_debugger());
    flags.network = true;
    assert!(flags.wants_debugger());
}

#[test]
fn test_view_state_roundtrip_str() {
    for view in [ViewState::Select, ViewState::Task, ViewState::Result, ViewState::History] {
        assert_eq!(view.to_string().parse::<ViewState>().unwrap(), view);
    }
    assert!("elsewhere".parse::<ViewState>().is_err());
    assert_eq!(serde_json::to_string(&ViewState::Task).unwrap(), "\"task\"");
}

#[test]
fn test_session_labels() {
    let session: RemoteSession = serde_json::from_value(serde_json::json!({
        "id": "123",
        "title": "Fix button",
        "state": "COMPLETED",
        "sourceContext": {
            "source": "sources/github/acme/web",
            "githubRepoContext": {"startingBranch": "develop"}
        }
    }))
    .unwrap();
    assert_eq!(session.repo_label(), "acme/web");
    assert_eq!(session.branch_label(), "develop");

    let bare = RemoteSession::default();
    assert_eq!(bare.repo_label(), "N/A");
    assert_eq!(bare.branch_label(), "main");
}

#[test]
fn test_source_default_branch() {
    let source: Source = serde_json::from_value(serde_json::json!({
        "id": "sources/github/acme/web",
        "name": "acme/web",
        "githubRepo": {"owner": "acme", "repo": "web", "defaultBranch": {"displayName": "main"}}
    }))
    .unwrap();
    assert_eq!(source.default_branch(), Some("main"));
}

#[test]
fn test_network_record_pending() {
    let record: CapturedNetworkRecord = serde_json::from_value(serde_json::json!({
        "requestId": "r1",
        "url": "https://example.com/api",
        "method": "GET",
        "timestamp": 12.5
    }))
    .unwrap();
    assert!(record.is_pending());
    assert!(record.headers.is_empty());
}
