//! Sample data.

use serde_json::{Value, json};

use capturekit_protocols::{
    BoxMetrics, Branch, CapturedElement, Edges, GithubRepo, GithubRepoContext, RemoteSession,
    Source, SourceContext, TabId,
};

pub fn element(tab: TabId) -> CapturedElement {
    CapturedElement {
        outer_html: "<button class=\"buy\">Buy</button>".to_string(),
        selector: "html > body > div.cart > button.buy".to_string(),
        tab_id: tab,
        computed_css: None,
        dimensions: None,
    }
}

pub fn element_with_details(tab: TabId) -> CapturedElement {
    let mut css = std::collections::BTreeMap::new();
    css.insert(
        "default".to_string(),
        [
            ("color".to_string(), "rgb(0, 0, 0)".to_string()),
            ("display".to_string(), "inline-block".to_string()),
        ]
        .into_iter()
        .collect(),
    );
    let edges = |v: &str| Edges {
        top: v.to_string(),
        right: v.to_string(),
        bottom: v.to_string(),
        left: v.to_string(),
    };
    CapturedElement {
        computed_css: Some(css),
        dimensions: Some(BoxMetrics {
            width: 120.0,
            height: 32.5,
            margin: edges("0px"),
            padding: edges("4px"),
            border: edges("1px"),
        }),
        ..element(tab)
    }
}

/// A source named `owner/repo` with `main` as default branch.
pub fn source(owner: &str, repo: &str) -> Source {
    Source {
        id: format!("sources/github/{}/{}", owner, repo),
        name: format!("{}/{}", owner, repo),
        github_repo: Some(GithubRepo {
            owner: owner.to_string(),
            repo: repo.to_string(),
            default_branch: Some(Branch {
                display_name: "main".to_string(),
            }),
            branches: vec![Branch {
                display_name: "main".to_string(),
            }],
        }),
    }
}

pub fn session(id: &str, title: &str) -> RemoteSession {
    RemoteSession {
        name: format!("sessions/{}", id),
        id: id.to_string(),
        title: title.to_string(),
        state: Some("QUEUED".to_string()),
        source_context: Some(SourceContext {
            source: "sources/github/acme/web".to_string(),
            github_repo_context: Some(GithubRepoContext {
                starting_branch: "main".to_string(),
            }),
        }),
        create_time: None,
    }
}

/// `Runtime.consoleAPICalled` params.
pub fn console_event(level: &str, args: Value, timestamp_ms: f64) -> Value {
    json!({ "type": level, "args": args, "timestamp": timestamp_ms })
}

/// `Network.requestWillBeSent` params.
pub fn request_event(request_id: &str, url: &str, method: &str) -> Value {
    json!({
        "requestId": request_id,
        "timestamp": 1234.5,
        "request": {
            "url": url,
            "method": method,
            "headers": { "Accept": "*/*" }
        }
    })
}

/// `Network.responseReceived` params.
pub fn response_event(request_id: &str, status: i64) -> Value {
    json!({
        "requestId": request_id,
        "response": {
            "status": status,
            "headers": { "Content-Type": "application/json" }
        }
    })
}
