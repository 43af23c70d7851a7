//! Shapes returned by the remote task API and cached locally.

use serde::{Deserialize, Serialize};

/// A repository the task API can target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Full resource name, e.g. `sources/github/owner/repo`.
    pub id: String,
    /// Short display name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<GithubRepo>,
}

impl Source {
    /// Default branch display name, if the repo reports one.
    pub fn default_branch(&self) -> Option<&str> {
        self.github_repo
            .as_ref()
            .and_then(|r| r.default_branch.as_ref())
            .map(|b| b.display_name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubRepo {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<Branch>,
    #[serde(default)]
    pub branches: Vec<Branch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub display_name: String,
}

/// A unit of work created through the task API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSession {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_context: Option<SourceContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

impl RemoteSession {
    /// `owner/repo` taken from the source resource name.
    pub fn repo_label(&self) -> String {
        self.source_context
            .as_ref()
            .map(|ctx| {
                let parts: Vec<&str> = ctx.source.rsplit('/').take(2).collect();
                parts.into_iter().rev().collect::<Vec<_>>().join("/")
            })
            .unwrap_or_else(|| "N/A".to_string())
    }

    /// Starting branch, `main` when the API omits it.
    pub fn branch_label(&self) -> &str {
        self.source_context
            .as_ref()
            .and_then(|ctx| ctx.github_repo_context.as_ref())
            .map(|g| g.starting_branch.as_str())
            .filter(|b| !b.is_empty())
            .unwrap_or("main")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceContext {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo_context: Option<GithubRepoContext>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubRepoContext {
    #[serde(default)]
    pub starting_branch: String,
}

/// Cached source listing with the time it was fetched (ms since epoch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesCache {
    pub sources: Vec<Source>,
    pub timestamp: i64,
}

/// Cached recent-session listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryCache {
    pub sessions: Vec<RemoteSession>,
}
