//! Wire shapes of the task API.

use serde::{Deserialize, Serialize};

use capturekit_protocols::{GithubRepo, GithubRepoContext, RemoteSession, Source, SourceContext};

/// A source as the API returns it. `name` is the resource name used to
/// reference the source; `id` is the short display form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSource {
    pub name: String,
    #[serde(default)]
    pub id: String,
    pub github_repo: Option<GithubRepo>,
}

impl From<RawSource> for Source {
    fn from(raw: RawSource) -> Self {
        Source {
            id: raw.name,
            name: raw.id,
            github_repo: raw.github_repo,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListSourcesResponse {
    #[serde(default)]
    pub sources: Vec<RawSource>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListSessionsResponse {
    #[serde(default)]
    pub sessions: Vec<RemoteSession>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSessionRequest {
    pub prompt: String,
    pub source_context: SourceContext,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub message: Option<String>,
}

/// A task ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub prompt: String,
    pub title: String,
    /// Source resource name (`sources/github/owner/repo`).
    pub source: String,
    /// Empty when the user did not pick one.
    pub starting_branch: String,
}

impl From<&NewTask> for CreateSessionRequest {
    fn from(task: &NewTask) -> Self {
        CreateSessionRequest {
            prompt: task.prompt.clone(),
            source_context: SourceContext {
                source: task.source.clone(),
                github_repo_context: Some(GithubRepoContext {
                    starting_branch: task.starting_branch.clone(),
                }),
            },
            title: task.title.clone(),
        }
    }
}
