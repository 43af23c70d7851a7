//! Task API client.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use capturekit_config::ApiConfig;
use capturekit_protocols::{RemoteSession, Source};

use crate::error::ApiError;
use crate::types::{CreateSessionRequest, ErrorBody, ListSessionsResponse, ListSourcesResponse, NewTask};

const API_KEY_HEADER: &str = "X-Goog-Api-Key";

/// Client for the remote task API.
///
/// The API key is passed per call; it lives in the durable partition and may
/// change while the client is alive.
pub struct TaskApiClient {
    client: Client,
    base_url: String,
    session_web_url: String,
    history_page_size: u32,
}

impl TaskApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)?;

        let mut builder = Client::builder().connect_timeout(Duration::from_secs(10));
        if config.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_seconds));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url,
            session_web_url: config.session_web_url.trim_end_matches('/').to_string(),
            history_page_size: config.history_page_size,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Browser URL of a created session.
    pub fn session_url(&self, session: &RemoteSession) -> String {
        format!("{}/{}", self.session_web_url, session.id)
    }

    /// Every source, following `nextPageToken` until exhausted.
    pub async fn list_sources(&self, api_key: &str) -> Result<Vec<Source>, ApiError> {
        let url = format!("{}/sources", self.base_url);
        let mut sources = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.authorized(self.client.get(&url), api_key);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ListSourcesResponse = read_listing(request.send().await?).await?;
            sources.extend(page.sources.into_iter().map(Source::from));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Fetched {} sources", sources.len());
        Ok(sources)
    }

    /// Most recent sessions.
    pub async fn list_sessions(&self, api_key: &str) -> Result<Vec<RemoteSession>, ApiError> {
        let url = format!("{}/sessions", self.base_url);
        let request = self
            .authorized(self.client.get(&url), api_key)
            .query(&[("pageSize", self.history_page_size)]);
        let page: ListSessionsResponse = read_listing(request.send().await?).await?;
        debug!("Fetched {} sessions", page.sessions.len());
        Ok(page.sessions)
    }

    /// Create a session for `task`.
    pub async fn create_session(
        &self,
        api_key: &str,
        task: &NewTask,
    ) -> Result<RemoteSession, ApiError> {
        let url = format!("{}/sessions", self.base_url);
        debug!("Creating session on {} ({} prompt chars)", task.source, task.prompt.len());

        let response = self
            .authorized(self.client.post(&url), api_key)
            .json(&CreateSessionRequest::from(task))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("API Error: {}", status.as_u16()));
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        parse_json(response).await
    }

    fn authorized(&self, request: RequestBuilder, api_key: &str) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }
}

async fn read_listing<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: format!("API Error {}: {}", status.as_u16(), body),
        });
    }
    parse_json(response).await
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
