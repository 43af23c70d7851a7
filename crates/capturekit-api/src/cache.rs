//! Stale-while-revalidate listings.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};

use capturekit_protocols::{HistoryCache, Notification, NotificationBus, SourcesCache};
use capturekit_state::StateManager;

use crate::client::TaskApiClient;

/// Serves cached listings immediately, then refreshes them from the API.
pub struct RemoteCaches {
    api: Arc<TaskApiClient>,
    state: Arc<StateManager>,
    notifier: NotificationBus,
}

impl RemoteCaches {
    pub fn new(api: Arc<TaskApiClient>, state: Arc<StateManager>, notifier: NotificationBus) -> Self {
        Self {
            api,
            state,
            notifier,
        }
    }

    /// Emit the cached sources, then fetch every page and emit again if the
    /// list changed.
    pub async fn refresh_sources(&self, api_key: &str) {
        self.state.initialize().await;
        let cached = self.state.sources_cache();
        if let Some(cache) = &cached {
            self.notifier
                .publish(Notification::SourcesLoaded(cache.sources.clone()));
        }

        let fresh = match self.api.list_sources(api_key).await {
            Ok(sources) => sources,
            Err(e) => {
                error!("Failed to fetch sources: {}", e);
                if self.state.sources_cache().is_none() {
                    self.notifier.error("Could not fetch sources.");
                }
                return;
            }
        };

        if cached.as_ref().map(|c| &c.sources) == Some(&fresh) {
            debug!("Sources unchanged ({} entries)", fresh.len());
            return;
        }

        self.state
            .set_sources_cache(SourcesCache {
                sources: fresh.clone(),
                timestamp: Utc::now().timestamp_millis(),
            })
            .await;
        let notification = if cached.is_some() {
            Notification::SourcesRefreshed(fresh)
        } else {
            Notification::SourcesLoaded(fresh)
        };
        self.notifier.publish(notification);
    }

    /// Emit the cached history, then always emit the fresh one.
    pub async fn refresh_history(&self, api_key: &str) {
        self.state.initialize().await;
        let cached = self.state.history_cache();
        if let Some(cache) = &cached {
            self.notifier.publish(Notification::HistoryLoaded {
                sessions: cache.sessions.clone(),
                from_cache: true,
            });
        }

        let fresh = match self.api.list_sessions(api_key).await {
            Ok(sessions) => sessions,
            Err(e) => {
                error!("Failed to fetch session history: {}", e);
                if self.state.history_cache().is_none() {
                    self.notifier.error("Could not fetch session history.");
                }
                return;
            }
        };

        if cached.as_ref().map(|c| &c.sessions) != Some(&fresh) {
            self.state
                .set_history_cache(HistoryCache {
                    sessions: fresh.clone(),
                })
                .await;
        }
        self.notifier.publish(Notification::HistoryLoaded {
            sessions: fresh,
            from_cache: false,
        });
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
