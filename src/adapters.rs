//! Adapter types and utility functions for capturekit.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use capturekit_config::Config;
use capturekit_protocols::{
    HostError, Indicator, KeyValueStore, NotificationBus, PickerDirective, StoreError, TabHost,
    TabId, TabInfo,
};
use capturekit_state::{FileStore, MemoryStore, StateManager};

/// Get the .capturekit directory path.
pub(crate) fn capturekit_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".capturekit"))
        .unwrap_or_else(|| PathBuf::from(".capturekit"))
}

/// Durable partition file inside the configured state directory.
pub(crate) fn durable_path(config: &Config) -> PathBuf {
    config.state.dir_path().join("durable.json")
}

/// Build the state manager over the durable file and a fresh session partition.
pub(crate) async fn open_state(
    config: &Config,
    host: Arc<dyn TabHost>,
) -> Result<Arc<StateManager>, StoreError> {
    let durable: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(durable_path(config)).await?);
    let ephemeral: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let state = StateManager::new(durable, ephemeral, host)
        .with_recent_repos_limit(config.state.recent_repos_limit);
    state.initialize().await;
    Ok(Arc::new(state))
}

pub(crate) fn notification_bus(config: &Config) -> NotificationBus {
    NotificationBus::new(Duration::from_millis(config.notifications.error_dedup_ms))
}

/// Tab host for commands that run without a browser.
///
/// Reports no active tab and refuses picker work.
pub(crate) struct HeadlessHost;

#[async_trait]
impl TabHost for HeadlessHost {
    async fn active_tab(&self) -> Result<Option<TabInfo>, HostError> {
        Ok(None)
    }

    async fn inject_picker(&self, tab: TabId) -> Result<(), HostError> {
        Err(HostError::TabNotFound(tab))
    }

    async fn send_directive(&self, tab: TabId, _directive: PickerDirective) -> Result<(), HostError> {
        Err(HostError::ReceiverMissing(tab))
    }

    fn set_indicator(&self, indicator: Indicator) {
        debug!("Indicator {:?} (no browser)", indicator);
    }
}
