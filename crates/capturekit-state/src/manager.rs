//! The state manager.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, error, warn};

use capturekit_protocols::{
    CaptureFlags, CapturedElement, CapturedLogRecord, CapturedNetworkRecord, HistoryCache,
    Indicator, KeyValueStore, Partition, PickerDirective, Source, SourcesCache, TabHost, TabId,
    ViewState,
};

use crate::buffer::RecordBuffer;
use crate::keys;

/// In-memory mirror of every persisted field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    // Durable.
    pub most_recent_repos: Vec<Source>,
    pub flags: CaptureFlags,
    pub debugging_tab_id: Option<TabId>,
    pub sources_cache: Option<SourcesCache>,
    pub history_cache: Option<HistoryCache>,
    pub api_key: Option<String>,
    // Ephemeral.
    pub captured_element: Option<CapturedElement>,
    pub captured_tab_id: Option<TabId>,
    pub view_state: ViewState,
    pub draft_task_text: String,
}

/// Single authoritative accessor/mutator for extension state.
///
/// Getters are synchronous and never block on I/O. Setters update the mirror
/// first, then persist; persistence failures are logged and leave the mirror
/// authoritative until the next full load.
pub struct StateManager {
    durable: Arc<dyn KeyValueStore>,
    ephemeral: Arc<dyn KeyValueStore>,
    host: Arc<dyn TabHost>,
    mirror: RwLock<StateSnapshot>,
    logs: RecordBuffer<CapturedLogRecord>,
    network: RecordBuffer<CapturedNetworkRecord>,
    ready: OnceCell<()>,
    recent_repos_limit: usize,
}

impl StateManager {
    pub fn new(
        durable: Arc<dyn KeyValueStore>,
        ephemeral: Arc<dyn KeyValueStore>,
        host: Arc<dyn TabHost>,
    ) -> Self {
        Self {
            durable,
            ephemeral,
            host,
            mirror: RwLock::new(StateSnapshot::default()),
            logs: RecordBuffer::new(),
            network: RecordBuffer::new(),
            ready: OnceCell::new(),
            recent_repos_limit: 3,
        }
    }

    /// Override how many recent repositories are kept.
    pub fn with_recent_repos_limit(mut self, limit: usize) -> Self {
        self.recent_repos_limit = limit.max(1);
        self
    }

    /// Load every known key from both partitions.
    ///
    /// Concurrent and repeated callers share one load; only the first call
    /// touches the stores.
    pub async fn initialize(&self) {
        self.ready.get_or_init(|| self.load()).await;
    }

    pub fn is_initialized(&self) -> bool {
        self.ready.initialized()
    }

    async fn load(&self) {
        let durable = self.read_partition(Partition::Durable, keys::DURABLE).await;
        let ephemeral = self.read_partition(Partition::Ephemeral, keys::EPHEMERAL).await;

        let mut snapshot = StateSnapshot {
            most_recent_repos: decode(&durable, keys::MOST_RECENT_REPOS).unwrap_or_default(),
            flags: CaptureFlags {
                logs: decode(&durable, keys::IS_CAPTURING_LOGS).unwrap_or_default(),
                network: decode(&durable, keys::IS_CAPTURING_NETWORK).unwrap_or_default(),
                css: decode(&durable, keys::IS_CAPTURING_CSS).unwrap_or_default(),
            },
            debugging_tab_id: decode(&durable, keys::DEBUGGING_TAB_ID),
            sources_cache: decode(&durable, keys::SOURCES_CACHE),
            history_cache: decode(&durable, keys::HISTORY_CACHE),
            api_key: decode::<String>(&durable, keys::API_KEY).filter(|k| !k.is_empty()),
            captured_element: decode(&ephemeral, keys::CAPTURED_ELEMENT),
            captured_tab_id: decode(&ephemeral, keys::CAPTURED_TAB_ID),
            view_state: decode(&ephemeral, keys::VIEW_STATE).unwrap_or_default(),
            draft_task_text: decode(&ephemeral, keys::DRAFT_TASK_TEXT).unwrap_or_default(),
        };
        snapshot.most_recent_repos.truncate(self.recent_repos_limit);

        debug!(
            "State loaded: debugging_tab={:?} captured_tab={:?} flags={:?}",
            snapshot.debugging_tab_id, snapshot.captured_tab_id, snapshot.flags
        );
        *self.mirror.write() = snapshot;
    }

    async fn read_partition(&self, partition: Partition, wanted: &[&str]) -> HashMap<String, Value> {
        match self.store(partition).get(wanted).await {
            Ok(values) => values,
            Err(e) => {
                warn!("Failed to load {} partition, using defaults: {}", partition, e);
                HashMap::new()
            }
        }
    }

    fn store(&self, partition: Partition) -> &Arc<dyn KeyValueStore> {
        match partition {
            Partition::Durable => &self.durable,
            Partition::Ephemeral => &self.ephemeral,
        }
    }

    async fn persist<T: Serialize>(&self, partition: Partition, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                error!("Cannot serialize {}: {}", key, e);
                return;
            }
        };
        match self.store(partition).set(key, value).await {
            Ok(()) => debug!("Persisted {} ({})", key, partition),
            Err(e) => warn!("Failed to persist {} in {} partition: {}", key, partition, e),
        }
    }

    async fn forget(&self, partition: Partition, keys: &[&str]) {
        if let Err(e) = self.store(partition).remove(keys).await {
            warn!("Failed to remove {:?} from {} partition: {}", keys, partition, e);
        }
    }

    // ------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------

    /// Copy of the whole mirror.
    pub fn snapshot(&self) -> StateSnapshot {
        self.mirror.read().clone()
    }

    pub fn capture_flags(&self) -> CaptureFlags {
        self.mirror.read().flags
    }

    pub fn is_capturing_logs(&self) -> bool {
        self.mirror.read().flags.logs
    }

    pub fn is_capturing_network(&self) -> bool {
        self.mirror.read().flags.network
    }

    pub fn is_capturing_css(&self) -> bool {
        self.mirror.read().flags.css
    }

    pub fn debugging_tab_id(&self) -> Option<TabId> {
        self.mirror.read().debugging_tab_id
    }

    pub fn most_recent_repos(&self) -> Vec<Source> {
        self.mirror.read().most_recent_repos.clone()
    }

    pub fn sources_cache(&self) -> Option<SourcesCache> {
        self.mirror.read().sources_cache.clone()
    }

    pub fn history_cache(&self) -> Option<HistoryCache> {
        self.mirror.read().history_cache.clone()
    }

    pub fn api_key(&self) -> Option<String> {
        self.mirror.read().api_key.clone()
    }

    /// The raw captured element, regardless of which tab is active.
    pub fn captured_element(&self) -> Option<CapturedElement> {
        self.mirror.read().captured_element.clone()
    }

    /// The captured element as consumers must see it: present only while its
    /// owning tab is the active one.
    pub fn captured_element_for(&self, active_tab: TabId) -> Option<CapturedElement> {
        let mirror = self.mirror.read();
        if mirror.captured_tab_id != Some(active_tab) {
            return None;
        }
        mirror
            .captured_element
            .as_ref()
            .filter(|e| e.is_owned_by(active_tab))
            .cloned()
    }

    pub fn captured_tab_id(&self) -> Option<TabId> {
        self.mirror.read().captured_tab_id
    }

    pub fn view_state(&self) -> ViewState {
        self.mirror.read().view_state
    }

    pub fn draft_task_text(&self) -> String {
        self.mirror.read().draft_task_text.clone()
    }

    /// Live console records.
    pub fn captured_logs(&self) -> RecordBuffer<CapturedLogRecord> {
        self.logs.clone()
    }

    /// Live network records.
    pub fn captured_network(&self) -> RecordBuffer<CapturedNetworkRecord> {
        self.network.clone()
    }

    pub fn clear_captured_logs(&self) {
        self.logs.clear();
    }

    pub fn clear_captured_network(&self) {
        self.network.clear();
    }

    // ------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------

    pub async fn set_capturing_logs(&self, enabled: bool) {
        self.mirror.write().flags.logs = enabled;
        self.persist(Partition::Durable, keys::IS_CAPTURING_LOGS, &enabled).await;
    }

    pub async fn set_capturing_network(&self, enabled: bool) {
        self.mirror.write().flags.network = enabled;
        self.persist(Partition::Durable, keys::IS_CAPTURING_NETWORK, &enabled).await;
    }

    pub async fn set_capturing_css(&self, enabled: bool) {
        self.mirror.write().flags.css = enabled;
        self.persist(Partition::Durable, keys::IS_CAPTURING_CSS, &enabled).await;
    }

    pub async fn set_debugging_tab_id(&self, tab: Option<TabId>) {
        self.mirror.write().debugging_tab_id = tab;
        self.persist(Partition::Durable, keys::DEBUGGING_TAB_ID, &tab).await;
    }

    pub async fn set_most_recent_repos(&self, mut repos: Vec<Source>) {
        repos.truncate(self.recent_repos_limit);
        self.mirror.write().most_recent_repos = repos.clone();
        self.persist(Partition::Durable, keys::MOST_RECENT_REPOS, &repos).await;
    }

    /// Move `source` to the front of the recent list, dropping any earlier
    /// occurrence and evicting past the limit.
    pub async fn remember_repo(&self, source: Source) -> Vec<Source> {
        let repos = {
            let mut mirror = self.mirror.write();
            let repos = &mut mirror.most_recent_repos;
            repos.retain(|r| r.id != source.id);
            repos.insert(0, source);
            repos.truncate(self.recent_repos_limit);
            repos.clone()
        };
        self.persist(Partition::Durable, keys::MOST_RECENT_REPOS, &repos).await;
        repos
    }

    pub async fn set_sources_cache(&self, cache: SourcesCache) {
        self.mirror.write().sources_cache = Some(cache.clone());
        self.persist(Partition::Durable, keys::SOURCES_CACHE, &cache).await;
    }

    pub async fn set_history_cache(&self, cache: HistoryCache) {
        self.mirror.write().history_cache = Some(cache.clone());
        self.persist(Partition::Durable, keys::HISTORY_CACHE, &cache).await;
    }

    /// Drop the cached history so the next listing refetches.
    pub async fn clear_history_cache(&self) {
        self.mirror.write().history_cache = None;
        self.forget(Partition::Durable, &[keys::HISTORY_CACHE]).await;
    }

    pub async fn set_api_key(&self, key: String) {
        let stored = Some(key.clone()).filter(|k| !k.is_empty());
        self.mirror.write().api_key = stored;
        self.persist(Partition::Durable, keys::API_KEY, &key).await;
    }

    pub async fn set_captured_element(&self, element: Option<CapturedElement>) {
        self.mirror.write().captured_element = element.clone();
        self.persist(Partition::Ephemeral, keys::CAPTURED_ELEMENT, &element).await;
    }

    pub async fn set_captured_tab_id(&self, tab: Option<TabId>) {
        self.mirror.write().captured_tab_id = tab;
        self.persist(Partition::Ephemeral, keys::CAPTURED_TAB_ID, &tab).await;
    }

    pub async fn set_view_state(&self, view: ViewState) {
        self.mirror.write().view_state = view;
        self.persist(Partition::Ephemeral, keys::VIEW_STATE, &view).await;
    }

    pub async fn set_draft_task_text(&self, text: String) {
        self.mirror.write().draft_task_text = text.clone();
        self.persist(Partition::Ephemeral, keys::DRAFT_TASK_TEXT, &text).await;
    }

    /// Re-read the captured element from the ephemeral partition.
    ///
    /// Used when the owning tab becomes active again after a soft reset
    /// cleared the in-memory reference.
    pub async fn restore_captured_element(&self) -> Option<CapturedElement> {
        if let Some(element) = self.captured_element() {
            return Some(element);
        }
        let stored = self
            .read_partition(Partition::Ephemeral, &[keys::CAPTURED_ELEMENT])
            .await;
        let element: Option<CapturedElement> = decode(&stored, keys::CAPTURED_ELEMENT);
        if element.is_some() {
            self.mirror.write().captured_element = element.clone();
        }
        element
    }

    /// Clear the in-memory capture and the success indicator.
    ///
    /// With `force_full_reset`, also tell the picker in the previously owning
    /// tab to clean up (best-effort) and drop the ephemeral capture, owner,
    /// view and draft keys.
    pub async fn reset_state(&self, force_full_reset: bool) {
        let previous_tab = {
            let mut mirror = self.mirror.write();
            mirror.captured_element = None;
            if force_full_reset {
                let tab = mirror.captured_tab_id.take();
                mirror.view_state = ViewState::default();
                mirror.draft_task_text.clear();
                tab
            } else {
                None
            }
        };
        self.host.set_indicator(Indicator::Cleared);

        if !force_full_reset {
            return;
        }

        if let Some(tab) = previous_tab {
            match self
                .host
                .send_directive(tab, PickerDirective::CleanupSelector)
                .await
            {
                Ok(()) => debug!("Sent cleanup to picker in tab {}", tab),
                Err(e) if e.is_receiver_missing() => {
                    debug!("Picker in tab {} already gone: {}", tab, e)
                }
                Err(e) => error!("Error sending cleanup message to tab {}: {}", tab, e),
            }
        }

        self.forget(
            Partition::Ephemeral,
            &[
                keys::CAPTURED_ELEMENT,
                keys::CAPTURED_TAB_ID,
                keys::VIEW_STATE,
                keys::DRAFT_TASK_TEXT,
            ],
        )
        .await;
    }
}

fn decode<T: DeserializeOwned>(values: &HashMap<String, Value>, key: &str) -> Option<T> {
    let value = values.get(key)?;
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Ignoring malformed stored value for {}: {}", key, e);
            None
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
