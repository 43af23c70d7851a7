//! Scripted tab host.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use capturekit_protocols::{HostError, Indicator, PickerDirective, TabHost, TabId, TabInfo};

#[derive(Default)]
struct Inner {
    active: Option<TabInfo>,
    active_fails: bool,
    /// Tabs whose picker answers directives.
    receivers: HashSet<TabId>,
    injection_failures: HashSet<TabId>,
    injected: Vec<TabId>,
    directives: Vec<(TabId, PickerDirective)>,
    indicators: Vec<Indicator>,
}

/// In-memory [`TabHost`].
///
/// Directives only reach tabs that had the picker injected (or were marked
/// with [`MockHost::add_receiver`]); anything else fails with
/// [`HostError::ReceiverMissing`].
#[derive(Clone, Default)]
pub struct MockHost {
    inner: Arc<Mutex<Inner>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&self, tab: TabId, url: &str) {
        self.inner.lock().active = Some(TabInfo {
            id: tab,
            url: Some(url.to_string()),
        });
    }

    pub fn clear_active(&self) {
        self.inner.lock().active = None;
    }

    /// Make `active_tab` fail until reset.
    pub fn fail_active_lookup(&self, fail: bool) {
        self.inner.lock().active_fails = fail;
    }

    pub fn add_receiver(&self, tab: TabId) {
        self.inner.lock().receivers.insert(tab);
    }

    pub fn remove_receiver(&self, tab: TabId) {
        self.inner.lock().receivers.remove(&tab);
    }

    pub fn fail_injection(&self, tab: TabId) {
        self.inner.lock().injection_failures.insert(tab);
    }

    pub fn injected(&self) -> Vec<TabId> {
        self.inner.lock().injected.clone()
    }

    pub fn directives(&self) -> Vec<(TabId, PickerDirective)> {
        self.inner.lock().directives.clone()
    }

    pub fn indicators(&self) -> Vec<Indicator> {
        self.inner.lock().indicators.clone()
    }

    pub fn last_indicator(&self) -> Option<Indicator> {
        self.inner.lock().indicators.last().copied()
    }
}

#[async_trait]
impl TabHost for MockHost {
    async fn active_tab(&self) -> Result<Option<TabInfo>, HostError> {
        let inner = self.inner.lock();
        if inner.active_fails {
            return Err(HostError::Other("No focused window".to_string()));
        }
        Ok(inner.active.clone())
    }

    async fn inject_picker(&self, tab: TabId) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        if inner.injection_failures.contains(&tab) {
            return Err(HostError::InjectionFailed(format!(
                "Cannot access contents of tab {}",
                tab
            )));
        }
        inner.injected.push(tab);
        inner.receivers.insert(tab);
        Ok(())
    }

    async fn send_directive(&self, tab: TabId, directive: PickerDirective) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        if !inner.receivers.contains(&tab) {
            return Err(HostError::ReceiverMissing(tab));
        }
        inner.directives.push((tab, directive));
        Ok(())
    }

    fn set_indicator(&self, indicator: Indicator) {
        self.inner.lock().indicators.push(indicator);
    }
}
