//! Debugger session controller.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use capturekit_config::DebuggerConfig;
use capturekit_protocols::{
    CaptureFlags, DebuggerDriver, DriverError, NotificationBus, TabHost, TabId, domains,
};
use capturekit_state::StateManager;

use crate::events;

/// Where the single debugger attachment currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    NoSession,
    Attaching,
    Attached,
    Detaching,
}

/// Owns the one debugger attachment.
///
/// Every attach/detach decision goes through [`DebuggerController::reconcile`];
/// calls are serialised so a flag flip that lands while an attach is in flight
/// is evaluated once the attach has settled.
pub struct DebuggerController {
    state: Arc<StateManager>,
    driver: Arc<dyn DebuggerDriver>,
    host: Arc<dyn TabHost>,
    notifier: NotificationBus,
    config: DebuggerConfig,
    reconcile_lock: tokio::sync::Mutex<()>,
    phase: Mutex<SessionPhase>,
    body_fetches: Mutex<JoinSet<()>>,
}

impl DebuggerController {
    pub fn new(
        state: Arc<StateManager>,
        driver: Arc<dyn DebuggerDriver>,
        host: Arc<dyn TabHost>,
        notifier: NotificationBus,
        config: DebuggerConfig,
    ) -> Self {
        Self {
            state,
            driver,
            host,
            notifier,
            config,
            reconcile_lock: tokio::sync::Mutex::new(()),
            phase: Mutex::new(SessionPhase::NoSession),
            body_fetches: Mutex::new(JoinSet::new()),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.lock()
    }

    fn set_phase(&self, phase: SessionPhase) {
        let mut current = self.phase.lock();
        if *current != phase {
            debug!("Debugger session {:?} -> {:?}", *current, phase);
            *current = phase;
        }
    }

    /// Bring the attachment in line with the capture flags and the active tab.
    pub async fn reconcile(&self) {
        let _guard = self.reconcile_lock.lock().await;
        self.state.initialize().await;

        let flags = self.state.capture_flags();
        let current = self.state.debugging_tab_id();

        let Some(target) = self.debuggable_active_tab().await else {
            if current.is_some() {
                self.detach_session().await;
            }
            return;
        };

        if !flags.wants_debugger() {
            if current.is_some() {
                self.detach_session().await;
            }
            return;
        }

        match current {
            Some(tab) if tab == target => {}
            Some(tab) => {
                self.detach_session().await;
                if !self.attach(target).await {
                    return;
                }
                info!("Debugger moved from tab {} to tab {}", tab, target);
            }
            None => {
                if !self.attach(target).await {
                    return;
                }
            }
        }

        match self.configure_domains(target, flags).await {
            Ok(()) => debug!("Debugger domains configured for tab {}: {:?}", target, flags),
            Err(e) => self.handle_command_error(e).await,
        }
    }

    /// Tear down the session, if any.
    pub async fn detach(&self) {
        let _guard = self.reconcile_lock.lock().await;
        self.state.initialize().await;
        self.detach_session().await;
    }

    /// Re-enable flagged domains after the debugged tab finished loading.
    pub async fn reenable_after_navigation(&self, tab: TabId) {
        let _guard = self.reconcile_lock.lock().await;
        self.state.initialize().await;

        if self.state.debugging_tab_id() != Some(tab) {
            return;
        }
        let flags = self.state.capture_flags();
        let result = async {
            if flags.logs {
                self.send(tab, domains::RUNTIME_ENABLE).await?;
            }
            if flags.network {
                self.send(tab, domains::NETWORK_ENABLE).await?;
            }
            Ok::<_, DriverError>(())
        }
        .await;

        match result {
            Ok(()) => {}
            Err(e) if e.is_not_attached() => {
                info!("Debugger session on tab {} gone after navigation ({})", tab, e);
                self.clear_session_state().await;
                self.set_phase(SessionPhase::NoSession);
            }
            Err(e) => {
                error!("Error re-enabling debugger domains on navigation: {}", e);
                self.detach_session().await;
            }
        }
    }

    /// Pick up after a restart.
    ///
    /// A fresh driver holds no sessions, so a persisted tab id is stale. Drop
    /// it and attach again if the flags still ask for the debugger.
    pub async fn resume(&self) {
        {
            let _guard = self.reconcile_lock.lock().await;
            self.state.initialize().await;
            if let Some(tab) = self.state.debugging_tab_id() {
                info!("Dropping debugger session on tab {} from a previous run", tab);
                self.clear_session_state().await;
                self.set_phase(SessionPhase::NoSession);
            }
        }
        self.reconcile().await;
    }

    /// The driver dropped the session on its own. No re-attach.
    pub async fn on_detached(&self, tab: TabId, reason: &str) {
        self.state.initialize().await;
        if self.state.debugging_tab_id() != Some(tab) {
            debug!("Ignoring detach of tab {} ({}): not the debugged tab", tab, reason);
            return;
        }
        info!("Debugger detached unexpectedly from tab {}: {}", tab, reason);
        self.set_phase(SessionPhase::Detaching);
        self.clear_session_state().await;
        self.set_phase(SessionPhase::NoSession);
    }

    /// Translate one protocol event from `tab`.
    ///
    /// The tab check runs under the record list's lock, so a detach that
    /// clears the tab id and then the list never leaves a late record behind.
    pub fn on_event(&self, tab: TabId, method: &str, params: &Value) {
        if !self.owns(tab) {
            return;
        }

        match method {
            domains::CONSOLE_API_CALLED => {
                let record = events::console_record(params);
                self.state.captured_logs().with(|records| {
                    if self.owns(tab) {
                        records.push(record);
                    }
                });
            }
            domains::REQUEST_WILL_BE_SENT => match events::request_record(params) {
                Some(record) => self.state.captured_network().with(|records| {
                    if self.owns(tab) {
                        records.push(record);
                    }
                }),
                None => warn!("Malformed {} event", method),
            },
            domains::RESPONSE_RECEIVED => {
                let Some(info) = events::response_info(params) else {
                    warn!("Malformed {} event", method);
                    return;
                };
                let found = self.state.captured_network().with(|records| {
                    self.owns(tab)
                        && records
                            .iter_mut()
                            .find(|r| r.request_id == info.request_id)
                            .map(|r| info.apply(r))
                            .is_some()
                });
                if found {
                    self.fetch_body(tab, info.request_id);
                }
            }
            _ => {}
        }
    }

    /// Wait for every outstanding response-body fetch to finish.
    pub async fn settle(&self) {
        let mut fetches = std::mem::take(&mut *self.body_fetches.lock());
        while fetches.join_next().await.is_some() {}
    }

    async fn debuggable_active_tab(&self) -> Option<TabId> {
        match self.host.active_tab().await {
            Ok(Some(tab)) if tab.is_restricted(&self.config.restricted_schemes) => {
                warn!(
                    "Debugger cannot be attached to tab {} ({})",
                    tab.id,
                    tab.url.as_deref().unwrap_or_default()
                );
                None
            }
            Ok(Some(tab)) => Some(tab.id),
            Ok(None) => {
                debug!("No active tab");
                None
            }
            Err(e) => {
                warn!("Cannot resolve active tab: {}", e);
                None
            }
        }
    }

    async fn attach(&self, tab: TabId) -> bool {
        self.set_phase(SessionPhase::Attaching);
        match self.driver.attach(tab).await {
            Ok(()) => {
                self.state.set_debugging_tab_id(Some(tab)).await;
                self.set_phase(SessionPhase::Attached);
                info!("Debugger attached to tab {}", tab);
                true
            }
            Err(e) => {
                error!("Failed to attach debugger to tab {}: {}", tab, e);
                self.set_phase(SessionPhase::NoSession);
                self.notifier.error(format!("Debugger error: {}", e));
                false
            }
        }
    }

    async fn configure_domains(&self, tab: TabId, flags: CaptureFlags) -> Result<(), DriverError> {
        if flags.logs {
            self.send(tab, domains::RUNTIME_ENABLE).await?;
        } else {
            let _ = self.send(tab, domains::RUNTIME_DISABLE).await;
        }
        if flags.network {
            self.send(tab, domains::NETWORK_ENABLE).await?;
        } else {
            let _ = self.send(tab, domains::NETWORK_DISABLE).await;
        }
        Ok(())
    }

    async fn send(&self, tab: TabId, method: &str) -> Result<Value, DriverError> {
        self.driver.send_command(tab, method, None).await
    }

    async fn handle_command_error(&self, err: DriverError) {
        if err.is_not_attached() {
            info!("Debugger session already gone ({}); clearing stale tab id", err);
            self.clear_session_state().await;
            self.set_phase(SessionPhase::NoSession);
        } else {
            error!("Error managing debugger state: {}", err);
            self.notifier.error(format!("Debugger error: {}", err));
            self.detach_session().await;
        }
    }

    /// Clear state first, then detach, so late events find no session.
    async fn detach_session(&self) {
        let Some(tab) = self.state.debugging_tab_id() else {
            return;
        };
        self.set_phase(SessionPhase::Detaching);
        self.clear_session_state().await;

        match self.driver.detach(tab).await {
            Ok(()) => info!("Debugger detached from tab {}", tab),
            Err(e) if e.is_not_attached() => debug!("Debugger already detached from tab {}", tab),
            Err(e) => error!("Error during debugger detach from tab {}: {}", tab, e),
        }
        self.set_phase(SessionPhase::NoSession);
    }

    fn owns(&self, tab: TabId) -> bool {
        self.state.debugging_tab_id() == Some(tab)
    }

    /// Tab id goes first; `on_event` checks it under the list locks.
    async fn clear_session_state(&self) {
        self.state.set_debugging_tab_id(None).await;
        self.state.clear_captured_logs();
        self.state.clear_captured_network();
    }

    fn fetch_body(&self, tab: TabId, request_id: String) {
        let driver = Arc::clone(&self.driver);
        let state = Arc::clone(&self.state);
        let limit = self.config.response_body_limit;

        let mut fetches = self.body_fetches.lock();
        while fetches.try_join_next().is_some() {}
        fetches.spawn(async move {
            let params = json!({ "requestId": request_id });
            let response = match driver
                .send_command(tab, domains::NETWORK_GET_RESPONSE_BODY, Some(params))
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!("Could not get response body for {}: {}", request_id, e);
                    return;
                }
            };
            let Some(body) = response
                .get("body")
                .and_then(Value::as_str)
                .filter(|b| !b.is_empty())
            else {
                return;
            };

            if state.debugging_tab_id() != Some(tab) {
                debug!("Discarding body for {}: session ended", request_id);
                return;
            }
            let body = events::truncate_chars(body, limit);
            let stored = state.captured_network().with(|records| {
                records
                    .iter_mut()
                    .find(|r| r.request_id == request_id)
                    .map(|r| r.response_body = Some(body))
                    .is_some()
            });
            if !stored {
                debug!("Discarding body for {}: record cleared", request_id);
            }
        });
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
