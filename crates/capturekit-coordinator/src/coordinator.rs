//! Lifecycle coordinator.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use capturekit_api::{NewTask, PromptContext, RemoteCaches, TaskApiClient, build_prompt, task_title};
use capturekit_debugger::DebuggerController;
use capturekit_protocols::{
    BrowserSignal, CapturedElement, Indicator, Notification, NotificationBus, PickerDirective,
    TabHost, TabId, TabStatus, ViewState,
};
use capturekit_state::StateManager;

use crate::intent::{Command, Intent, PanelData, Reply, StatusReport};

const NO_API_KEY: &str = "API Key not set";
const NO_API_KEY_SUBMIT: &str = "API Key not set. Please set it in Options.";
const SELECTION_FAILED: &str = "Could not start selection on the active tab.";

/// Routes signals and intents to the state manager and debugger controller.
pub struct Coordinator {
    state: Arc<StateManager>,
    debugger: Arc<DebuggerController>,
    host: Arc<dyn TabHost>,
    api: Arc<TaskApiClient>,
    caches: Arc<RemoteCaches>,
    notifier: NotificationBus,
}

impl Coordinator {
    pub fn new(
        state: Arc<StateManager>,
        debugger: Arc<DebuggerController>,
        host: Arc<dyn TabHost>,
        api: Arc<TaskApiClient>,
        notifier: NotificationBus,
    ) -> Self {
        let caches = Arc::new(RemoteCaches::new(
            api.clone(),
            state.clone(),
            notifier.clone(),
        ));
        Self {
            state,
            debugger,
            host,
            api,
            caches,
            notifier,
        }
    }

    /// Process commands and signals until the command channel closes.
    ///
    /// Signals are handled in arrival order; intents run concurrently so a
    /// slow submission never holds up debugger events. In-flight intents are
    /// awaited before returning.
    pub async fn run(
        self: Arc<Self>,
        mut commands: mpsc::Receiver<Command>,
        mut signals: mpsc::Receiver<BrowserSignal>,
    ) {
        let mut in_flight = JoinSet::new();
        let mut signals_open = true;

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    let this = Arc::clone(&self);
                    in_flight.spawn(async move {
                        let reply = this.handle_intent(command.intent).await;
                        if let Some(tx) = command.reply {
                            let _ = tx.send(reply);
                        }
                    });
                }
                signal = signals.recv(), if signals_open => match signal {
                    Some(signal) => self.handle_signal(signal).await,
                    None => {
                        debug!("Signal stream closed");
                        signals_open = false;
                    }
                },
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            }
        }

        while in_flight.join_next().await.is_some() {}
        self.debugger.settle().await;
        info!("Coordinator stopped");
    }

    /// React to one browser signal.
    pub async fn handle_signal(&self, signal: BrowserSignal) {
        self.state.initialize().await;

        match signal {
            BrowserSignal::TabActivated { tab } => self.on_tab_activated(tab).await,
            BrowserSignal::TabUpdated { tab, status, url } => {
                if status != TabStatus::Complete {
                    return;
                }
                if self.state.debugging_tab_id() == Some(tab) {
                    debug!("Debugged tab {} finished loading {:?}", tab, url);
                    self.debugger.reenable_after_navigation(tab).await;
                } else if self.state.debugging_tab_id().is_none()
                    && self.state.capture_flags().wants_debugger()
                {
                    self.debugger.reconcile().await;
                }
            }
            BrowserSignal::TabRemoved { tab } => {
                if self.state.debugging_tab_id() == Some(tab) {
                    info!("Debugged tab {} was closed", tab);
                }
            }
            BrowserSignal::DebuggerEvent { tab, method, params } => {
                self.debugger.on_event(tab, &method, &params);
            }
            BrowserSignal::DebuggerDetached { tab, reason } => {
                self.debugger.on_detached(tab, &reason).await;
            }
            BrowserSignal::ElementCaptured { element } => self.on_element_captured(element).await,
            BrowserSignal::SelectionCancelled { tab } => {
                debug!("Selection cancelled in tab {}", tab);
                self.state.reset_state(true).await;
            }
        }
    }

    async fn on_tab_activated(&self, tab: TabId) {
        if self.state.captured_tab_id() != Some(tab) {
            self.state.reset_state(false).await;
        } else if self.state.restore_captured_element().await.is_some() {
            self.host.set_indicator(Indicator::Success);
        }

        if self.state.capture_flags().wants_debugger() {
            self.debugger.reconcile().await;
        }
    }

    async fn on_element_captured(&self, element: CapturedElement) {
        let selector = element.selector.clone();
        if self.state.captured_tab_id() != Some(element.tab_id) {
            debug!("Capture arrived from tab {}; taking ownership", element.tab_id);
            self.state.set_captured_tab_id(Some(element.tab_id)).await;
        }
        self.state.set_captured_element(Some(element)).await;
        self.state.set_view_state(ViewState::Task).await;
        self.host.set_indicator(Indicator::Success);
        self.notifier
            .publish(Notification::ElementCaptured { selector });
    }

    /// Carry out one user intent.
    pub async fn handle_intent(&self, intent: Intent) -> Reply {
        self.state.initialize().await;

        match intent {
            Intent::PanelOpened => return Reply::Draft(self.state.draft_task_text()),
            Intent::SaveDraft(text) => self.state.set_draft_task_text(text).await,
            Intent::SetView(view) => self.state.set_view_state(view).await,
            Intent::GetPanelData => return Reply::PanelData(Box::new(self.panel_data().await)),
            Intent::StartSelection => self.start_selection().await,
            Intent::CancelSelection => self.state.reset_state(true).await,
            Intent::SubmitTask {
                task,
                repository_id,
                branch,
            } => self.submit_task(&task, &repository_id, branch).await,
            Intent::ToggleLogCapture(enabled) => {
                self.state.set_capturing_logs(enabled).await;
                self.debugger.reconcile().await;
            }
            Intent::ToggleNetworkCapture(enabled) => {
                self.state.set_capturing_network(enabled).await;
                self.debugger.reconcile().await;
            }
            Intent::ToggleCssCapture(enabled) => self.state.set_capturing_css(enabled).await,
            Intent::FetchSources => match self.state.api_key() {
                Some(key) => self.caches.refresh_sources(&key).await,
                None => self.notifier.error(NO_API_KEY),
            },
            Intent::FetchHistory => match self.state.api_key() {
                Some(key) => self.caches.refresh_history(&key).await,
                None => self.notifier.error(NO_API_KEY),
            },
            Intent::SetApiKey(key) => self.state.set_api_key(key.trim().to_string()).await,
            Intent::Status => return Reply::Status(self.status()),
        }
        Reply::Ack
    }

    async fn panel_data(&self) -> PanelData {
        let active = match self.host.active_tab().await {
            Ok(tab) => tab,
            Err(e) => {
                warn!("Cannot resolve active tab: {}", e);
                None
            }
        };
        let snapshot = self.state.snapshot();
        let data = PanelData {
            element: active.and_then(|tab| self.state.captured_element_for(tab.id)),
            recent_repos: snapshot.most_recent_repos,
            flags: snapshot.flags,
            view: snapshot.view_state,
        };

        match snapshot.api_key {
            Some(key) => {
                let caches = Arc::clone(&self.caches);
                tokio::spawn(async move { caches.refresh_sources(&key).await });
            }
            None => self.notifier.error(NO_API_KEY),
        }
        data
    }

    fn status(&self) -> StatusReport {
        let snapshot = self.state.snapshot();
        StatusReport {
            phase: self.debugger.phase(),
            debugging_tab: snapshot.debugging_tab_id,
            captured_tab: snapshot.captured_tab_id,
            flags: snapshot.flags,
            view: snapshot.view_state,
            log_records: self.state.captured_logs().len(),
            network_records: self.state.captured_network().len(),
            has_api_key: snapshot.api_key.is_some(),
        }
    }

    async fn start_selection(&self) {
        self.state.reset_state(true).await;

        let tab = match self.host.active_tab().await {
            Ok(Some(tab)) => tab,
            Ok(None) => {
                debug!("No active tab to select on");
                return;
            }
            Err(e) => {
                error!("Cannot resolve active tab: {}", e);
                self.notifier.error(SELECTION_FAILED);
                return;
            }
        };
        self.state.set_captured_tab_id(Some(tab.id)).await;

        let result = async {
            self.host.inject_picker(tab.id).await?;
            self.host
                .send_directive(tab.id, PickerDirective::StartSelection)
                .await
        }
        .await;
        match result {
            Ok(()) => info!("Selection started on tab {}", tab.id),
            Err(e) => {
                error!("Failed to start picker on tab {}: {}", tab.id, e);
                self.notifier.error(SELECTION_FAILED);
            }
        }
    }

    async fn submit_task(&self, task: &str, repository_id: &str, branch: Option<String>) {
        let selected = self
            .state
            .sources_cache()
            .and_then(|cache| cache.sources.into_iter().find(|s| s.id == repository_id));
        if let Some(source) = selected {
            self.state.remember_repo(source).await;
        }

        let Some(api_key) = self.state.api_key() else {
            self.notifier.error(NO_API_KEY_SUBMIT);
            return;
        };

        let element = self.state.captured_element();
        let logs = self.state.captured_logs().snapshot();
        let network = self.state.captured_network().snapshot();
        let prompt = build_prompt(&PromptContext {
            task,
            element: element.as_ref(),
            include_css: self.state.is_capturing_css(),
            logs: &logs,
            network: &network,
        });
        let new_task = NewTask {
            prompt,
            title: task_title(task),
            source: repository_id.to_string(),
            starting_branch: branch.unwrap_or_default(),
        };

        match self.api.create_session(&api_key, &new_task).await {
            Ok(session) => {
                let url = self.api.session_url(&session);
                info!("Created session {} ({})", session.id, url);
                self.notifier
                    .publish(Notification::TaskCreated { session, url });
                self.state.clear_history_cache().await;
            }
            Err(e) => {
                error!("Failed to create session: {}", e);
                self.notifier.error(e.to_string());
            }
        }

        self.state.reset_state(true).await;
        self.debugger.detach().await;
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
