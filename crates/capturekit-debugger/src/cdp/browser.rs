//! Chrome as a [`DebuggerDriver`] and [`TabHost`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use capturekit_protocols::{
    BrowserSignal, CapturedElement, DebuggerDriver, DriverError, HostError, Indicator,
    PickerDirective, TabHost, TabId, TabInfo, TabStatus,
};

use super::client::CdpClient;
use super::error::CdpError;
use super::protocol::{CdpEvent, TargetInfo};

/// Runtime binding the picker calls with the captured element as JSON.
pub const PICK_BINDING: &str = "__capturekitPick";
/// Runtime binding the picker calls when the user aborts.
pub const CANCEL_BINDING: &str = "__capturekitCancel";

const PICKER_SCRIPT: &str = include_str!("../../assets/picker.js");

/// Stable integer ids for string target ids.
#[derive(Debug, Default)]
pub(crate) struct TabRegistry {
    next_id: TabId,
    by_target: HashMap<String, TabId>,
    tabs: HashMap<TabId, TabEntry>,
}

#[derive(Debug, Clone)]
pub(crate) struct TabEntry {
    pub target_id: String,
    pub url: String,
}

impl TabRegistry {
    /// Register (or refresh) a target and return its tab id.
    pub fn upsert(&mut self, target_id: &str, url: &str) -> TabId {
        if let Some(&id) = self.by_target.get(target_id) {
            if let Some(entry) = self.tabs.get_mut(&id) {
                entry.url = url.to_string();
            }
            return id;
        }
        self.next_id += 1;
        let id = self.next_id;
        self.by_target.insert(target_id.to_string(), id);
        self.tabs.insert(
            id,
            TabEntry {
                target_id: target_id.to_string(),
                url: url.to_string(),
            },
        );
        id
    }

    pub fn get(&self, tab: TabId) -> Option<&TabEntry> {
        self.tabs.get(&tab)
    }

    pub fn remove_target(&mut self, target_id: &str) -> Option<TabId> {
        let id = self.by_target.remove(target_id)?;
        self.tabs.remove(&id);
        Some(id)
    }

    pub fn list(&self) -> Vec<TabInfo> {
        let mut tabs: Vec<_> = self
            .tabs
            .iter()
            .map(|(id, entry)| TabInfo {
                id: *id,
                url: Some(entry.url.clone()),
            })
            .collect();
        tabs.sort_by_key(|t| t.id);
        tabs
    }
}

/// Which flattened session a CDP session id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionRole {
    Debug(TabId),
    Picker(TabId),
}

#[derive(Default)]
struct Sessions {
    debug: HashMap<TabId, String>,
    picker: HashMap<TabId, String>,
    roles: HashMap<String, SessionRole>,
}

impl Sessions {
    fn insert(&mut self, role: SessionRole, session_id: String) {
        match role {
            SessionRole::Debug(tab) => self.debug.insert(tab, session_id.clone()),
            SessionRole::Picker(tab) => self.picker.insert(tab, session_id.clone()),
        };
        self.roles.insert(session_id, role);
    }

    fn remove(&mut self, session_id: &str) -> Option<SessionRole> {
        let role = self.roles.remove(session_id)?;
        match role {
            SessionRole::Debug(tab) => self.debug.remove(&tab),
            SessionRole::Picker(tab) => self.picker.remove(&tab),
        };
        Some(role)
    }

    fn remove_tab(&mut self, tab: TabId) -> Option<String> {
        if let Some(picker) = self.picker.remove(&tab) {
            self.roles.remove(&picker);
        }
        let debug = self.debug.remove(&tab)?;
        self.roles.remove(&debug);
        Some(debug)
    }
}

/// A remote-debugging Chrome instance.
///
/// Each tab may carry two flattened sessions: a debug session owned by the
/// debugger controller and a picker session that hosts the on-page picker.
pub struct CdpBrowser {
    client: CdpClient,
    tabs: Mutex<TabRegistry>,
    sessions: Mutex<Sessions>,
    active: Mutex<Option<TabId>>,
    indicator: Mutex<Indicator>,
}

impl CdpBrowser {
    /// Connect and start target discovery.
    pub async fn connect(
        endpoint: &str,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<CdpEvent>), CdpError> {
        let (client, events) = CdpClient::connect(endpoint).await?;
        let browser = Arc::new(Self {
            client,
            tabs: Mutex::new(TabRegistry::default()),
            sessions: Mutex::new(Sessions::default()),
            active: Mutex::new(None),
            indicator: Mutex::new(Indicator::Cleared),
        });

        browser
            .client
            .call("Target.setDiscoverTargets", Some(json!({ "discover": true })), None)
            .await?;
        browser.refresh_targets().await?;
        info!("Attached to browser at {}", browser.client.browser_ws_url());
        Ok((browser, events))
    }

    /// Re-read the page list.
    pub async fn refresh_targets(&self) -> Result<Vec<TabInfo>, CdpError> {
        let result = self.client.call("Target.getTargets", None, None).await?;
        let targets: Vec<TargetInfo> =
            serde_json::from_value(result.get("targetInfos").cloned().unwrap_or_default())?;
        let mut tabs = self.tabs.lock();
        for target in targets.iter().filter(|t| t.is_page()) {
            tabs.upsert(&target.target_id, &target.url);
        }
        Ok(tabs.list())
    }

    /// Known page tabs.
    pub fn tabs(&self) -> Vec<TabInfo> {
        self.tabs.lock().list()
    }

    /// Bring `tab` to the front and make it the active tab.
    pub async fn activate(&self, tab: TabId) -> Result<TabInfo, HostError> {
        let target_id = self.target_id(tab)?;
        self.client
            .call(
                "Target.activateTarget",
                Some(json!({ "targetId": target_id })),
                None,
            )
            .await
            .map_err(|e| HostError::Other(e.to_string()))?;
        *self.active.lock() = Some(tab);
        Ok(self.tab_info(tab).unwrap_or(TabInfo { id: tab, url: None }))
    }

    pub fn indicator(&self) -> Indicator {
        *self.indicator.lock()
    }

    fn target_id(&self, tab: TabId) -> Result<String, HostError> {
        self.tabs
            .lock()
            .get(tab)
            .map(|e| e.target_id.clone())
            .ok_or(HostError::TabNotFound(tab))
    }

    fn tab_info(&self, tab: TabId) -> Option<TabInfo> {
        self.tabs.lock().get(tab).map(|e| TabInfo {
            id: tab,
            url: Some(e.url.clone()),
        })
    }

    async fn open_session(&self, tab: TabId) -> Result<String, CdpError> {
        let target_id = self
            .target_id(tab)
            .map_err(|e| CdpError::InvalidResponse(e.to_string()))?;
        let result = self
            .client
            .call(
                "Target.attachToTarget",
                Some(json!({ "targetId": target_id, "flatten": true })),
                None,
            )
            .await?;
        result["sessionId"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))
    }

    async fn evaluate(&self, session_id: &str, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .client
            .call(
                "Runtime.evaluate",
                Some(json!({ "expression": expression, "returnByValue": true })),
                Some(session_id),
            )
            .await?;
        if let Some(details) = result.get("exceptionDetails") {
            let text = details
                .pointer("/exception/description")
                .or_else(|| details.get("text"))
                .and_then(Value::as_str)
                .unwrap_or("script threw");
            return Err(CdpError::InvalidResponse(text.to_string()));
        }
        Ok(result
            .pointer("/result/value")
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Translate raw CDP events into browser signals until either side closes.
    pub async fn pump_events(
        self: Arc<Self>,
        mut events: mpsc::UnboundedReceiver<CdpEvent>,
        signals: mpsc::Sender<BrowserSignal>,
    ) {
        while let Some(event) = events.recv().await {
            for signal in self.translate(event) {
                if signals.send(signal).await.is_err() {
                    debug!("Signal receiver dropped, stopping event pump");
                    return;
                }
            }
        }
        debug!("CDP event stream ended");
    }

    fn translate(&self, event: CdpEvent) -> Vec<BrowserSignal> {
        let role = event
            .session_id
            .as_deref()
            .and_then(|sid| self.sessions.lock().roles.get(sid).copied());

        match (event.method.as_str(), role) {
            ("Target.targetCreated", _) | ("Target.targetInfoChanged", _) => {
                let Some(target) = target_info(&event.params) else {
                    return Vec::new();
                };
                let tab = self.tabs.lock().upsert(&target.target_id, &target.url);
                lifecycle_status(&event.method)
                    .map(|status| BrowserSignal::TabUpdated {
                        tab,
                        status,
                        url: Some(target.url),
                    })
                    .into_iter()
                    .collect()
            }
            ("Target.targetDestroyed", _) => {
                let Some(target_id) = event.params.get("targetId").and_then(Value::as_str) else {
                    return Vec::new();
                };
                let Some(tab) = self.tabs.lock().remove_target(target_id) else {
                    return Vec::new();
                };
                let mut active = self.active.lock();
                if *active == Some(tab) {
                    *active = None;
                }
                vec![BrowserSignal::TabRemoved { tab }]
            }
            ("Target.detachedFromTarget", _) => {
                let Some(session_id) = event.params.get("sessionId").and_then(Value::as_str)
                else {
                    return Vec::new();
                };
                match self.sessions.lock().remove(session_id) {
                    Some(SessionRole::Debug(tab)) => vec![BrowserSignal::DebuggerDetached {
                        tab,
                        reason: "target_closed".to_string(),
                    }],
                    Some(SessionRole::Picker(tab)) => {
                        debug!("Picker session for tab {} closed", tab);
                        Vec::new()
                    }
                    None => Vec::new(),
                }
            }
            (
                "Page.loadEventFired",
                Some(role @ (SessionRole::Debug(tab) | SessionRole::Picker(tab))),
            ) => {
                // One signal per load when both sessions share the tab.
                if matches!(role, SessionRole::Picker(_))
                    && self.sessions.lock().debug.contains_key(&tab)
                {
                    return Vec::new();
                }
                lifecycle_status(&event.method)
                    .map(|status| BrowserSignal::TabUpdated {
                        tab,
                        status,
                        url: self.tab_info(tab).and_then(|t| t.url),
                    })
                    .into_iter()
                    .collect()
            }
            ("Runtime.bindingCalled", Some(SessionRole::Picker(tab))) => {
                binding_signal(tab, &event.params).into_iter().collect()
            }
            (_, Some(SessionRole::Debug(tab))) => vec![BrowserSignal::DebuggerEvent {
                tab,
                method: event.method,
                params: event.params,
            }],
            _ => Vec::new(),
        }
    }
}

/// Load status a target or page event reports, if any.
///
/// Target info changes as soon as a navigation commits, so only the page
/// `load` event means the tab finished loading.
fn lifecycle_status(method: &str) -> Option<TabStatus> {
    match method {
        "Target.targetInfoChanged" => Some(TabStatus::Loading),
        "Page.loadEventFired" => Some(TabStatus::Complete),
        _ => None,
    }
}

fn target_info(params: &Value) -> Option<TargetInfo> {
    let info: TargetInfo = serde_json::from_value(params.get("targetInfo")?.clone()).ok()?;
    info.is_page().then_some(info)
}

/// Turn a picker binding call into a signal.
fn binding_signal(tab: TabId, params: &Value) -> Option<BrowserSignal> {
    match params.get("name").and_then(Value::as_str)? {
        PICK_BINDING => {
            let payload = params.get("payload").and_then(Value::as_str)?;
            let mut data: Value = match serde_json::from_str(payload) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Picker sent malformed capture: {}", e);
                    return None;
                }
            };
            data["tabId"] = json!(tab);
            match serde_json::from_value::<CapturedElement>(data) {
                Ok(element) => Some(BrowserSignal::ElementCaptured { element }),
                Err(e) => {
                    warn!("Picker sent malformed capture: {}", e);
                    None
                }
            }
        }
        CANCEL_BINDING => Some(BrowserSignal::SelectionCancelled { tab }),
        _ => None,
    }
}

#[async_trait]
impl DebuggerDriver for CdpBrowser {
    async fn attach(&self, tab: TabId) -> Result<(), DriverError> {
        if self.sessions.lock().debug.contains_key(&tab) {
            return Err(DriverError::AttachRefused {
                tab,
                message: "Another debugger is already attached to the tab".to_string(),
            });
        }
        let session_id = self
            .open_session(tab)
            .await
            .map_err(|e| DriverError::AttachRefused {
                tab,
                message: e.to_string(),
            })?;
        self.sessions
            .lock()
            .insert(SessionRole::Debug(tab), session_id.clone());
        debug!("Debug session {} opened on tab {}", session_id, tab);

        // Load events on this session drive re-enabling after navigation.
        if let Err(e) = self.client.call("Page.enable", None, Some(&session_id)).await {
            warn!("Page.enable failed on debug session {}: {}", session_id, e);
        }
        Ok(())
    }

    async fn detach(&self, tab: TabId) -> Result<(), DriverError> {
        let session_id = {
            let mut sessions = self.sessions.lock();
            let session_id = sessions.debug.remove(&tab).ok_or(DriverError::NotAttached(tab))?;
            sessions.roles.remove(&session_id);
            session_id
        };
        self.client
            .call(
                "Target.detachFromTarget",
                Some(json!({ "sessionId": session_id })),
                None,
            )
            .await
            .map_err(|e| e.into_driver_error("Target.detachFromTarget"))?;
        Ok(())
    }

    async fn send_command(
        &self,
        tab: TabId,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, DriverError> {
        let session_id = self
            .sessions
            .lock()
            .debug
            .get(&tab)
            .cloned()
            .ok_or(DriverError::NotAttached(tab))?;
        self.client
            .call(method, params, Some(&session_id))
            .await
            .map_err(|e| e.into_driver_error(method))
    }
}

#[async_trait]
impl TabHost for CdpBrowser {
    async fn active_tab(&self) -> Result<Option<TabInfo>, HostError> {
        let active = *self.active.lock();
        if let Some(tab) = active.and_then(|tab| self.tab_info(tab)) {
            return Ok(Some(tab));
        }

        let pages = self
            .client
            .list_pages()
            .await
            .map_err(|e| HostError::Other(e.to_string()))?;
        let Some(page) = pages.first() else {
            return Ok(None);
        };
        let tab = self.tabs.lock().upsert(&page.id, &page.url);
        Ok(Some(TabInfo {
            id: tab,
            url: Some(page.url.clone()),
        }))
    }

    async fn inject_picker(&self, tab: TabId) -> Result<(), HostError> {
        let existing = self.sessions.lock().picker.get(&tab).cloned();
        let session_id = match existing {
            Some(session_id) => session_id,
            None => {
                let session_id = self
                    .open_session(tab)
                    .await
                    .map_err(|e| HostError::InjectionFailed(e.to_string()))?;
                for (method, params) in [
                    ("Runtime.enable", None),
                    ("Page.enable", None),
                    ("Runtime.addBinding", Some(json!({ "name": PICK_BINDING }))),
                    ("Runtime.addBinding", Some(json!({ "name": CANCEL_BINDING }))),
                ] {
                    self.client
                        .call(method, params, Some(&session_id))
                        .await
                        .map_err(|e| HostError::InjectionFailed(e.to_string()))?;
                }
                self.sessions
                    .lock()
                    .insert(SessionRole::Picker(tab), session_id.clone());
                session_id
            }
        };

        self.evaluate(&session_id, PICKER_SCRIPT)
            .await
            .map_err(|e| HostError::InjectionFailed(e.to_string()))?;
        Ok(())
    }

    async fn send_directive(&self, tab: TabId, directive: PickerDirective) -> Result<(), HostError> {
        let Some(session_id) = self.sessions.lock().picker.get(&tab).cloned() else {
            return Err(HostError::ReceiverMissing(tab));
        };
        let call = match directive {
            PickerDirective::StartSelection => "start",
            PickerDirective::CleanupSelector => "cleanup",
        };
        let expression = format!(
            "window.__capturekitPicker ? (window.__capturekitPicker.{}(), true) : false",
            call
        );
        match self.evaluate(&session_id, &expression).await {
            Ok(Value::Bool(true)) => Ok(()),
            Ok(_) => Err(HostError::ReceiverMissing(tab)),
            Err(e) if matches!(e, CdpError::Protocol { .. }) => {
                // Session gone with the tab.
                self.sessions.lock().remove_tab(tab);
                Err(HostError::ReceiverMissing(tab))
            }
            Err(e) => Err(HostError::Other(e.to_string())),
        }
    }

    fn set_indicator(&self, indicator: Indicator) {
        let mut current = self.indicator.lock();
        if *current != indicator {
            info!("Indicator: {:?}", indicator);
            *current = indicator;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_stable_ids() {
        let mut reg = TabRegistry::default();
        let a = reg.upsert("T-A", "https://a");
        let b = reg.upsert("T-B", "https://b");
        assert_ne!(a, b);
        assert_eq!(reg.upsert("T-A", "https://a/next"), a);
        assert_eq!(reg.get(a).unwrap().url, "https://a/next");
        assert_eq!(reg.list().len(), 2);

        assert_eq!(reg.remove_target("T-A"), Some(a));
        assert!(reg.get(a).is_none());
        // Ids are never reused.
        let c = reg.upsert("T-C", "https://c");
        assert!(c > b);
    }

    #[test]
    fn test_sessions_roles() {
        let mut sessions = Sessions::default();
        sessions.insert(SessionRole::Debug(1), "S-D".to_string());
        sessions.insert(SessionRole::Picker(1), "S-P".to_string());

        assert_eq!(sessions.remove("S-P"), Some(SessionRole::Picker(1)));
        assert!(sessions.picker.is_empty());
        assert_eq!(sessions.remove_tab(1), Some("S-D".to_string()));
        assert!(sessions.roles.is_empty());
    }

    #[test]
    fn test_pick_binding_to_element() {
        let payload = json!({
            "outerHTML": "<a>x</a>",
            "selector": "html > body > a",
            "dimensions": {
                "width": 10.0, "height": 5.0,
                "margin": {"top": "0px", "right": "0px", "bottom": "0px", "left": "0px"},
                "padding": {"top": "0px", "right": "0px", "bottom": "0px", "left": "0px"},
                "border": {"top": "0px", "right": "0px", "bottom": "0px", "left": "0px"}
            }
        });
        let params = json!({ "name": PICK_BINDING, "payload": payload.to_string() });
        match binding_signal(4, &params) {
            Some(BrowserSignal::ElementCaptured { element }) => {
                assert_eq!(element.tab_id, 4);
                assert_eq!(element.summary(), "a");
                assert_eq!(element.dimensions.unwrap().width, 10.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cancel_binding() {
        let params = json!({ "name": CANCEL_BINDING, "payload": "" });
        assert!(matches!(
            binding_signal(2, &params),
            Some(BrowserSignal::SelectionCancelled { tab: 2 })
        ));
        let params = json!({ "name": PICK_BINDING, "payload": "not json" });
        assert!(binding_signal(2, &params).is_none());
        let params = json!({ "name": "somethingElse", "payload": "" });
        assert!(binding_signal(2, &params).is_none());
    }

    #[test]
    fn test_lifecycle_status() {
        assert_eq!(
            lifecycle_status("Target.targetInfoChanged"),
            Some(TabStatus::Loading)
        );
        assert_eq!(
            lifecycle_status("Page.loadEventFired"),
            Some(TabStatus::Complete)
        );
        assert_eq!(lifecycle_status("Target.targetCreated"), None);
        assert_eq!(lifecycle_status("Network.requestWillBeSent"), None);
    }

    #[test]
    fn test_target_info_filters_pages() {
        let page = json!({"targetInfo": {"targetId": "T", "type": "page", "url": "u"}});
        let worker = json!({"targetInfo": {"targetId": "W", "type": "service_worker", "url": "u"}});
        assert!(target_info(&page).is_some());
        assert!(target_info(&worker).is_none());
    }
}
