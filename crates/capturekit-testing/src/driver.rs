//! Scripted debugger driver.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::Notify;

use capturekit_protocols::{DebuggerDriver, DriverError, TabId, domains};

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Attach(TabId),
    Detach(TabId),
    Command { tab: TabId, method: String },
}

#[derive(Default)]
struct Inner {
    calls: Vec<DriverCall>,
    attached: HashSet<TabId>,
    attach_failures: HashMap<TabId, String>,
    command_failures: HashMap<String, VecDeque<DriverError>>,
    bodies: HashMap<String, String>,
    max_attached: usize,
}

/// In-memory [`DebuggerDriver`].
///
/// Tracks which tabs are attached the way a real browser would: attaching
/// twice fails, commands on a detached tab fail with the not-attached error.
/// Response bodies can be held back with [`MockDriver::hold_bodies`] to test
/// late completions.
#[derive(Clone, Default)]
pub struct MockDriver {
    inner: Arc<Mutex<Inner>>,
    gate: Arc<BodyGate>,
}

#[derive(Default)]
struct BodyGate {
    held: Mutex<bool>,
    released: Notify,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next attach to `tab` fail with `message`.
    pub fn fail_attach(&self, tab: TabId, message: &str) {
        self.inner
            .lock()
            .attach_failures
            .insert(tab, message.to_string());
    }

    /// Queue a failure for the next call to `method`.
    pub fn fail_command(&self, method: &str, error: DriverError) {
        self.inner
            .lock()
            .command_failures
            .entry(method.to_string())
            .or_default()
            .push_back(error);
    }

    /// Body returned by `Network.getResponseBody` for `request_id`.
    pub fn set_body(&self, request_id: &str, body: &str) {
        self.inner
            .lock()
            .bodies
            .insert(request_id.to_string(), body.to_string());
    }

    /// Block `Network.getResponseBody` until [`MockDriver::release_bodies`].
    pub fn hold_bodies(&self) {
        *self.gate.held.lock() = true;
    }

    pub fn release_bodies(&self) {
        *self.gate.held.lock() = false;
        self.gate.released.notify_waiters();
    }

    /// Forget a session as if the browser dropped it.
    pub fn drop_session(&self, tab: TabId) {
        self.inner.lock().attached.remove(&tab);
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Protocol methods sent to `tab`, in order.
    pub fn commands_for(&self, tab: TabId) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                DriverCall::Command { tab: t, method } if *t == tab => Some(method.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn attach_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, DriverCall::Attach(_)))
            .count()
    }

    pub fn is_attached(&self, tab: TabId) -> bool {
        self.inner.lock().attached.contains(&tab)
    }

    pub fn attached_tabs(&self) -> Vec<TabId> {
        let mut tabs: Vec<_> = self.inner.lock().attached.iter().copied().collect();
        tabs.sort_unstable();
        tabs
    }

    /// Highest number of simultaneously attached tabs ever observed.
    pub fn max_attached(&self) -> usize {
        self.inner.lock().max_attached
    }

    async fn wait_for_gate(&self) {
        loop {
            let notified = self.gate.released.notified();
            if !*self.gate.held.lock() {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl DebuggerDriver for MockDriver {
    async fn attach(&self, tab: TabId) -> Result<(), DriverError> {
        let mut inner = self.inner.lock();
        inner.calls.push(DriverCall::Attach(tab));
        if let Some(message) = inner.attach_failures.remove(&tab) {
            return Err(DriverError::AttachRefused { tab, message });
        }
        if !inner.attached.insert(tab) {
            return Err(DriverError::AttachRefused {
                tab,
                message: "Another debugger is already attached to the tab".to_string(),
            });
        }
        inner.max_attached = inner.max_attached.max(inner.attached.len());
        Ok(())
    }

    async fn detach(&self, tab: TabId) -> Result<(), DriverError> {
        let mut inner = self.inner.lock();
        inner.calls.push(DriverCall::Detach(tab));
        if inner.attached.remove(&tab) {
            Ok(())
        } else {
            Err(DriverError::NotAttached(tab))
        }
    }

    async fn send_command(
        &self,
        tab: TabId,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, DriverError> {
        let body_request = {
            let mut inner = self.inner.lock();
            inner.calls.push(DriverCall::Command {
                tab,
                method: method.to_string(),
            });
            if let Some(err) = inner
                .command_failures
                .get_mut(method)
                .and_then(VecDeque::pop_front)
            {
                return Err(err);
            }
            if !inner.attached.contains(&tab) {
                return Err(DriverError::NotAttached(tab));
            }
            if method != domains::NETWORK_GET_RESPONSE_BODY {
                return Ok(json!({}));
            }
            params
                .as_ref()
                .and_then(|p| p.get("requestId"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default()
        };

        self.wait_for_gate().await;

        let inner = self.inner.lock();
        match inner.bodies.get(&body_request) {
            Some(body) => Ok(json!({ "body": body, "base64Encoded": false })),
            None => Err(DriverError::Command {
                method: method.to_string(),
                message: "No resource with given identifier found".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_double_attach_refused() {
        let driver = MockDriver::new();
        driver.attach(1).await.unwrap();
        assert!(driver.attach(1).await.is_err());
        assert_eq!(driver.attached_tabs(), vec![1]);
    }

    #[tokio::test]
    async fn test_command_on_detached_tab() {
        let driver = MockDriver::new();
        let err = driver
            .send_command(5, domains::RUNTIME_ENABLE, None)
            .await
            .unwrap_err();
        assert!(err.is_not_attached());
    }

    #[tokio::test]
    async fn test_scripted_body() {
        let driver = MockDriver::new();
        driver.attach(1).await.unwrap();
        driver.set_body("r1", "hello");
        let result = driver
            .send_command(
                1,
                domains::NETWORK_GET_RESPONSE_BODY,
                Some(json!({ "requestId": "r1" })),
            )
            .await
            .unwrap();
        assert_eq!(result["body"], "hello");
    }
}
