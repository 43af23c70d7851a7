//! Debugger driver capability.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DriverError;
use crate::types::TabId;

/// Protocol method and event names the core relies on.
pub mod domains {
    pub const RUNTIME_ENABLE: &str = "Runtime.enable";
    pub const RUNTIME_DISABLE: &str = "Runtime.disable";
    pub const NETWORK_ENABLE: &str = "Network.enable";
    pub const NETWORK_DISABLE: &str = "Network.disable";
    pub const NETWORK_GET_RESPONSE_BODY: &str = "Network.getResponseBody";

    pub const CONSOLE_API_CALLED: &str = "Runtime.consoleAPICalled";
    pub const REQUEST_WILL_BE_SENT: &str = "Network.requestWillBeSent";
    pub const RESPONSE_RECEIVED: &str = "Network.responseReceived";
}

/// Attaches a remote-debugging session to a tab and issues commands on it.
///
/// Events and involuntary detach notifications are delivered separately as
/// [`crate::BrowserSignal`]s.
#[async_trait]
pub trait DebuggerDriver: Send + Sync {
    async fn attach(&self, tab: TabId) -> Result<(), DriverError>;

    async fn detach(&self, tab: TabId) -> Result<(), DriverError>;

    async fn send_command(
        &self,
        tab: TabId,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, DriverError>;
}
