//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::loader::ConfigLoader;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub debugger: DebuggerConfig,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Remote task API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Prefix for user-facing session links.
    #[serde(default = "default_session_web_url")]
    pub session_web_url: String,

    #[serde(default = "default_history_page_size")]
    pub history_page_size: u32,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_web_url: default_session_web_url(),
            history_page_size: default_history_page_size(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_base_url() -> String {
    "https://jules.googleapis.com/v1alpha".to_string()
}

fn default_session_web_url() -> String {
    "https://jules.google.com/session".to_string()
}

fn default_history_page_size() -> u32 {
    5
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Debugger attachment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebuggerConfig {
    /// Chrome remote-debugging HTTP endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// URL prefixes the debugger must never attach to.
    #[serde(default = "default_restricted_schemes")]
    pub restricted_schemes: Vec<String>,

    /// Maximum stored response body length, in characters.
    #[serde(default = "default_response_body_limit")]
    pub response_body_limit: usize,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            restricted_schemes: default_restricted_schemes(),
            response_body_limit: default_response_body_limit(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_restricted_schemes() -> Vec<String> {
    vec![
        "chrome://".to_string(),
        "devtools://".to_string(),
        "chrome-extension://".to_string(),
    ]
}

fn default_response_body_limit() -> usize {
    2000
}

/// Local state configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_state_dir")]
    pub dir: String,

    #[serde(default = "default_recent_repos_limit")]
    pub recent_repos_limit: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
            recent_repos_limit: default_recent_repos_limit(),
        }
    }
}

impl StateConfig {
    /// State directory with `~` expanded.
    pub fn dir_path(&self) -> PathBuf {
        PathBuf::from(ConfigLoader::expand_path(&self.dir))
    }
}

fn default_state_dir() -> String {
    "~/.capturekit".to_string()
}

fn default_recent_repos_limit() -> usize {
    3
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Identical errors inside this window are reported once.
    #[serde(default = "default_error_dedup_ms")]
    pub error_dedup_ms: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            error_dedup_ms: default_error_dedup_ms(),
        }
    }
}

fn default_error_dedup_ms() -> u64 {
    2000
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".capturekit").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("capturekit.toml"))
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
