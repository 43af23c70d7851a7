//! One-shot commands that work without a browser.

use std::path::Path;
use std::sync::Arc;

use capturekit_api::{RemoteCaches, TaskApiClient};
use capturekit_config::{Config, ConfigValidator};
use capturekit_protocols::TabHost;
use capturekit_state::StateManager;

use crate::adapters::{HeadlessHost, durable_path, notification_bus, open_state};
use crate::cmd_run::print_notification;

async fn headless_state(config: &Config) -> Result<Arc<StateManager>, Box<dyn std::error::Error>> {
    let host: Arc<dyn TabHost> = Arc::new(HeadlessHost);
    Ok(open_state(config, host).await?)
}

pub(crate) async fn set_api_key(config: &Config, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let key = key.trim();
    if key.is_empty() {
        return Err("API key cannot be empty".into());
    }
    let state = headless_state(config).await?;
    state.set_api_key(key.to_string()).await;
    println!("API key saved to {}", durable_path(config).display());
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Listing {
    Sources,
    History,
}

/// Print the cached listing, then the fresh one.
pub(crate) async fn list(config: &Config, listing: Listing) -> Result<(), Box<dyn std::error::Error>> {
    let state = headless_state(config).await?;
    let Some(api_key) = state.api_key() else {
        return Err("API Key not set. Run `capturekit set-api-key <key>` first.".into());
    };

    let bus = notification_bus(config);
    let mut rx = bus.subscribe();
    let api = Arc::new(TaskApiClient::new(&config.api)?);
    let caches = RemoteCaches::new(api, state, bus);
    match listing {
        Listing::Sources => caches.refresh_sources(&api_key).await,
        Listing::History => caches.refresh_history(&api_key).await,
    }

    while let Ok(notification) = rx.try_recv() {
        print_notification(&notification);
    }
    Ok(())
}

/// Print the effective configuration and any validation findings.
pub(crate) fn show_config(config: &Config, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("# {}", path.display());
    println!("{}", toml::to_string_pretty(config)?);

    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        println!("warning: {}", warning);
    }
    for error in &result.errors {
        println!("error: {}", error);
    }
    if !result.is_valid() {
        return Err(format!("{} configuration error(s)", result.errors.len()).into());
    }
    Ok(())
}
