//! Notifications from the core to whatever UI is attached.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::types::{RemoteSession, Source};

/// A result or failure the UI should show.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// One-line user-facing error.
    Error(String),
    /// First source listing (cached or fresh).
    SourcesLoaded(Vec<Source>),
    /// Fresh source listing that replaces a cached one.
    SourcesRefreshed(Vec<Source>),
    HistoryLoaded {
        sessions: Vec<RemoteSession>,
        from_cache: bool,
    },
    TaskCreated {
        session: RemoteSession,
        url: String,
    },
    ElementCaptured {
        selector: String,
    },
}

struct LastError {
    message: String,
    at: Instant,
}

/// Broadcast channel with de-duplication of repeated errors.
#[derive(Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
    last_error: std::sync::Arc<Mutex<Option<LastError>>>,
    dedup_window: Duration,
}

impl NotificationBus {
    pub fn new(dedup_window: Duration) -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            sender,
            last_error: std::sync::Arc::new(Mutex::new(None)),
            dedup_window,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Publish a notification. Having no subscribers is fine.
    pub fn publish(&self, notification: Notification) {
        let _ = self.sender.send(notification);
    }

    /// Publish an error unless the same text went out within the window.
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        {
            let mut last = self.last_error.lock();
            if let Some(prev) = last.as_ref() {
                if prev.message == message && prev.at.elapsed() < self.dedup_window {
                    debug!("Suppressing repeated error: {}", message);
                    return;
                }
            }
            *last = Some(LastError {
                message: message.clone(),
                at: Instant::now(),
            });
        }
        self.publish(Notification::Error(message));
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_repeated_error_suppressed() {
        let bus = NotificationBus::new(Duration::from_secs(60));
        let mut rx = bus.subscribe();

        bus.error("Debugger error: boom");
        bus.error("Debugger error: boom");
        bus.error("Could not fetch sources.");

        assert_eq!(rx.recv().await.unwrap(), Notification::Error("Debugger error: boom".into()));
        assert_eq!(
            rx.recv().await.unwrap(),
            Notification::Error("Could not fetch sources.".into())
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_zero_window_repeats() {
        let bus = NotificationBus::new(Duration::ZERO);
        let mut rx = bus.subscribe();

        bus.error("x");
        bus.error("x");

        assert!(rx.recv().await.is_ok());
        assert!(rx.recv().await.is_ok());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = NotificationBus::default();
        bus.publish(Notification::ElementCaptured {
            selector: "div".to_string(),
        });
    }
}
