//! Chrome DevTools Protocol backend.
//!
//! Talks to a browser started with `--remote-debugging-port` over one
//! browser-level WebSocket, using flattened target sessions.

mod browser;
mod client;
mod error;
mod protocol;

pub use browser::{CdpBrowser, PICK_BINDING, CANCEL_BINDING};
pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::{BrowserVersion, CdpEvent, PageInfo, TargetInfo};
