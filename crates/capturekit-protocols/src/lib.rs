//! # capturekit protocols
//!
//! Shared data model and capability traits for capturekit.
//! Contains the types every other crate agrees on, plus the interfaces of the
//! external collaborators the core drives.
//!
//! ## Capabilities
//!
//! - [`KeyValueStore`] - one persistence partition (durable or ephemeral)
//! - [`DebuggerDriver`] - attach / detach / command a per-tab debugger session
//! - [`TabHost`] - active tab lookup, on-page picker control, toolbar indicator
//!
//! ## Channels
//!
//! - [`BrowserSignal`] - lifecycle events flowing from the browser into the core
//! - [`NotificationBus`] - results and errors flowing from the core to the UI

pub mod driver;
pub mod error;
pub mod host;
pub mod notify;
pub mod signal;
pub mod store;
pub mod types;

pub use driver::{DebuggerDriver, domains};
pub use error::{DriverError, DriverErrorKind, HostError, StoreError, is_not_attached_message};
pub use host::{Indicator, PickerDirective, TabHost, TabInfo};
pub use notify::{Notification, NotificationBus};
pub use signal::{BrowserSignal, TabStatus};
pub use store::{KeyValueStore, Partition};
pub use types::*;
