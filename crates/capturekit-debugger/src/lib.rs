//! # capturekit debugger
//!
//! Keeps the debugger attachment consistent with the capture flags and the
//! active tab, and turns protocol events into console and network records.
//!
//! ## Components
//!
//! - [`DebuggerController`] - `reconcile` / `detach` / event intake, one
//!   session at a time
//! - [`events`] - pure translation of protocol event payloads
//! - [`cdp`] - Chrome DevTools Protocol backend implementing both
//!   [`capturekit_protocols::DebuggerDriver`] and [`capturekit_protocols::TabHost`]

pub mod cdp;
mod controller;
pub mod events;

pub use cdp::{CdpBrowser, CdpClient, CdpError};
pub use controller::{DebuggerController, SessionPhase};
