//! # capturekit coordinator
//!
//! Subscribes to browser lifecycle signals and user intents and turns each
//! into state manager / debugger controller calls. Nothing else in the
//! workspace touches the stores or the driver directly.

mod coordinator;
mod intent;

pub use coordinator::Coordinator;
pub use intent::{Command, Intent, PanelData, Reply, StatusReport};
