//! Test doubles for capturekit.
//!
//! - [`MockDriver`]: scripted debugger driver that records every call
//! - [`MockHost`]: scripted tab host that records directives and indicator changes
//! - [`FailingStore`]: partition whose writes always fail
//! - [`fixtures`]: sample elements, sources and protocol events

pub mod driver;
pub mod fixtures;
pub mod host;
pub mod store;

pub use driver::{DriverCall, MockDriver};
pub use host::MockHost;
pub use store::FailingStore;
