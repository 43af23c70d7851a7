//! Error types for the capability layer.

mod driver;
mod host;
mod store;

pub use driver::*;
pub use host::*;
pub use store::*;
