//! Data model shared across the capture pipeline.

mod capture;
mod element;
mod records;
mod remote;

pub use capture::*;
pub use element::*;
pub use records::*;
pub use remote::*;

/// Browser tab identifier.
pub type TabId = i64;

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
