//! # capturekit state
//!
//! The single authoritative owner of extension state. Reads are served from an
//! in-memory mirror; writes update the mirror first and then persist to the
//! durable or ephemeral partition on a best-effort basis.

pub mod buffer;
pub mod keys;
mod manager;
pub mod store;

pub use buffer::RecordBuffer;
pub use manager::{StateManager, StateSnapshot};
pub use store::{FileStore, MemoryStore};
