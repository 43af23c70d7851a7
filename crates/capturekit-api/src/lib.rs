//! # capturekit api
//!
//! Client for the remote task API plus the pieces built on top of it:
//!
//! - [`TaskApiClient`] - sources, session creation, session history
//! - [`RemoteCaches`] - stale-while-revalidate listings backed by the state manager
//! - [`prompt`] - assembling the task prompt from the captured context

mod cache;
mod client;
mod error;
pub mod prompt;
mod types;

pub use cache::RemoteCaches;
pub use client::TaskApiClient;
pub use error::ApiError;
pub use prompt::{PromptContext, build_prompt, task_title};
pub use types::NewTask;
