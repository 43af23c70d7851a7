//! Key/value persistence partitions.
//!
//! The core keeps two independently-lifetimed partitions: durable (survives
//! restarts) and ephemeral (lives for one browser session). Both expose the
//! same contract.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// Which partition a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Durable,
    Ephemeral,
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Partition::Durable => f.write_str("durable"),
            Partition::Ephemeral => f.write_str("ephemeral"),
        }
    }
}

/// One persistence partition.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the given keys. Missing keys are absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StoreError>;

    /// Write a single key.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Remove keys. Removing a missing key is not an error.
    async fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;
}
