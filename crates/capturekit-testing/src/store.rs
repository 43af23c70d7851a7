//! Partition that refuses writes.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use capturekit_protocols::{KeyValueStore, StoreError};

/// Reads return nothing (or fail, if `fail_reads`); writes always fail with
/// a quota error.
#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    pub fail_reads: bool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreadable() -> Self {
        Self { fail_reads: true }
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _keys: &[&str]) -> Result<HashMap<String, Value>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Unavailable("storage offline".to_string()));
        }
        Ok(HashMap::new())
    }

    async fn set(&self, key: &str, _value: Value) -> Result<(), StoreError> {
        Err(StoreError::QuotaExceeded(key.to_string()))
    }

    async fn remove(&self, _keys: &[&str]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage offline".to_string()))
    }
}
