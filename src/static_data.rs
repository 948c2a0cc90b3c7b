//! Per-node persisted key-value state.
//!
//! Triggers keep small pieces of state between runs (the RSS watermark, for
//! one). The store is always passed in explicitly; nothing here is global.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Key-value store scoped by node instance
#[async_trait]
pub trait StaticDataStore: Send + Sync {
    /// Value stored under `key` for `node_id`, if any
    async fn get(&self, node_id: &str, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key` for `node_id`, replacing any previous value
    async fn set(&self, node_id: &str, key: &str, value: &str) -> Result<()>;
}

/// Process-local store, lost on drop
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<(String, String), String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StaticDataStore for MemoryStore {
    async fn get(&self, node_id: &str, key: &str) -> Result<Option<String>> {
        let values = self.values.read().await;
        Ok(values
            .get(&(node_id.to_string(), key.to_string()))
            .cloned())
    }

    async fn set(&self, node_id: &str, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert((node_id.to_string(), key.to_string()), value.to_string());
        Ok(())
    }
}
