//! Process-local state records. Lost on restart.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::StateKey;
use crate::ports::{StateStorage, StateStorageError};

/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateStorage {
    records: Arc<RwLock<HashMap<StateKey, Value>>>,
}

impl InMemoryStateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Sorted snapshot of stored keys.
    pub async fn keys(&self) -> Vec<StateKey> {
        let mut keys: Vec<StateKey> = self.records.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl StateStorage for InMemoryStateStorage {
    async fn load(&self, key: &StateKey) -> Result<Option<Value>, StateStorageError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn save(&self, key: &StateKey, state: Value) -> Result<(), StateStorageError> {
        self.records.write().await.insert(key.clone(), state);
        Ok(())
    }

    // Single write guard: readers see all of the batch or none of it.
    async fn save_all(&self, entries: Vec<(StateKey, Value)>) -> Result<(), StateStorageError> {
        self.records.write().await.extend(entries);
        Ok(())
    }

    async fn delete(&self, key: &StateKey) -> Result<(), StateStorageError> {
        self.records.write().await.remove(key);
        Ok(())
    }
}
