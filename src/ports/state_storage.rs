//! State Storage Port - Interface for persisting per-key conversation state.
//!
//! Records are opaque JSON documents addressed by [`StateKey`]. The turn
//! pipeline stores the dialog stack and the feedback state this way.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::domain::foundation::StateKey;

/// Errors that can occur during state storage operations
#[derive(Debug, thiserror::Error)]
pub enum StateStorageError {
    #[error("Failed to serialize state for {key}: {reason}")]
    SerializationFailed { key: StateKey, reason: String },

    #[error("Failed to deserialize state for {key}: {reason}")]
    DeserializationFailed { key: StateKey, reason: String },

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Port for persisting and loading state records
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Load a record, `None` when nothing has been saved under the key.
    async fn load(&self, key: &StateKey) -> Result<Option<Value>, StateStorageError>;

    /// Save a record, replacing any previous value.
    async fn save(&self, key: &StateKey, state: Value) -> Result<(), StateStorageError>;

    /// Save several records as one write.
    ///
    /// Implementations should make this all-or-nothing where the backend
    /// allows it. The default saves one by one.
    async fn save_all(&self, entries: Vec<(StateKey, Value)>) -> Result<(), StateStorageError> {
        for (key, state) in entries {
            self.save(&key, state).await?;
        }
        Ok(())
    }

    /// Delete a record. Deleting a missing key is not an error.
    async fn delete(&self, key: &StateKey) -> Result<(), StateStorageError>;
}

/// Loads a typed record, falling back to its default when absent.
pub async fn load_or_default<T>(
    storage: &dyn StateStorage,
    key: &StateKey,
) -> Result<T, StateStorageError>
where
    T: DeserializeOwned + Default,
{
    match storage.load(key).await? {
        Some(value) => serde_json::from_value(value).map_err(|e| {
            StateStorageError::DeserializationFailed {
                key: key.clone(),
                reason: e.to_string(),
            }
        }),
        None => Ok(T::default()),
    }
}

/// Serializes a typed record into a storage entry.
pub fn to_entry<T: Serialize>(
    key: &StateKey,
    state: &T,
) -> Result<(StateKey, Value), StateStorageError> {
    let value = serde_json::to_value(state).map_err(|e| StateStorageError::SerializationFailed {
        key: key.clone(),
        reason: e.to_string(),
    })?;
    Ok((key.clone(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationKey;

    fn key() -> StateKey {
        StateKey::dialog(&ConversationKey::new("c1").unwrap())
    }

    #[test]
    fn test_state_storage_error_display() {
        let err = StateStorageError::DeserializationFailed {
            key: key(),
            reason: "bad yaml".to_string(),
        };
        assert!(err.to_string().contains("conversation/c1/dialog"));
        assert!(err.to_string().contains("deserialize"));
    }

    #[test]
    fn test_to_entry_serializes_value() {
        let (entry_key, value) = to_entry(&key(), &vec![1, 2, 3]).unwrap();
        assert_eq!(entry_key, key());
        assert_eq!(value, serde_json::json!([1, 2, 3]));
    }
}
