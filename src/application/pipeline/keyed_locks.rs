//! Per-key async locks so turns for the same state never overlap.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::StateKey;

/// Lazily created async mutex per [`StateKey`].
///
/// Unused entries are pruned on the next acquisition, so the map only
/// grows with the number of keys that are busy at the same time.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<StateKey, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks every key, in sorted order, and holds them until the guards drop.
    ///
    /// Sorting gives every caller the same acquisition order, so two turns
    /// sharing more than one key cannot deadlock.
    pub async fn lock_all(&self, keys: &[StateKey]) -> Vec<OwnedMutexGuard<()>> {
        let mut keys: Vec<&StateKey> = keys.iter().collect();
        keys.sort();
        keys.dedup();

        let mutexes: Vec<Arc<AsyncMutex<()>>> = {
            let mut locks = match self.locks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            locks.retain(|_, m| Arc::strong_count(m) > 1);
            keys.iter()
                .map(|key| {
                    Arc::clone(
                        locks
                            .entry((*key).clone())
                            .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
                    )
                })
                .collect()
        };

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }
        guards
    }

    /// Number of keys currently tracked.
    pub fn tracked(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationKey;
    use std::time::Duration;

    fn key(id: &str) -> StateKey {
        StateKey::dialog(&ConversationKey::new(id).unwrap())
    }

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let guards = locks.lock_all(&[key("a")]).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move { locks.lock_all(&[key("a")]).await.len() })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guards);
        assert_eq!(contender.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock_all(&[key("a")]).await;

        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock_all(&[key("b")])).await;

        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn duplicate_keys_lock_once() {
        let locks = KeyedLocks::new();
        let guards = locks.lock_all(&[key("a"), key("a")]).await;
        assert_eq!(guards.len(), 1);
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = KeyedLocks::new();
        drop(locks.lock_all(&[key("a"), key("b")]).await);

        let _c = locks.lock_all(&[key("c")]).await;

        assert_eq!(locks.tracked(), 1);
    }
}
