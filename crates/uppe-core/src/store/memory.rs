//! In-memory store backend.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Entry, Key, KvStore, StoreError};

/// `BTreeMap` backed store, ordered by encoded key bytes
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &Key) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.read().await.get(&key.encode()).cloned())
    }

    async fn set(&self, key: &Key, value: Vec<u8>) -> Result<(), StoreError> {
        self.data.write().await.insert(key.encode(), value);
        Ok(())
    }

    async fn delete(&self, key: &Key) -> Result<bool, StoreError> {
        Ok(self.data.write().await.remove(&key.encode()).is_some())
    }

    async fn list(&self, prefix: &Key) -> Result<Vec<Entry>, StoreError> {
        let range = prefix.range();
        let upper = match range.end {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };

        let data = self.data.read().await;
        data.range((Bound::Excluded(range.start), upper))
            .map(|(key, value)| Ok((Key::decode(key)?, value.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_delete() {
        let store = MemoryStore::new();
        let key = Key::new(["monitors", "t1", "m1"]);

        assert_eq!(store.get(&key).await.unwrap(), None);

        store.set(&key, b"one".to_vec()).await.unwrap();
        store.set(&key, b"two".to_vec()).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(b"two".to_vec()));

        assert!(store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_is_prefix_bounded_and_ordered() {
        let store = MemoryStore::new();
        for key in [
            Key::new(["monitors", "t1", "b"]),
            Key::new(["monitors", "t10", "a"]),
            Key::new(["monitors", "t1", "a"]),
            Key::new(["monitors", "t1"]),
            Key::new(["monitor-logs", "t1", "a", "l1"]),
        ] {
            store.set(&key, key.to_string().into_bytes()).await.unwrap();
        }

        let keys: Vec<Key> = store
            .list(&Key::new(["monitors", "t1"]))
            .await
            .unwrap()
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        assert_eq!(keys, vec![Key::new(["monitors", "t1", "a"]), Key::new(["monitors", "t1", "b"])]);
        assert_eq!(store.list(&Key::root()).await.unwrap().len(), 5);
        assert_eq!(store.list(&Key::new(["monitors"])).await.unwrap().len(), 4);
    }
}
