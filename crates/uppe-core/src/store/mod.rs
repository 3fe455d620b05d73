/// Ordered key-value storage
///
/// This module provides the storage abstraction every other component
/// persists through:
/// - Hierarchical keys with an order-preserving byte encoding
/// - Point get/set/delete and prefix-ordered range scans
/// - An in-memory backend and a LibSQL backend behind one trait
pub mod key;
pub mod libsql_store;
pub mod memory;
pub mod migrations;
pub mod pool;

pub use key::{Key, KeyError, KeyRange};
pub use libsql_store::LibsqlStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database query failed: {0}")]
    QueryFailure(#[from] ::libsql::Error),

    #[error("Failed to get a database connection: {0}")]
    Pool(String),

    #[error("Stored key is corrupt: {0}")]
    CorruptKey(#[from] KeyError),

    #[error("Failed to (de)serialize value at {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A raw entry returned by a range scan
pub type Entry = (Key, Vec<u8>);

/// Ordered key-value store
///
/// Implementations provide per-key atomicity only. No operation spans
/// multiple keys transactionally.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the value stored at `key`
    async fn get(&self, key: &Key) -> Result<Option<Vec<u8>>, StoreError>;

    /// Insert or overwrite the value at `key`
    async fn set(&self, key: &Key, value: Vec<u8>) -> Result<(), StoreError>;

    /// Remove `key`, returning whether it existed
    async fn delete(&self, key: &Key) -> Result<bool, StoreError>;

    /// All entries strictly below `prefix`, in ascending key order
    async fn list(&self, prefix: &Key) -> Result<Vec<Entry>, StoreError>;
}

/// Typed JSON access on top of any [`KvStore`]
#[async_trait]
pub trait JsonStore: KvStore {
    async fn get_json<T>(&self, key: &Key) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(bytes) => from_json(key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn set_json<T>(&self, key: &Key, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + Sync,
    {
        let bytes = serde_json::to_vec(value)
            .map_err(|source| StoreError::Serialization { key: key.to_string(), source })?;
        self.set(key, bytes).await
    }

    async fn list_json<T>(&self, prefix: &Key) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned + Send,
    {
        self.list(prefix)
            .await?
            .into_iter()
            .map(|(key, bytes)| from_json(&key, &bytes))
            .collect()
    }
}

impl<S: KvStore + ?Sized> JsonStore for S {}

fn from_json<T: DeserializeOwned>(key: &Key, bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes)
        .map_err(|source| StoreError::Serialization { key: key.to_string(), source })
}
