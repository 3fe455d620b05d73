//! LibSQL store backend.
//!
//! Keys are stored as BLOBs holding their [`Key::encode`] bytes. SQLite
//! compares BLOBs bytewise, so a prefix scan is a plain range query on the
//! primary key.

use std::path::Path;

use async_trait::async_trait;
use deadpool::managed::Object;
use libsql::params;

use super::migrations::run_migrations;
use super::pool::{LibsqlManager, LibsqlPool};
use super::{Entry, Key, KvStore, StoreError};

pub struct LibsqlStore {
    pool: LibsqlPool,
}

impl LibsqlStore {
    /// Open (or create) the database file at `path` and migrate it
    pub async fn open(path: impl AsRef<Path>, max_connections: usize) -> Result<Self, StoreError> {
        let database = libsql::Builder::new_local(path.as_ref()).build().await?;
        let pool = LibsqlPool::builder(LibsqlManager::new(database))
            .max_size(max_connections.max(1))
            .build()
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        let store = Self { pool };
        let conn = store.get_conn().await?;
        run_migrations(&conn).await?;

        tracing::info!(path = %path.as_ref().display(), "Opened libsql store");
        Ok(store)
    }

    async fn get_conn(&self) -> Result<Object<LibsqlManager>, StoreError> {
        self.pool.get().await.map_err(|e| StoreError::Pool(e.to_string()))
    }
}

#[async_trait]
impl KvStore for LibsqlStore {
    async fn get(&self, key: &Key) -> Result<Option<Vec<u8>>, StoreError> {
        let conn = self.get_conn().await?;
        let mut rows = conn.query("SELECT value FROM kv WHERE key = ?1", params![key.encode()]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<Vec<u8>>(0)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &Key, value: Vec<u8>) -> Result<(), StoreError> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key.encode(), value],
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &Key) -> Result<bool, StoreError> {
        let conn = self.get_conn().await?;
        let affected = conn.execute("DELETE FROM kv WHERE key = ?1", params![key.encode()]).await?;
        Ok(affected > 0)
    }

    async fn list(&self, prefix: &Key) -> Result<Vec<Entry>, StoreError> {
        let conn = self.get_conn().await?;
        let range = prefix.range();

        let mut rows = match range.end {
            Some(end) => {
                conn.query(
                    "SELECT key, value FROM kv WHERE key > ?1 AND key < ?2 ORDER BY key",
                    params![range.start, end],
                )
                .await?
            }
            None => {
                conn.query("SELECT key, value FROM kv WHERE key > ?1 ORDER BY key", params![range.start])
                    .await?
            }
        };

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            let key = Key::decode(&row.get::<Vec<u8>>(0)?)?;
            entries.push((key, row.get::<Vec<u8>>(1)?));
        }

        Ok(entries)
    }
}
