//! Tenant-scoped CRUD over monitors.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{MonitorError, Result};
use crate::keyspace;
use crate::models::{Monitor, MonitorPatch, NewMonitor, new_id};
use crate::store::{JsonStore, KvStore};

/// Monitor registry
///
/// Every operation except [`MonitorRegistry::find_by_id`] takes the tenant
/// explicitly and only touches keys under that tenant's prefix.
#[derive(Clone)]
pub struct MonitorRegistry {
    store: Arc<dyn KvStore>,
}

impl MonitorRegistry {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, owner: &str, new: NewMonitor) -> Result<Monitor> {
        let (Some(name), Some(url), Some(method)) = (
            new.name.filter(|s| !s.is_empty()),
            new.url.filter(|s| !s.is_empty()),
            new.method.filter(|s| !s.is_empty()),
        ) else {
            return Err(MonitorError::Validation("Name, URL, and method are required".into()));
        };

        let monitor = Monitor { id: new_id(), name, url, method, owner: owner.to_string() };

        // Index first: a dangling index entry only ever resolves to NotFound
        self.store.set_json(&keyspace::monitor_owner(&monitor.id), &monitor.owner).await?;
        self.store.set_json(&keyspace::monitor(owner, &monitor.id), &monitor).await?;

        info!(monitor_id = %monitor.id, owner, "Created monitor");
        Ok(monitor)
    }

    pub async fn list(&self, owner: &str) -> Result<Vec<Monitor>> {
        Ok(self.store.list_json(&keyspace::monitors_of(owner)).await?)
    }

    pub async fn get(&self, owner: &str, id: &str) -> Result<Monitor> {
        self.store
            .get_json(&keyspace::monitor(owner, id))
            .await?
            .ok_or(MonitorError::NotFound)
    }

    /// Read-modify-write of the supplied fields; concurrent updates race and
    /// the last write wins.
    pub async fn update(&self, owner: &str, id: &str, patch: MonitorPatch) -> Result<Monitor> {
        let key = keyspace::monitor(owner, id);
        let current: Monitor = self.store.get_json(&key).await?.ok_or(MonitorError::NotFound)?;

        let updated = current.apply(patch);
        self.store.set_json(&key, &updated).await?;

        debug!(monitor_id = id, owner, "Updated monitor");
        Ok(updated)
    }

    /// Remove a monitor. Its logs are left in place.
    pub async fn delete(&self, owner: &str, id: &str) -> Result<()> {
        if !self.store.delete(&keyspace::monitor(owner, id)).await? {
            return Err(MonitorError::NotFound);
        }
        self.store.delete(&keyspace::monitor_owner(id)).await?;

        info!(monitor_id = id, owner, "Deleted monitor");
        Ok(())
    }

    /// Resolve a monitor from its id alone through the owner index
    pub async fn find_by_id(&self, id: &str) -> Result<Monitor> {
        let owner: String = self
            .store
            .get_json(&keyspace::monitor_owner(id))
            .await?
            .ok_or(MonitorError::NotFound)?;

        self.get(&owner, id).await
    }

    /// Every monitor of every tenant, for fan-out only
    pub async fn list_all(&self) -> Result<Vec<Monitor>> {
        Ok(self.store.list_json(&keyspace::all_monitors()).await?)
    }
}
