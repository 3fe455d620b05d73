//! Append-only monitor log storage.

use std::sync::Arc;

use tracing::debug;

use crate::error::{MonitorError, Result};
use crate::keyspace;
use crate::models::{LogData, MonitorLog, NewLog};
use crate::store::{JsonStore, KvStore};

#[derive(Clone)]
pub struct LogStore {
    store: Arc<dyn KvStore>,
}

impl LogStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Append a caller-supplied log entry
    ///
    /// The monitor id is not checked against the registry: any tenant may
    /// write logs under any id of its own keyspace.
    pub async fn append(&self, owner: &str, monitor_id: &str, new: NewLog) -> Result<MonitorLog> {
        let (Some(status_code), Some(response_time), Some(data)) =
            (new.status_code, new.response_time, new.data)
        else {
            return Err(MonitorError::Validation(
                "Status code, response time, and data are required".into(),
            ));
        };

        self.record(owner, monitor_id, status_code, response_time, data).await
    }

    /// Persist one log entry under the owner's keyspace
    pub async fn record(
        &self,
        owner: &str,
        monitor_id: &str,
        status_code: u16,
        response_time: u64,
        data: LogData,
    ) -> Result<MonitorLog> {
        let log = MonitorLog::new(
            owner.to_string(),
            monitor_id.to_string(),
            status_code,
            response_time,
            data,
        );
        self.store.set_json(&keyspace::log(owner, monitor_id, &log.id), &log).await?;

        debug!(log_id = %log.id, monitor_id, owner, status_code, "Stored monitor log");
        Ok(log)
    }

    pub async fn list(&self, owner: &str, monitor_id: &str) -> Result<Vec<MonitorLog>> {
        Ok(self.store.list_json(&keyspace::logs_of(owner, monitor_id)).await?)
    }
}
