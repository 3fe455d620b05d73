use std::sync::Arc;

use tracing::{info, warn};

use super::checker::Checker;
use crate::error::Result;
use crate::logs::LogStore;
use crate::models::MonitorLog;
use crate::registry::MonitorRegistry;

/// Verification executor - probes one monitor and records the outcome
///
/// Holds no per-invocation state, so redelivered or concurrent invocations
/// for the same monitor each append their own log.
#[derive(Clone)]
pub struct VerificationExecutor {
    registry: MonitorRegistry,
    logs: LogStore,
    checker: Arc<dyn Checker>,
}

impl VerificationExecutor {
    pub fn new(registry: MonitorRegistry, logs: LogStore, checker: Arc<dyn Checker>) -> Self {
        Self { registry, logs, checker }
    }

    /// Probe the monitor and append a log owned by the monitor's owner
    ///
    /// Fails with `NotFound` when the monitor no longer exists and with
    /// `Probe` when no response was received; neither writes a log.
    pub async fn execute(&self, monitor_id: &str) -> Result<MonitorLog> {
        let monitor = self.registry.find_by_id(monitor_id).await?;

        let outcome = self.checker.check(&monitor.method, &monitor.url).await.inspect_err(|e| {
            warn!(monitor_id, owner = %monitor.owner, url = %monitor.url, "Verification probe failed: {e}");
        })?;

        let log = self
            .logs
            .record(&monitor.owner, &monitor.id, outcome.status_code, outcome.response_time, outcome.data)
            .await?;

        info!(
            monitor_id,
            owner = %monitor.owner,
            status_code = log.status_code,
            response_time_ms = log.response_time,
            "Monitor verified"
        );
        Ok(log)
    }
}
