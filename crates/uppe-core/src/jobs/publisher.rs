//! Task publishers deliver verification tasks to their target.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{MonitorError, Result};

/// One unit of deferred work: invoke `target` with `method`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub topic: String,
    pub target: String,
    pub method: String,
}

/// Push-based task dispatch
///
/// `publish` returns once the task is accepted, never after it ran.
/// Delivery is at-least-once and unordered.
#[async_trait]
pub trait TaskPublisher: Send + Sync {
    async fn publish(&self, task: &Task) -> Result<()>;
}

/// Publishes to an external job service over HTTP
///
/// The task is POSTed as JSON to `endpoint`; the service then invokes the
/// task target on its own schedule and redelivers on failure. A service that
/// does not answer within `timeout` counts as a failed publish.
pub struct HttpTaskPublisher {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpTaskPublisher {
    pub fn new(client: reqwest::Client, endpoint: Url, api_key: Option<String>, timeout: Duration) -> Self {
        Self { client, endpoint, api_key, timeout }
    }
}

#[async_trait]
impl TaskPublisher for HttpTaskPublisher {
    async fn publish(&self, task: &Task) -> Result<()> {
        let mut request = self.client.post(self.endpoint.clone()).timeout(self.timeout).json(task);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| MonitorError::Publish(e.to_string()))?;

        debug!(topic = %task.topic, target = %task.target, "Published task");
        Ok(())
    }
}

/// In-process publisher for running without a job service
///
/// Each task is invoked exactly once on a spawned tokio task. Failed
/// invocations are logged and dropped.
#[derive(Clone)]
pub struct LocalTaskPublisher {
    client: reqwest::Client,
}

impl LocalTaskPublisher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskPublisher for LocalTaskPublisher {
    async fn publish(&self, task: &Task) -> Result<()> {
        let method = Method::from_bytes(task.method.as_bytes())
            .map_err(|_| MonitorError::Publish(format!("Invalid task method: {}", task.method)))?;
        let target = Url::parse(&task.target)
            .map_err(|e| MonitorError::Publish(format!("Invalid task target {}: {e}", task.target)))?;

        let client = self.client.clone();
        let topic = task.topic.clone();
        tokio::spawn(async move {
            match client.request(method, target.clone()).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(%topic, %target, "Delivered task");
                }
                Ok(response) => {
                    warn!(%topic, %target, status = response.status().as_u16(), "Task invocation failed");
                }
                Err(e) => warn!(%topic, %target, "Task delivery failed: {e}"),
            }
        });

        Ok(())
    }
}
