use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use super::publisher::{Task, TaskPublisher};
use crate::error::{MonitorError, Result};
use crate::registry::MonitorRegistry;

pub const VERIFY_TOPIC: &str = "monitor::verify";

/// A monitor whose task could not be published
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedTask {
    pub monitor_id: String,
    pub error: String,
}

/// Outcome of one fan-out pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    pub scheduled: usize,
    pub failed: Vec<FailedTask>,
}

/// Schedules one verification task per monitor across all tenants
#[derive(Clone)]
pub struct VerificationFanOut {
    registry: MonitorRegistry,
    publisher: Arc<dyn TaskPublisher>,
    api_url: Url,
    topic: String,
    concurrency: usize,
}

impl VerificationFanOut {
    /// `api_url` is the public base URL under which `/jobs/verify/{id}` is served
    pub fn new(
        registry: MonitorRegistry,
        publisher: Arc<dyn TaskPublisher>,
        api_url: Url,
        topic: impl Into<String>,
        concurrency: usize,
    ) -> Result<Self> {
        if api_url.cannot_be_a_base() {
            return Err(MonitorError::Validation(format!("API URL cannot be a base: {api_url}")));
        }

        Ok(Self { registry, publisher, api_url, topic: topic.into(), concurrency: concurrency.max(1) })
    }

    /// Verification endpoint for one monitor
    pub fn target_for(&self, monitor_id: &str) -> String {
        let mut url = self.api_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["jobs", "verify", monitor_id]);
        }
        url.into()
    }

    /// Publish a verification task for every monitor
    ///
    /// Only a failed scan is an error. Publish failures are collected in the
    /// report and never stop the remaining monitors from being scheduled.
    pub async fn trigger_all(&self) -> Result<FanOutReport> {
        let monitors = self.registry.list_all().await?;
        let total = monitors.len();

        let results: Vec<(String, Result<()>)> = stream::iter(monitors)
            .map(|monitor| async move {
                let task = Task {
                    topic: self.topic.clone(),
                    target: self.target_for(&monitor.id),
                    method: "POST".to_string(),
                };
                let result = self.publisher.publish(&task).await;
                (monitor.id, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = FanOutReport::default();
        for (monitor_id, result) in results {
            match result {
                Ok(()) => report.scheduled += 1,
                Err(e) => {
                    warn!(%monitor_id, "Failed to schedule verification: {e}");
                    report.failed.push(FailedTask { monitor_id, error: e.to_string() });
                }
            }
        }

        info!(total, scheduled = report.scheduled, failed = report.failed.len(), "Verification fan-out finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMonitor;
    use crate::store::MemoryStore;
    use crate::jobs::publisher::{HttpTaskPublisher, LocalTaskPublisher};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::{Mutex, mpsc};
    use tokio::time::timeout;

    /// Records tasks, failing for targets that contain `fail_on`
    #[derive(Default)]
    struct RecordingPublisher {
        tasks: Mutex<Vec<Task>>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl TaskPublisher for RecordingPublisher {
        async fn publish(&self, task: &Task) -> Result<()> {
            if self.fail_on.as_deref().is_some_and(|id| task.target.contains(id)) {
                return Err(MonitorError::Publish("rejected".into()));
            }
            self.tasks.lock().await.push(task.clone());
            Ok(())
        }
    }

    fn ping() -> NewMonitor {
        NewMonitor {
            name: Some("ping".into()),
            url: Some("http://x".into()),
            method: Some("GET".into()),
        }
    }

    /// Accept connections, report each one, and never answer
    async fn silent_service() -> (Url, mpsc::UnboundedReceiver<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
                let _ = tx.send(());
            }
        });

        (Url::parse(&format!("http://{addr}/")).unwrap(), rx)
    }

    fn fan_out(registry: MonitorRegistry, publisher: Arc<RecordingPublisher>) -> VerificationFanOut {
        let api_url = Url::parse("http://api.test/").unwrap();
        VerificationFanOut::new(registry, publisher, api_url, VERIFY_TOPIC, 4).unwrap()
    }

    #[tokio::test]
    async fn test_one_task_per_monitor_across_tenants() {
        let registry = MonitorRegistry::new(Arc::new(MemoryStore::new()));
        let a = registry.create("a", ping()).await.unwrap();
        let b = registry.create("b", ping()).await.unwrap();

        let publisher = Arc::new(RecordingPublisher::default());
        let report = fan_out(registry, publisher.clone()).trigger_all().await.unwrap();

        assert_eq!(report, FanOutReport { scheduled: 2, failed: vec![] });

        let tasks = publisher.tasks.lock().await;
        let targets: HashSet<_> = tasks.iter().map(|task| task.target.clone()).collect();
        assert_eq!(
            targets,
            HashSet::from([
                format!("http://api.test/jobs/verify/{}", a.id),
                format!("http://api.test/jobs/verify/{}", b.id),
            ])
        );
        assert!(tasks.iter().all(|task| task.method == "POST" && task.topic == VERIFY_TOPIC));
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_abort_fan_out() {
        let registry = MonitorRegistry::new(Arc::new(MemoryStore::new()));
        let failing = registry.create("a", ping()).await.unwrap();
        registry.create("a", ping()).await.unwrap();
        registry.create("b", ping()).await.unwrap();

        let publisher =
            Arc::new(RecordingPublisher { fail_on: Some(failing.id.clone()), ..Default::default() });
        let report = fan_out(registry, publisher.clone()).trigger_all().await.unwrap();

        assert_eq!(report.scheduled, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].monitor_id, failing.id);
        assert_eq!(publisher.tasks.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_stalled_job_service_is_reported_as_failure() {
        let registry = MonitorRegistry::new(Arc::new(MemoryStore::new()));
        let monitor = registry.create("a", ping()).await.unwrap();

        let (endpoint, _accepted) = silent_service().await;
        let publisher =
            Arc::new(HttpTaskPublisher::new(reqwest::Client::new(), endpoint, None, Duration::from_millis(200)));
        let fan_out = VerificationFanOut::new(
            registry,
            publisher,
            Url::parse("http://api.test/").unwrap(),
            VERIFY_TOPIC,
            4,
        )
        .unwrap();

        let report = timeout(Duration::from_secs(5), fan_out.trigger_all())
            .await
            .expect("fan-out waited on the job service")
            .unwrap();

        assert_eq!(report.scheduled, 0);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].monitor_id, monitor.id);
    }

    #[tokio::test]
    async fn test_local_fan_out_does_not_wait_for_verification() {
        let registry = MonitorRegistry::new(Arc::new(MemoryStore::new()));
        registry.create("a", ping()).await.unwrap();
        registry.create("b", ping()).await.unwrap();

        // Verification targets accept the task but never finish it
        let (api_url, mut accepted) = silent_service().await;
        let publisher = Arc::new(LocalTaskPublisher::new(reqwest::Client::new()));
        let fan_out = VerificationFanOut::new(registry, publisher, api_url, VERIFY_TOPIC, 4).unwrap();

        let report = timeout(Duration::from_secs(1), fan_out.trigger_all())
            .await
            .expect("fan-out waited for verification")
            .unwrap();
        assert_eq!(report, FanOutReport { scheduled: 2, failed: vec![] });

        for _ in 0..2 {
            timeout(Duration::from_secs(2), accepted.recv()).await.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn test_empty_registry_schedules_nothing() {
        let registry = MonitorRegistry::new(Arc::new(MemoryStore::new()));
        let publisher = Arc::new(RecordingPublisher::default());

        let report = fan_out(registry, publisher).trigger_all().await.unwrap();
        assert_eq!(report, FanOutReport::default());
    }

    #[test]
    fn test_target_keeps_base_path() {
        let registry = MonitorRegistry::new(Arc::new(MemoryStore::new()));
        let publisher: Arc<dyn TaskPublisher> = Arc::new(RecordingPublisher::default());
        let fan_out = VerificationFanOut::new(
            registry,
            publisher,
            Url::parse("https://example.com/api").unwrap(),
            VERIFY_TOPIC,
            1,
        )
        .unwrap();

        assert_eq!(fan_out.target_for("m 1"), "https://example.com/api/jobs/verify/m%201");
    }
}
