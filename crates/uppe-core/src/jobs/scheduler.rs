use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use super::fanout::VerificationFanOut;

/// Runs fan-out on a fixed period, for deployments without an external cron
pub struct FanOutScheduler {
    fan_out: VerificationFanOut,
    period: Duration,
}

impl FanOutScheduler {
    pub fn new(fan_out: VerificationFanOut, period: Duration) -> Self {
        Self { fan_out, period }
    }

    /// Spawn the loop; the first pass runs immediately
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = interval(self.period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                timer.tick().await;

                if let Err(e) = self.fan_out.trigger_all().await {
                    tracing::error!("Scheduled fan-out failed: {e}");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::jobs::publisher::{Task, TaskPublisher};
    use crate::models::NewMonitor;
    use crate::registry::MonitorRegistry;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use url::Url;

    struct ChannelPublisher(mpsc::UnboundedSender<Task>);

    #[async_trait]
    impl TaskPublisher for ChannelPublisher {
        async fn publish(&self, task: &Task) -> Result<()> {
            let _ = self.0.send(task.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_scheduler_publishes_every_period() {
        let registry = MonitorRegistry::new(Arc::new(MemoryStore::new()));
        registry
            .create(
                "t1",
                NewMonitor {
                    name: Some("ping".into()),
                    url: Some("http://x".into()),
                    method: Some("GET".into()),
                },
            )
            .await
            .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let fan_out = VerificationFanOut::new(
            registry,
            Arc::new(ChannelPublisher(tx)),
            Url::parse("http://api.test").unwrap(),
            "monitor::verify",
            1,
        )
        .unwrap();

        let handle = FanOutScheduler::new(fan_out, Duration::from_millis(50)).spawn();

        for _ in 0..2 {
            let task = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("Timeout waiting for task")
                .expect("Channel closed");
            assert!(task.target.starts_with("http://api.test/jobs/verify/"));
        }

        handle.abort();
    }
}
