use std::sync::Arc;

use tracing::info;
use uppe_core::jobs::{
    Checker, HttpChecker, HttpTaskPublisher, LocalTaskPublisher, TaskPublisher, VerificationExecutor,
    VerificationFanOut,
};
use uppe_core::store::{KvStore, LibsqlStore, MemoryStore};
use uppe_core::{LogStore, MonitorRegistry};

use crate::config::{Config, PublisherKind, StoreBackend};
use crate::error::AppError;

/// Components shared by every handler, all backed by one store handle
#[derive(Clone)]
pub struct AppState {
    pub registry: MonitorRegistry,
    pub logs: LogStore,
    pub fan_out: VerificationFanOut,
    pub executor: VerificationExecutor,
}

impl AppState {
    pub fn new(
        store: Arc<dyn KvStore>,
        publisher: Arc<dyn TaskPublisher>,
        checker: Arc<dyn Checker>,
        config: &Config,
    ) -> Result<Self, AppError> {
        let registry = MonitorRegistry::new(store.clone());
        let logs = LogStore::new(store);
        let fan_out = VerificationFanOut::new(
            registry.clone(),
            publisher,
            config.api_url()?,
            config.jobs.topic.clone(),
            config.jobs.concurrency,
        )?;
        let executor = VerificationExecutor::new(registry.clone(), logs.clone(), checker);

        Ok(Self { registry, logs, fan_out, executor })
    }

    /// Open the store and build publisher and checker as configured
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let store: Arc<dyn KvStore> = match config.store.backend {
            StoreBackend::Libsql => {
                Arc::new(LibsqlStore::open(&config.store.path, config.store.max_connections).await?)
            }
            StoreBackend::Memory => {
                info!("Using in-memory store, data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let client = reqwest::Client::builder().user_agent(&config.probe.user_agent).build()?;
        let publisher: Arc<dyn TaskPublisher> = match config.jobs.publisher {
            PublisherKind::Local => Arc::new(LocalTaskPublisher::new(client)),
            PublisherKind::Http => Arc::new(HttpTaskPublisher::new(
                client,
                config.jobs_endpoint()?,
                config.jobs.api_key.clone(),
                config.publish_timeout(),
            )),
        };

        let checker = Arc::new(HttpChecker::new(config.probe_timeout(), &config.probe.user_agent)?);

        Self::new(store, publisher, checker, config)
    }
}
