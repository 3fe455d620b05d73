//! Uppe core - tenant-scoped uptime monitoring
//!
//! Monitors and their probe logs live in an ordered key-value store, keyed
//! per tenant ("channel"). A fan-out pass schedules one verification task per
//! monitor through a [`jobs::TaskPublisher`], and each delivered task runs the
//! [`jobs::VerificationExecutor`] which probes the target and appends a log.

pub mod error;
pub mod jobs;
pub mod keyspace;
pub mod logs;
pub mod models;
pub mod registry;
pub mod store;

pub use error::{MonitorError, Result};
pub use logs::LogStore;
pub use models::{LogData, Monitor, MonitorLog, MonitorPatch, NewLog, NewMonitor};
pub use registry::MonitorRegistry;
