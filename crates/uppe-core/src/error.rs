use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// A required field is missing or empty
    #[error("{0}")]
    Validation(String),

    #[error("Monitor not found")]
    NotFound,

    /// The outbound probe failed before a response was received
    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Failed to publish task: {0}")]
    Publish(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;
