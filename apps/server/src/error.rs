use std::io::Error as IoError;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use uppe_core::MonitorError;
use uppe_core::store::StoreError;

use crate::config::ConfigError;

/// Startup failures; any of these ends the process
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to open store: {0}")]
    Store(#[from] StoreError),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("Failed to set up verification: {0}")]
    Setup(#[from] MonitorError),
}

/// Request failures, rendered as `{"error": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("x-channel header is required")]
    MissingChannel,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingChannel | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Monitor(MonitorError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Monitor(MonitorError::NotFound) => StatusCode::NOT_FOUND,
            Self::Monitor(MonitorError::Probe(_)) => StatusCode::BAD_GATEWAY,
            Self::Monitor(MonitorError::Publish(_) | MonitorError::Store(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(json!({ "error": message }))
    }
}
