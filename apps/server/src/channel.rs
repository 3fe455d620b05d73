//! Tenant identity carried in the `x-channel` header.

use std::future::{Ready, ready};

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::http::header::HeaderMap;
use actix_web::middleware::Next;
use actix_web::{FromRequest, HttpRequest};
use tracing::debug;

use crate::error::ApiError;

pub const CHANNEL_HEADER: &str = "x-channel";

/// The calling tenant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel(String);

impl Channel {
    /// The header value as an opaque UTF-8 string; missing, empty or non-UTF-8
    /// values are no channel at all
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(CHANNEL_HEADER)
            .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for Channel {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req.headers()).ok_or(ApiError::MissingChannel))
    }
}

/// Job endpoints are called by the task publisher, not by tenants
fn is_system_path(path: &str) -> bool {
    path == "/jobs" || path.starts_with("/jobs/")
}

/// Reject tenant requests without a channel before any handler runs
pub async fn require_channel<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, actix_web::Error> {
    if is_system_path(req.path()) || Channel::from_headers(req.headers()).is_some() {
        return next.call(req).await.map(ServiceResponse::map_into_left_body);
    }

    debug!(path = req.path(), "Rejected request without channel");
    Ok(req.error_response(ApiError::MissingChannel).map_into_right_body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    #[test]
    fn test_channel_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(Channel::from_headers(&headers), None);

        headers.insert(CHANNEL_HEADER.parse().unwrap(), HeaderValue::from_static(""));
        assert_eq!(Channel::from_headers(&headers), None);

        headers.insert(CHANNEL_HEADER.parse().unwrap(), HeaderValue::from_static("t1"));
        assert_eq!(Channel::from_headers(&headers).unwrap().as_str(), "t1");

        headers.insert(CHANNEL_HEADER.parse().unwrap(), HeaderValue::from_bytes("café".as_bytes()).unwrap());
        assert_eq!(Channel::from_headers(&headers).unwrap().as_str(), "café");

        headers.insert(CHANNEL_HEADER.parse().unwrap(), HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());
        assert_eq!(Channel::from_headers(&headers), None);
    }

    #[test]
    fn test_system_paths() {
        assert!(is_system_path("/jobs/verify"));
        assert!(is_system_path("/jobs/verify/abc"));
        assert!(!is_system_path("/jobsx"));
        assert!(!is_system_path("/monitors"));
    }
}
