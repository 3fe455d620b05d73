use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::Method;
use reqwest::header::HeaderMap;

use crate::error::{MonitorError, Result};
use crate::models::LogData;

/// What a probe observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status_code: u16,
    /// Milliseconds from request start until response headers were received
    pub response_time: u64,
    pub data: LogData,
}

/// Checker trait for probing a monitor target
///
/// Any received response is an outcome, whatever its status. An error means
/// no response was received at all.
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    async fn check(&self, method: &str, target: &str) -> Result<ProbeOutcome>;
}

/// Default cap on the captured response body
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// HTTP/HTTPS checker
pub struct HttpChecker {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpChecker {
    /// Every request made by this checker is bounded by `timeout`
    pub fn new(timeout: Duration, user_agent: &str) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).user_agent(user_agent).build()?;

        Ok(Self { client, max_body_bytes: MAX_BODY_BYTES })
    }

    /// Keep at most `max_body_bytes` of each response body
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Read the body chunk by chunk, dropping everything past the cap
    async fn read_body(&self, mut response: reqwest::Response) -> Result<String> {
        let mut body = Vec::new();

        while let Some(chunk) = response.chunk().await.map_err(probe_error)? {
            let remaining = self.max_body_bytes - body.len();
            if chunk.len() >= remaining {
                body.extend_from_slice(&chunk[..remaining]);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, method: &str, target: &str) -> Result<ProbeOutcome> {
        let method = Method::from_bytes(method.to_uppercase().as_bytes())
            .map_err(|_| MonitorError::Probe(format!("Unsupported HTTP method: {method}")))?;

        let start = Instant::now();
        let response = self.client.request(method, target).send().await.map_err(probe_error)?;
        let response_time = start.elapsed().as_millis() as u64;

        let status_code = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = self.read_body(response).await?;

        Ok(ProbeOutcome { status_code, response_time, data: LogData { body, headers } })
    }
}

fn probe_error(error: reqwest::Error) -> MonitorError {
    if error.is_timeout() {
        MonitorError::Probe("Request timed out".to_string())
    } else {
        MonitorError::Probe(format!("Network error: {error}"))
    }
}

/// Flatten response headers, joining repeated names with ", "
pub fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }

    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_collect_headers_joins_repeated_names() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));

        let collected = collect_headers(&headers);

        assert_eq!(collected["set-cookie"], "a=1, b=2");
        assert_eq!(collected["content-type"], "text/plain");
        assert_eq!(collected.keys().collect::<Vec<_>>(), vec!["content-type", "set-cookie"]);
    }

    #[tokio::test]
    async fn test_large_body_is_truncated() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let body = "a".repeat(100_000);
            let reply = format!("HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}", body.len());
            let _ = socket.write_all(reply.as_bytes()).await;
        });

        let checker = HttpChecker::new(Duration::from_secs(5), "uppe-test").unwrap().with_max_body_bytes(16);
        let outcome = checker.check("GET", &format!("http://{addr}/")).await.unwrap();

        assert_eq!(outcome.status_code, 200);
        assert_eq!(outcome.data.body, "a".repeat(16));
    }

    #[tokio::test]
    async fn test_invalid_method_is_probe_failure() {
        let checker = HttpChecker::new(Duration::from_secs(1), "uppe-test").unwrap();
        let result = checker.check("NOT A METHOD", "http://127.0.0.1:9").await;

        assert!(matches!(result, Err(MonitorError::Probe(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_probe_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let checker = HttpChecker::new(Duration::from_secs(2), "uppe-test").unwrap();
        let result = checker.check("get", &format!("http://{addr}/")).await;

        assert!(matches!(result, Err(MonitorError::Probe(_))));
    }
}
