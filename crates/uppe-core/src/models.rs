use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monitor model - an HTTP target registered by a tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    pub id: String,
    pub name: String,
    pub url: String,
    pub method: String,
    /// Tenant (channel) that created the monitor, never changes
    pub owner: String,
}

/// Body of a monitor creation request, every field is required
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMonitor {
    pub name: Option<String>,
    pub url: Option<String>,
    pub method: Option<String>,
}

/// Partial monitor update
///
/// A field that is `Some` overwrites the stored value, even when it holds an
/// empty string. `None` (absent or `null` in JSON) keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub method: Option<String>,
}

impl Monitor {
    pub(crate) fn apply(mut self, patch: MonitorPatch) -> Self {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(url) = patch.url {
            self.url = url;
        }
        if let Some(method) = patch.method {
            self.method = method;
        }
        self
    }
}

/// Captured response of a probe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogData {
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

/// MonitorLog model - one immutable probe outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorLog {
    pub id: String,
    pub monitor_id: String,
    pub status_code: u16,
    /// Milliseconds until response headers were received
    pub response_time: u64,
    pub owner: String,
    pub data: LogData,
    /// RFC 3339 UTC timestamp
    pub created_at: String,
}

impl MonitorLog {
    pub fn new(
        owner: String,
        monitor_id: String,
        status_code: u16,
        response_time: u64,
        data: LogData,
    ) -> Self {
        Self {
            id: new_id(),
            monitor_id,
            status_code,
            response_time,
            owner,
            data,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Body of a direct log append, every field is required
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLog {
    pub status_code: Option<u16>,
    pub response_time: Option<u64>,
    pub data: Option<LogData>,
}

/// Time-ordered unique identifier for new records
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> Monitor {
        Monitor {
            id: "m1".into(),
            name: "ping".into(),
            url: "http://x".into(),
            method: "GET".into(),
            owner: "t1".into(),
        }
    }

    #[test]
    fn test_patch_distinguishes_empty_from_absent() {
        let patched = monitor().apply(MonitorPatch { name: Some(String::new()), ..Default::default() });

        assert_eq!(patched.name, "");
        assert_eq!(patched.url, "http://x");
        assert_eq!(patched.method, "GET");
        assert_eq!(patched.owner, "t1");
    }

    #[test]
    fn test_patch_null_keeps_value() {
        let patch: MonitorPatch = serde_json::from_str(r#"{"url": null, "method": "HEAD"}"#).unwrap();
        let patched = monitor().apply(patch);

        assert_eq!(patched.url, "http://x");
        assert_eq!(patched.method, "HEAD");
    }

    #[test]
    fn test_log_serializes_camel_case() {
        let log = MonitorLog::new("t1".into(), "m1".into(), 503, 12, LogData::default());
        let json = serde_json::to_value(&log).unwrap();

        assert_eq!(json["monitorId"], "m1");
        assert_eq!(json["statusCode"], 503);
        assert_eq!(json["responseTime"], 12);
        assert!(json["createdAt"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let first = new_id();
        let second = new_id();
        assert!(first < second);
    }
}
