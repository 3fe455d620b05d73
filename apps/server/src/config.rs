use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fmt, fs, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    #[error("Failed to write {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    #[error("Failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),

    #[error("Neither XDG_CONFIG_HOME nor HOME is set")]
    ConfigPathUnavailable,

    #[error("Invalid value {value:?} for {name}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub jobs: JobsConfig,
    pub probe: ProbeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Public base URL the job service uses to reach `/jobs/verify/{id}`
    pub api_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Libsql,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
    pub max_connections: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublisherKind {
    /// Invoke task targets in-process
    Local,
    /// Hand tasks to an external job service
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub publisher: PublisherKind,
    pub topic: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Maximum publishes in flight during one fan-out
    pub concurrency: usize,
    /// How long the job service may take to accept one task
    pub publish_timeout_seconds: u64,
    /// Run fan-out in-process every N seconds, 0 disables
    pub interval_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 3000, api_url: "http://localhost:3000".into() }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { backend: StoreBackend::Libsql, path: PathBuf::from("uppe.db"), max_connections: 8 }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            publisher: PublisherKind::Local,
            topic: uppe_core::jobs::VERIFY_TOPIC.into(),
            endpoint: None,
            api_key: None,
            concurrency: 16,
            publish_timeout_seconds: 10,
            interval_seconds: 0,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30, user_agent: concat!("uppe/", env!("CARGO_PKG_VERSION")).into() }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &Path) -> PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().is_none_or(|ext| ext != "toml") {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/uppe/server.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("uppe/server.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_1 = |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
            writeln!(f, "    {label}: {value}")
        };
        let optional = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".into());
        let secret = |value: &Option<String>| if value.is_some() { "********" } else { "-" };

        writeln!(f, "Current Configuration State:")?;
        writeln!(f, "  Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;
        write_1(f, "API URL", &self.server.api_url)?;
        writeln!(f, "  Store")?;
        write_1(f, "Backend", &format!("{:?}", self.store.backend))?;
        write_1(f, "Path", &self.store.path.display())?;
        write_1(f, "Max Connections", &self.store.max_connections)?;
        writeln!(f, "  Jobs")?;
        write_1(f, "Publisher", &format!("{:?}", self.jobs.publisher))?;
        write_1(f, "Topic", &self.jobs.topic)?;
        write_1(f, "Endpoint", &optional(&self.jobs.endpoint))?;
        write_1(f, "API Key", &secret(&self.jobs.api_key))?;
        write_1(f, "Concurrency", &self.jobs.concurrency)?;
        write_1(f, "Publish Timeout (s)", &self.jobs.publish_timeout_seconds)?;
        write_1(f, "Interval (s)", &self.jobs.interval_seconds)?;
        writeln!(f, "  Probe")?;
        write_1(f, "Timeout (s)", &self.probe.timeout_seconds)?;
        write_1(f, "User Agent", &self.probe.user_agent)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/uppe/server.toml
    ///  or the specified path if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<Path>>) -> Result<Self, ConfigError> {
        let config_path: PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;
            Ok(toml::from_str(&raw_string)?)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            tracing::info!(path = %config_path.display(), "Wrote default config");
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &Path) -> Result<(), ConfigError> {
        let config_str = toml::to_string_pretty(self)?;
        let write_failed = |source| ConfigError::WriteFailed { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }

        fs::write(path, config_str).map_err(write_failed)
    }

    /// Override file values with environment variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(port) = lookup("PORT") {
            self.server.port =
                port.parse().map_err(|_| ConfigError::InvalidEnv { name: "PORT", value: port })?;
        }
        if let Some(bind) = lookup("UPPE_BIND") {
            self.server.bind = bind;
        }
        if let Some(api_url) = lookup("API_URL") {
            self.server.api_url = api_url;
        }
        if let Some(path) = lookup("UPPE_DATABASE") {
            self.store.path = PathBuf::from(path);
        }
        if let Some(endpoint) = lookup("UPPE_JOBS_ENDPOINT") {
            self.jobs.endpoint = Some(endpoint);
        }
        if let Some(api_key) = lookup("UPPE_JOBS_API_KEY") {
            self.jobs.api_key = Some(api_key);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        const MIN_TIMEOUT: u64 = 1;
        const MAX_TIMEOUT: u64 = 300; // 5 minutes

        self.api_url()?;

        if !(MIN_TIMEOUT..=MAX_TIMEOUT).contains(&self.probe.timeout_seconds) {
            return Err(ConfigError::Invalid(format!(
                "probe.timeout_seconds must be between {MIN_TIMEOUT} and {MAX_TIMEOUT}, got {}",
                self.probe.timeout_seconds
            )));
        }

        if !(MIN_TIMEOUT..=MAX_TIMEOUT).contains(&self.jobs.publish_timeout_seconds) {
            return Err(ConfigError::Invalid(format!(
                "jobs.publish_timeout_seconds must be between {MIN_TIMEOUT} and {MAX_TIMEOUT}, got {}",
                self.jobs.publish_timeout_seconds
            )));
        }

        if self.jobs.publisher == PublisherKind::Http {
            self.jobs_endpoint()?;
        }

        Ok(())
    }

    pub fn api_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.server.api_url)
            .map_err(|e| ConfigError::Invalid(format!("server.api_url {:?}: {e}", self.server.api_url)))?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::Invalid(format!("server.api_url {url} cannot be a base URL")));
        }
        Ok(url)
    }

    pub fn jobs_endpoint(&self) -> Result<Url, ConfigError> {
        let endpoint = self.jobs.endpoint.as_deref().ok_or_else(|| {
            ConfigError::Invalid("jobs.endpoint is required for the http publisher".into())
        })?;
        Url::parse(endpoint).map_err(|e| ConfigError::Invalid(format!("jobs.endpoint {endpoint:?}: {e}")))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.timeout_seconds)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.jobs.publish_timeout_seconds)
    }

    /// Period of the in-process fan-out loop, if enabled
    pub fn fan_out_interval(&self) -> Option<Duration> {
        (self.jobs.interval_seconds > 0).then(|| Duration::from_secs(self.jobs.interval_seconds))
    }
}
