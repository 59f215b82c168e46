//! Configuration
//!
//! [`Config`] is what [`evaluate`](crate::evaluate::evaluate) consumes: an
//! optional HTTP client and an optional User-Agent. [`ClientSettings`] is the
//! serializable form loaded from JSON files, used to build a [`Config`] with a
//! dedicated `reqwest` client.

use crate::http::{default_client, HttpClient, ReqwestHttpClient};
use crate::transport::QUERY_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the default `reqwest`-backed HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// User-Agent sent with queries; none when absent or empty
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Resend a query once after a connection failure
    #[serde(default = "default_retry_idempotent")]
    pub retry_idempotent: bool,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Idle pooled connections kept per responder host
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
}

fn default_retry_idempotent() -> bool {
    true
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_pool_max_idle_per_host() -> usize {
    8
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            user_agent: None,
            retry_idempotent: default_retry_idempotent(),
            connect_timeout_secs: default_connect_timeout_secs(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
        }
    }
}

impl ClientSettings {
    /// Load settings from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let settings: ClientSettings = serde_json::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs cannot be 0".to_string(),
            ));
        }
        if self.connect_timeout_secs > QUERY_TIMEOUT.as_secs() {
            return Err(ConfigError::Invalid(format!(
                "connect_timeout_secs cannot exceed the {}s query timeout",
                QUERY_TIMEOUT.as_secs()
            )));
        }
        Ok(())
    }
}

/// Configuration for evaluations. The default uses the shared HTTP client
/// and sends no User-Agent.
#[derive(Clone, Default)]
pub struct Config {
    pub http_client: Option<Arc<dyn HttpClient>>,
    pub user_agent: Option<String>,
}

impl Config {
    /// Build a configuration with a dedicated client built from `settings`.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let client = ReqwestHttpClient::from_settings(settings)?;
        Ok(Self {
            http_client: Some(Arc::new(client)),
            user_agent: settings.user_agent.clone(),
        })
    }

    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn http_client(&self) -> Arc<dyn HttpClient> {
        self.http_client.clone().unwrap_or_else(default_client)
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref().filter(|ua| !ua.is_empty())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("http_client", &self.http_client.as_ref().map(|_| "custom"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
