//! HTTP client seam and its `reqwest` implementation

use crate::config::ClientSettings;
use crate::error::BoxError;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::debug;

/// An outgoing POST request.
#[derive(Debug, Clone)]
pub struct HttpPost {
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// The request may be sent again after a failure even though it is a POST.
    ///
    /// OCSP request bodies are deterministic and answering them has no side
    /// effects on the responder, so resending is safe.
    pub retry_safe: bool,
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Sends OCSP requests. Shared between concurrent checks.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn post(&self, request: HttpPost) -> Result<HttpReply, BoxError>;
}

/// [`HttpClient`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    retry_idempotent: bool,
}

impl ReqwestHttpClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            retry_idempotent: true,
        }
    }

    /// Whether failed requests marked [`HttpPost::retry_safe`] are sent a second time.
    pub fn with_retry(mut self, retry_idempotent: bool) -> Self {
        self.retry_idempotent = retry_idempotent;
        self
    }

    /// Build a client from settings.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .build()?;
        Ok(Self {
            client,
            retry_idempotent: settings.retry_idempotent,
        })
    }

    async fn send_once(&self, request: &HttpPost) -> Result<HttpReply, reqwest::Error> {
        let response = self
            .client
            .post(request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(HttpReply {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post(&self, request: HttpPost) -> Result<HttpReply, BoxError> {
        let retry = request.retry_safe && self.retry_idempotent;
        match self.send_once(&request).await {
            Ok(reply) => Ok(reply),
            Err(err) if retry && (err.is_connect() || err.is_request()) => {
                debug!(url = %request.url, error = %err, "retrying OCSP request");
                Ok(self.send_once(&request).await?)
            }
            Err(err) => Err(err.into()),
        }
    }
}

static DEFAULT_CLIENT: OnceLock<Arc<dyn HttpClient>> = OnceLock::new();

/// Process-wide client used when no client is configured.
pub fn default_client() -> Arc<dyn HttpClient> {
    DEFAULT_CLIENT
        .get_or_init(|| {
            let client = ReqwestHttpClient::from_settings(&ClientSettings::default())
                .unwrap_or_else(|_| ReqwestHttpClient::new(reqwest::Client::new()));
            Arc::new(client)
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_client_is_shared() {
        let a = default_client();
        let b = default_client();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_from_settings_keeps_retry_flag() {
        let settings = ClientSettings {
            retry_idempotent: false,
            ..ClientSettings::default()
        };
        let client = ReqwestHttpClient::from_settings(&settings).expect("client");
        assert!(!client.retry_idempotent);
    }

    #[test]
    fn test_with_retry() {
        let client = ReqwestHttpClient::new(reqwest::Client::new());
        assert!(client.retry_idempotent);
        assert!(!client.with_retry(false).retry_idempotent);
    }
}
