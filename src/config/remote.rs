//! Remote configuration backends.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::env_source::{APP_REMOTE, DEFAULT_REMOTE, EnvSource};
use super::error::{ConfigError, SourceError};

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend errors.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport failure talking to the store.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Key does not exist in the store.
    #[error("key {0} not found")]
    NotFound(String),

    /// Store answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Store could not be reached, for backends without an HTTP transport.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// RemoteBackend fetches raw documents from a key-value store.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Address of the store, used in error messages.
    fn endpoint(&self) -> &str;

    /// Fetch returns the raw bytes stored at `path`.
    /// Returns NotFound when the key does not exist.
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, BackendError>;
}

/// Consul KV store over its HTTP API.
pub struct ConsulBackend {
    endpoint: String,
    base_url: String,
    http_client: HttpClient,
}

impl ConsulBackend {
    /// Creates a backend for `endpoint`, either `host:port` or a full URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, BackendError> {
        let endpoint = endpoint.into();
        let base_url = if endpoint.contains("://") {
            endpoint.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", endpoint.trim_end_matches('/'))
        };

        let http_client = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            endpoint,
            base_url,
            http_client,
        })
    }

    fn key_url(&self, path: &str) -> String {
        format!("{}/v1/kv/{}?raw", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl RemoteBackend for ConsulBackend {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        let url = self.key_url(path);
        debug!(url = %url, "fetching remote key");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).to_string(),
            });
        }

        Ok(body.to_vec())
    }
}

/// Remote store address from `APP_REMOTE`, or the default when unset or empty.
pub fn resolve_endpoint(source: &dyn EnvSource) -> String {
    source
        .var(APP_REMOTE)
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| DEFAULT_REMOTE.to_string())
}

/// Key under which a service's configuration document is stored.
pub fn remote_path(service: &str) -> String {
    format!("/service/{}/config.json", service)
}

/// Fetches and parses the service document from `backend`.
pub async fn load(
    backend: &dyn RemoteBackend,
    service: &str,
) -> Result<Map<String, Value>, ConfigError> {
    let path = remote_path(service);
    debug!(endpoint = %backend.endpoint(), path = %path, "reading remote config");

    fetch_document(backend, &path)
        .await
        .map_err(|source| ConfigError::RemoteLoad {
            endpoint: backend.endpoint().to_string(),
            path,
            source,
        })
}

async fn fetch_document(
    backend: &dyn RemoteBackend,
    path: &str,
) -> Result<Map<String, Value>, SourceError> {
    let body = backend.fetch(path).await?;
    let value: Value = serde_json::from_slice(&body)?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SourceError::NotAnObject),
    }
}
