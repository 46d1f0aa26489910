//! Configuration error types.

use thiserror::Error;

use super::remote::BackendError;

/// Configuration bootstrap error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("service name must not be empty")]
    EmptyServiceName,
    #[error("failed retrieving config from {file}: {source}")]
    LocalLoad {
        file: String,
        #[source]
        source: SourceError,
    },
    #[error("failed retrieving config from {endpoint} with path {path}: {source}")]
    RemoteLoad {
        endpoint: String,
        path: String,
        #[source]
        source: SourceError,
    },
    #[error("no valid configuration available for {0} service")]
    NoConfiguration(String),
    #[error("invalid value for {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("settings are already installed")]
    AlreadyInstalled,
}

/// Underlying cause of a failed local or remote load.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("file not found in {0}")]
    NotFound(String),
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("document root must be a key-value object")]
    NotAnObject,
}
