//! Runtime configuration bootstrap for a named service.
//!
//! Resolves the deployment environment from `APP_ENV`, derives a log level,
//! then loads `{service}.config.json` from the working directory and
//! `/service/{service}/config.json` from a remote key-value store. Remote
//! values overlay local ones. Outside development a broken remote source is
//! fatal even when the local document loaded.

mod env_source;
mod environment;
mod error;
mod local;
mod log_level;
mod remote;
mod settings;

pub use env_source::{
    APP_DEBUG, APP_ENV, APP_REMOTE, DEFAULT_REMOTE, EnvSource, MapEnv, ProcessEnv,
};
pub use environment::{Environment, resolve_environment};
pub use error::{ConfigError, SourceError};
pub use log_level::LogLevel;
pub use remote::{BackendError, ConsulBackend, RemoteBackend, remote_path, resolve_endpoint};
pub use settings::{LOG_LEVEL_KEY, Settings, settings};

use std::path::PathBuf;

use tracing::{debug, info, warn};

/// Bootstraps `service` against the process environment, the current
/// directory and the Consul store named by `APP_REMOTE`.
pub async fn bootstrap(service: &str) -> Result<Settings, ConfigError> {
    Bootstrapper::new().run(service).await
}

/// Configurable bootstrap.
///
/// Defaults match [`bootstrap`]; each collaborator can be swapped.
pub struct Bootstrapper {
    env: Box<dyn EnvSource>,
    search_dir: PathBuf,
    backend: Option<Box<dyn RemoteBackend>>,
}

impl Default for Bootstrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Bootstrapper {
    pub fn new() -> Self {
        Self {
            env: Box::new(ProcessEnv),
            search_dir: PathBuf::from("."),
            backend: None,
        }
    }

    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Directory searched for the local document.
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = dir.into();
        self
    }

    /// Replaces the Consul backend otherwise built from `APP_REMOTE`.
    pub fn with_backend(mut self, backend: impl RemoteBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    /// Runs environment resolution and both loads, then applies the
    /// combination policy.
    pub async fn run(&self, service: &str) -> Result<Settings, ConfigError> {
        if service.is_empty() {
            return Err(ConfigError::EmptyServiceName);
        }

        let env = resolve_environment(self.env.as_ref());
        let mut settings = Settings::new(env);
        settings.set_log_level(LogLevel::resolve(env, self.env.as_ref()));

        let local = local::load(&self.search_dir, service);
        let remote = self.load_remote(service).await;

        let err_local = match local {
            Ok(document) => {
                settings.merge(document);
                None
            }
            Err(e) => {
                debug!(service = %service, error = %e, "local config unavailable");
                Some(e)
            }
        };

        let err_remote = match remote {
            Ok(document) => {
                settings.merge(document);
                None
            }
            Err(e) => {
                warn!(service = %service, error = %e, "remote config unavailable");
                Some(e)
            }
        };

        combine(env, service, err_local, err_remote)?;

        info!(
            service = %service,
            env = %env,
            log_level = settings.log_level().map(LogLevel::rank),
            "configuration loaded"
        );

        Ok(settings)
    }

    async fn load_remote(
        &self,
        service: &str,
    ) -> Result<serde_json::Map<String, serde_json::Value>, ConfigError> {
        if let Some(backend) = &self.backend {
            return remote::load(backend.as_ref(), service).await;
        }

        let endpoint = resolve_endpoint(self.env.as_ref());
        match ConsulBackend::new(endpoint.clone()) {
            Ok(backend) => remote::load(&backend, service).await,
            Err(e) => Err(ConfigError::RemoteLoad {
                endpoint,
                path: remote_path(service),
                source: SourceError::Backend(e),
            }),
        }
    }
}

/// Decides the bootstrap outcome from the two load results.
///
/// Both failing is always fatal. A remote failure alone is fatal everywhere
/// except development.
pub fn combine(
    env: Environment,
    service: &str,
    err_local: Option<ConfigError>,
    err_remote: Option<ConfigError>,
) -> Result<(), ConfigError> {
    match (err_local, err_remote) {
        (Some(_), Some(_)) => Err(ConfigError::NoConfiguration(service.to_string())),
        (_, Some(remote)) if !env.is_development() => Err(remote),
        _ => Ok(()),
    }
}
