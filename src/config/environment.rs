//! Deployment environment resolution.

use std::fmt;

use tracing::{debug, warn};

use super::env_source::{APP_ENV, EnvSource};

/// Deployment stage the service runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    Development,
    Staging,
    Uat,
    #[default]
    Production,
}

impl Environment {
    /// All recognized environments.
    pub const ALL: [Environment; 4] = [
        Environment::Development,
        Environment::Staging,
        Environment::Uat,
        Environment::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Uat => "uat",
            Environment::Production => "production",
        }
    }

    /// Maps a raw variable value onto an environment.
    ///
    /// Only exact, case-sensitive names are recognized. Anything else,
    /// including a missing or empty value, is production.
    pub fn from_raw(raw: Option<&str>) -> Self {
        raw.and_then(|value| Self::ALL.into_iter().find(|e| e.as_str() == value))
            .unwrap_or_default()
    }

    pub fn is_development(&self) -> bool {
        *self == Environment::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads `APP_ENV`, normalizes it and writes the normalized name back.
///
/// Later readers of `APP_ENV` always see one of the four recognized names.
pub fn resolve_environment(source: &dyn EnvSource) -> Environment {
    let raw = source.var(APP_ENV);
    let env = Environment::from_raw(raw.as_deref());

    match raw.as_deref() {
        Some(value) if !value.is_empty() && value != env.as_str() => {
            warn!(raw = %value, env = %env, "unrecognized environment, falling back");
        }
        _ => debug!(env = %env, "environment resolved"),
    }

    source.set_var(APP_ENV, env.as_str());
    env
}
