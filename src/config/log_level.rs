//! Log verbosity derived from the deployment environment.

use tracing::Level;

use super::env_source::{APP_DEBUG, APP_ENV, EnvSource};
use super::environment::Environment;

/// Severity rank; higher is more verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Error = 2,
    Warning = 3,
    Info = 4,
    Debug = 5,
}

impl LogLevel {
    pub fn rank(self) -> i8 {
        self as i8
    }

    /// Fixed mapping from environment to level, without the debug override.
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => LogLevel::Debug,
            Environment::Staging => LogLevel::Info,
            Environment::Uat => LogLevel::Warning,
            Environment::Production => LogLevel::Error,
        }
    }

    /// Level for `env`, forced to debug when `APP_DEBUG` parses as true.
    pub fn resolve(env: Environment, source: &dyn EnvSource) -> Self {
        let forced = source
            .var(APP_DEBUG)
            .and_then(|raw| parse_bool(&raw))
            .unwrap_or(false);

        if forced {
            LogLevel::Debug
        } else {
            Self::for_environment(env)
        }
    }

    /// Level implied by the current variables, leaving `APP_ENV` untouched.
    ///
    /// Lets a binary configure logging before bootstrap runs.
    pub fn from_env(source: &dyn EnvSource) -> Self {
        let env = Environment::from_raw(source.var(APP_ENV).as_deref());
        Self::resolve(env, source)
    }

    pub fn from_rank(rank: i64) -> Option<Self> {
        match rank {
            2 => Some(LogLevel::Error),
            3 => Some(LogLevel::Warning),
            4 => Some(LogLevel::Info),
            5 => Some(LogLevel::Debug),
            _ => None,
        }
    }

    pub fn as_tracing_level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warning => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
        }
    }
}

/// Parses the boolean spellings accepted for flag variables.
///
/// Returns None for anything else, which callers treat as false.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
