//! Access to the process environment variables the bootstrap reads and writes.

use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};

/// Deployment environment name, normalized in place by the resolver.
pub const APP_ENV: &str = "APP_ENV";
/// Remote store address as `host:port` or a full URL.
pub const APP_REMOTE: &str = "APP_REMOTE";
/// Boolean flag forcing debug verbosity.
pub const APP_DEBUG: &str = "APP_DEBUG";
/// Remote store address used when `APP_REMOTE` is unset or empty.
pub const DEFAULT_REMOTE: &str = "consul:8500";

/// EnvSource is the read/write view of environment variables used during bootstrap.
pub trait EnvSource: Send + Sync {
    /// Returns the value of `key`, or None when unset or not valid unicode.
    fn var(&self, key: &str) -> Option<String>;

    /// Sets `key` to `value` for every later reader of this source.
    fn set_var(&self, key: &str, value: &str);
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }

    fn set_var(&self, key: &str, value: &str) {
        // SAFETY: callers write only while the process is single-threaded.
        // The binary bootstraps on a current-thread runtime, before any
        // blocking task or worker thread exists.
        unsafe {
            env::set_var(key, value);
        }
    }
}

/// In-memory environment, isolated from the process.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value): (String, String) = (key.into(), value.into());
        self.set_var(&key, &value);
        self
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        let vars = self.vars.lock().unwrap_or_else(|e| e.into_inner());
        vars.get(key).cloned()
    }

    fn set_var(&self, key: &str, value: &str) {
        let mut vars = self.vars.lock().unwrap_or_else(|e| e.into_inner());
        vars.insert(key.to_string(), value.to_string());
    }
}

impl<T: EnvSource + ?Sized> EnvSource for Arc<T> {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }

    fn set_var(&self, key: &str, value: &str) {
        (**self).set_var(key, value)
    }
}
