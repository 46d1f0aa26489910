//! Resolved key-value settings for the running service.

use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::environment::Environment;
use super::error::ConfigError;
use super::log_level::LogLevel;

/// Key under which the derived log level is published.
pub const LOG_LEVEL_KEY: &str = "log_level";

static INSTALLED: OnceLock<Settings> = OnceLock::new();

/// Settings produced by bootstrap.
///
/// Values live in two layers. Explicit overrides (such as `log_level`) are
/// consulted first, then the documents merged from the local and remote
/// sources. Keys may be dotted paths into nested objects (`database.host`).
#[derive(Debug, Clone, Default)]
pub struct Settings {
    environment: Environment,
    log_level: Option<LogLevel>,
    overrides: Map<String, Value>,
    loaded: Map<String, Value>,
}

impl Settings {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            ..Self::default()
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Log level published during bootstrap, if any.
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level.or_else(|| {
            self.get_i64(LOG_LEVEL_KEY)
                .and_then(LogLevel::from_rank)
        })
    }

    pub(crate) fn set_log_level(&mut self, level: LogLevel) {
        self.log_level = Some(level);
        self.set(LOG_LEVEL_KEY, level.rank());
    }

    /// Sets an override that no merged document can displace.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        insert_path(&mut self.overrides, key, value.into());
    }

    /// Deep-merges a document into the loaded layer.
    ///
    /// Nested objects merge key by key; any other value replaces what was
    /// there.
    pub fn merge(&mut self, document: Map<String, Value>) {
        merge_objects(&mut self.loaded, document);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        lookup(&self.overrides, key).or_else(|| lookup(&self.loaded, key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Deserializes the value at `key` into a typed section.
    pub fn extract<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self.get(key).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|source| ConfigError::Decode {
            key: key.to_string(),
            source,
        })
    }

    /// Sorted top-level keys from both layers.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .overrides
            .keys()
            .chain(self.loaded.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Publishes these settings for code that cannot be handed them directly.
    ///
    /// Can succeed once per process; see [`settings`].
    pub fn install(self) -> Result<&'static Settings, ConfigError> {
        let mut slot = Some(self);
        let installed = INSTALLED.get_or_init(|| slot.take().unwrap_or_default());
        if slot.is_some() {
            return Err(ConfigError::AlreadyInstalled);
        }
        Ok(installed)
    }
}

/// Settings published by [`Settings::install`], if any.
pub fn settings() -> Option<&'static Settings> {
    INSTALLED.get()
}

fn lookup<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(value) = root.get(key) {
        return Some(value);
    }

    let mut parts = key.split('.');
    let mut current = root.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn insert_path(root: &mut Map<String, Value>, key: &str, value: Value) {
    let mut parts: Vec<&str> = key.split('.').collect();
    let last = parts.pop().unwrap_or(key);

    let mut current = root;
    for part in parts {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert(last.to_string(), value);
}

fn merge_objects(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_objects(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}
