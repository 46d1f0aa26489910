//! Local configuration document lookup.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use super::error::{ConfigError, SourceError};

/// Extensions tried in order after `{service}.config`.
const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Name of the primary local document for a service.
pub fn file_name(service: &str) -> String {
    format!("{}.config.json", service)
}

/// Loads `{service}.config.{json,yaml,yml}` from `dir`.
///
/// The first existing candidate wins and is parsed according to its
/// extension.
pub fn load(dir: &Path, service: &str) -> Result<Map<String, Value>, ConfigError> {
    let candidate = EXTENSIONS
        .iter()
        .map(|ext| (ext, format!("{}.config.{}", service, ext)))
        .find(|(_, name)| dir.join(name).is_file());

    let Some((ext, name)) = candidate else {
        return Err(ConfigError::LocalLoad {
            file: file_name(service),
            source: SourceError::NotFound(dir.display().to_string()),
        });
    };

    let path = dir.join(&name);
    debug!(file = %path.display(), "reading local config");

    parse(&path, ext).map_err(|source| ConfigError::LocalLoad { file: name, source })
}

fn parse(path: &Path, ext: &str) -> Result<Map<String, Value>, SourceError> {
    let content = fs::read_to_string(path)?;
    let value: Value = match ext {
        "json" => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SourceError::NotAnObject),
    }
}
