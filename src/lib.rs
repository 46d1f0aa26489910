//! Runtime configuration bootstrap for named services.

pub mod config;

pub use config::{Bootstrapper, ConfigError, Environment, LogLevel, Settings, bootstrap};
