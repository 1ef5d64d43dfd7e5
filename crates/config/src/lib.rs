//! Configuration management for the document chat client
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default`, then `config/{env}`)
//! - Environment variables (`DOCCHAT_` prefix, `__` separator)
//! - Built-in defaults

pub mod conversation;
pub mod settings;

pub use conversation::{ConversationConfig, MIN_RETRY_BACKOFF_MS};
pub use settings::{load_settings, LogConfig, ServiceConfig, Settings};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        ConfigError::ParseError(e.to_string())
    }
}
