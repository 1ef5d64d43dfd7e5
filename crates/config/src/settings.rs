//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConversationConfig};

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Query service endpoint configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Hands-free conversation loop configuration
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// Where the query service lives and how long we wait for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service origin, e.g. `http://localhost:8000`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path prefix for all operations
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Timeout for query and synthesis requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for document uploads (ingestion is slow)
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_upload_timeout_secs() -> u64 {
    120
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            request_timeout_secs: default_request_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Env-filter directive, e.g. `info` or `docchat=debug`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable ones
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Settings {
    /// Validate the loaded configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.service.base_url.starts_with("http://")
            && !self.service.base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "service.base_url".to_string(),
                message: "must be an http(s) origin".to_string(),
            });
        }

        if self.conversation.countdown_secs > 30 {
            return Err(ConfigError::InvalidValue {
                field: "conversation.countdown_secs".to_string(),
                message: "countdown longer than 30s is not useful".to_string(),
            });
        }

        if self.conversation.capture_window_ms < 1000 {
            return Err(ConfigError::InvalidValue {
                field: "conversation.capture_window_ms".to_string(),
                message: "capture window below 1s cannot hold an utterance".to_string(),
            });
        }

        if let Some(ref token) = self.conversation.wake_word {
            if token.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "conversation.wake_word".to_string(),
                    message: "wake word must not be blank".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Load settings from files and environment.
///
/// Priority: env vars > `config/{env}.yaml` > `config/default.yaml` > defaults.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("DOCCHAT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
