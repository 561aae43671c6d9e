//! Configuration for the voice call orchestrator.
//!
//! Settings load from `config/default.{toml,yaml}`, an optional
//! environment-specific overlay, and `VOICEHIVE__`-prefixed environment
//! variables (highest precedence). See [`settings::load_settings`].

pub mod constants;
pub mod settings;

pub use settings::{
    AuthConfig, CollaboratorConfig, ObservabilityConfig, PersistenceConfig, RateLimitConfig,
    RuntimeEnvironment, ServerConfig, Settings, load_settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
