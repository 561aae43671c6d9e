//! Application settings: loaded from `config/default.{toml,yaml}`, an
//! optional environment-specific overlay, and `VOICEHIVE__`-prefixed
//! environment variables, in that order of increasing precedence.
//!
//! A handful of settings are collaborator webhook secrets that external
//! systems (LiveKit, Apaleo) mint independently of this service's own
//! naming convention; those are read as raw, unprefixed env vars instead
//! of going through the `config` crate's source chain.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
            timeout_seconds: default_timeout_seconds(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_connections() -> usize {
    1000
}
fn default_timeout_seconds() -> u64 {
    30
}

/// Webhook authentication: a bearer token for LiveKit room webhooks and an
/// HMAC-SHA-256 signing secret plus an IP allowlist for Apaleo PMS webhooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub livekit_webhook_key: Option<String>,
    #[serde(default)]
    pub apaleo_webhook_secret: Option<String>,
    #[serde(default = "default_apaleo_ip_allowlist")]
    pub apaleo_ip_allowlist: Vec<String>,
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
    /// Shared secret verifying the `call:start` JWT minted by an upstream
    /// identity service; this service verifies, it never issues.
    #[serde(default)]
    pub call_start_jwt_secret: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            livekit_webhook_key: None,
            apaleo_webhook_secret: None,
            apaleo_ip_allowlist: default_apaleo_ip_allowlist(),
            public_paths: default_public_paths(),
            call_start_jwt_secret: None,
        }
    }
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string()]
}

fn default_apaleo_ip_allowlist() -> Vec<String> {
    Vec::new()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_events_per_second")]
    pub events_per_second: u32,
    #[serde(default = "default_burst_multiplier")]
    pub burst_multiplier: f32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            events_per_second: default_events_per_second(),
            burst_multiplier: default_burst_multiplier(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_events_per_second() -> u32 {
    50
}
fn default_burst_multiplier() -> f32 {
    2.0
}

/// Connection settings for the ASR, TTS and LLM collaborators (§1, §4.5-4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    #[serde(default = "default_asr_url")]
    pub asr_url: String,
    #[serde(default = "default_tts_router_url")]
    pub tts_router_url: String,
    #[serde(default = "default_llm_url")]
    pub llm_url: String,
    #[serde(default)]
    pub llm_api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_pms_base_url")]
    pub pms_base_url: String,
    #[serde(default = "default_request_pool_size")]
    pub request_pool_size: usize,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            asr_url: default_asr_url(),
            tts_router_url: default_tts_router_url(),
            llm_url: default_llm_url(),
            llm_api_key: None,
            llm_model: default_llm_model(),
            pms_base_url: default_pms_base_url(),
            request_pool_size: default_request_pool_size(),
        }
    }
}

fn default_asr_url() -> String {
    "http://localhost:9001".to_string()
}
fn default_tts_router_url() -> String {
    "http://localhost:9002".to_string()
}
fn default_llm_url() -> String {
    "http://localhost:9003/v1/chat/completions".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_pms_base_url() -> String {
    "http://localhost:9004".to_string()
}
fn default_request_pool_size() -> usize {
    32
}

/// Redis-backed session persistence (§4.7-4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            session_ttl_seconds: default_session_ttl_seconds(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}
fn default_session_ttl_seconds() -> u64 {
    crate::constants::session::DEFAULT_TTL_SECONDS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application settings, deserialized via [`load_settings`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub collaborators: CollaboratorConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_persistence()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "port cannot be 0".to_string(),
            });
        }
        if self.server.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_connections".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.server.rate_limit.enabled && self.server.rate_limit.events_per_second == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.rate_limit.events_per_second".to_string(),
                message: "must be at least 1 while rate limiting is enabled".to_string(),
            });
        }
        if self.server.rate_limit.burst_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "server.rate_limit.burst_multiplier".to_string(),
                message: "must be at least 1.0".to_string(),
            });
        }
        if self.environment.is_production() && self.server.auth.enabled {
            if self.server.auth.livekit_webhook_key.is_none() {
                tracing::warn!("server.auth.livekit_webhook_key missing in production");
                return Err(ConfigError::MissingField("server.auth.livekit_webhook_key".to_string()));
            }
            if self.server.auth.apaleo_webhook_secret.is_none() {
                tracing::warn!("server.auth.apaleo_webhook_secret missing in production");
                return Err(ConfigError::MissingField("server.auth.apaleo_webhook_secret".to_string()));
            }
            if self.server.auth.call_start_jwt_secret.is_none() {
                tracing::warn!("server.auth.call_start_jwt_secret missing in production");
                return Err(ConfigError::MissingField("server.auth.call_start_jwt_secret".to_string()));
            }
        }
        Ok(())
    }

    fn validate_persistence(&self) -> Result<(), ConfigError> {
        if self.persistence.session_ttl_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "persistence.session_ttl_seconds".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads settings from `config/default`, an optional `config/{env}` overlay,
/// then `VOICEHIVE__`-prefixed environment variables (highest precedence).
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{env_name}")).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("VOICEHIVE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let mut settings: Settings = config.try_deserialize()?;
    apply_raw_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Overlays the raw, unprefixed env vars collaborator systems mint
/// independently of this service's `VOICEHIVE__` naming convention (§6's
/// configuration table). Applied after the `config` crate's source chain so
/// these always win, matching how the original orchestrator reads them.
fn apply_raw_env_overrides(settings: &mut Settings) {
    use std::env::var;

    if let Ok(v) = var("TTS_ROUTER_URL") {
        settings.collaborators.tts_router_url = v;
    }
    if let Ok(v) = var("ASR_URL") {
        settings.collaborators.asr_url = v;
    }
    if let Ok(v) = var("LLM_URL") {
        settings.collaborators.llm_url = v;
    } else if let (Ok(endpoint), Ok(deployment)) = (var("AZURE_OPENAI_ENDPOINT"), var("AZURE_OPENAI_DEPLOYMENT")) {
        settings.collaborators.llm_url = format!("{}/openai/deployments/{}/chat/completions", endpoint.trim_end_matches('/'), deployment);
    }
    if let Ok(v) = var("AZURE_OPENAI_KEY") {
        settings.collaborators.llm_api_key = Some(v);
    }
    if let Ok(v) = var("LIVEKIT_WEBHOOK_KEY") {
        settings.server.auth.livekit_webhook_key = Some(v);
    }
    if let Ok(v) = var("APALEO_WEBHOOK_SECRET") {
        settings.server.auth.apaleo_webhook_secret = Some(v);
    }
    if let Ok(v) = var("REGION") {
        tracing::debug!(region = %v, "region overridden from raw env var");
        settings.region = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        settings.validate().unwrap();
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate_server().is_err());
    }

    #[test]
    fn production_auth_requires_webhook_secrets() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.server.auth.enabled = true;
        assert!(settings.validate_server().is_err());

        settings.server.auth.livekit_webhook_key = Some("key".to_string());
        settings.server.auth.apaleo_webhook_secret = Some("secret".to_string());
        settings.server.auth.call_start_jwt_secret = Some("jwt-secret".to_string());
        assert!(settings.validate_server().is_ok());
    }

    #[test]
    fn rate_limit_burst_multiplier_below_one_is_rejected() {
        let mut settings = Settings::default();
        settings.server.rate_limit.burst_multiplier = 0.5;
        assert!(settings.validate_server().is_err());
    }
}
