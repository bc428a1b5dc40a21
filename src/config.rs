use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub voice: VoiceConfig,
    pub ai: AiConfig,
    #[serde(default)]
    pub session: crate::session::SessionConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Voice-call provider settings
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// Provider REST API base URL
    pub api_url: String,
    pub api_key: String,
    /// Interviewer agent configured at the provider
    pub agent_id: String,
    /// NATS server relaying provider call events
    pub nats_url: String,
}

/// Text-generation service settings (code analysis and narrative reports)
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ai_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthConfig {
    /// Bearer token → owner id
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegistryConfig {
    /// JSON snapshot file; sessions live in memory only when unset
    pub snapshot_path: Option<String>,
}

impl Config {
    /// Load from `path` (any format the `config` crate understands) with
    /// `LOQA__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("LOQA").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        let config: Self = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.session.validate()?;
        Ok(config)
    }
}
