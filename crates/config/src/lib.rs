//! Configuration loading, validation, and management for RallyCoach.
//!
//! Loads configuration from `~/.rallycoach/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.rallycoach/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider used for chat completions
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Provider used for embeddings (defaults to the chat provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_provider: Option<String>,

    /// Chat completion model
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Embedding model; must match the model the index was built with
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Sampling temperature for completions
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Chat engine behaviour
    #[serde(default)]
    pub engine: EngineConfig,

    /// Passage index location
    #[serde(default)]
    pub index: IndexConfig,

    /// Document chunking for ingestion
    #[serde(default)]
    pub ingest: IngestConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "together".into()
}
fn default_chat_model() -> String {
    "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo".into()
}
fn default_embedding_model() -> String {
    "togethercomputer/m2-bert-80M-32k-retrieval".into()
}
fn default_temperature() -> f32 {
    0.7
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("embedding_provider", &self.embedding_provider)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("engine", &self.engine)
            .field("index", &self.index)
            .field("ingest", &self.ingest)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Chat engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Passages retrieved per turn
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// History entries kept per session after each turn (must be even)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Token budget for the first reply of a session
    #[serde(default = "default_first_turn_max_tokens")]
    pub first_turn_max_tokens: u32,

    /// Token budget for every later reply
    #[serde(default = "default_followup_max_tokens")]
    pub followup_max_tokens: u32,

    /// Replace the built-in coaching persona
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_override: Option<String>,
}

fn default_top_k() -> usize {
    5
}
fn default_history_limit() -> usize {
    20
}
fn default_first_turn_max_tokens() -> u32 {
    400
}
fn default_followup_max_tokens() -> u32 {
    300
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            history_limit: default_history_limit(),
            first_turn_max_tokens: default_first_turn_max_tokens(),
            followup_max_tokens: default_followup_max_tokens(),
            persona_override: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// JSONL file holding `{id, text, embedding}` passages
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
}

fn default_index_path() -> PathBuf {
    AppConfig::config_dir().join("index").join("passages.jsonl")
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters between chunk starts; smaller than `chunk_size` to overlap
    #[serde(default = "default_chunk_stride")]
    pub chunk_stride: usize,
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_stride() -> usize {
    900
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_stride: default_chunk_stride(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Allowed CORS origins. Empty = any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: vec![],
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.rallycoach/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Load configuration from `path`, then apply environment overrides.
    ///
    /// API key lookup order when the file has none:
    /// - `RALLYCOACH_API_KEY`
    /// - `TOGETHER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("RALLYCOACH_API_KEY")
                .ok()
                .or_else(|| std::env::var("TOGETHER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("RALLYCOACH_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("RALLYCOACH_CHAT_MODEL") {
            config.chat_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".rallycoach")
    }

    /// Default config file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Name of the provider used for embeddings.
    pub fn embedding_provider_name(&self) -> &str {
        self.embedding_provider
            .as_deref()
            .unwrap_or(&self.default_provider)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.engine.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "engine.top_k must be > 0".into(),
            ));
        }

        // An odd limit would split a user/assistant pair on eviction
        if self.engine.history_limit < 2 || self.engine.history_limit % 2 != 0 {
            return Err(ConfigError::ValidationError(
                "engine.history_limit must be an even number >= 2".into(),
            ));
        }

        if self.ingest.chunk_size == 0 || self.ingest.chunk_stride == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.chunk_size and ingest.chunk_stride must be > 0".into(),
            ));
        }

        if self.ingest.chunk_stride > self.ingest.chunk_size {
            return Err(ConfigError::ValidationError(
                "ingest.chunk_stride must not exceed ingest.chunk_size".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            embedding_provider: None,
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            engine: EngineConfig::default(),
            index: IndexConfig::default(),
            ingest: IngestConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
