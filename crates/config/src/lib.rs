//! Configuration loading, validation, and management for Prospector.
//!
//! Loads configuration from `~/.prospector/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.prospector/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Reasoning engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Orchestration loop settings
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Search / page retrieval collaborator settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Memory store settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Export sink settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Custom per-million-token pricing overrides (model name → pricing)
    #[serde(default)]
    pub pricing: HashMap<String, PricingOverrideConfig>,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("engine", &self.engine)
            .field("runner", &self.runner)
            .field("search", &self.search)
            .field("memory", &self.memory)
            .field("export", &self.export)
            .field("pricing", &self.pricing)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// API key for the reasoning engine (env: `ANTHROPIC_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom API base URL (proxies, testing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_temperature() -> f32 {
    0.3
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Hard bound on loop iterations per session
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Compress conversation history every N iterations
    #[serde(default = "default_compress_every")]
    pub compress_every: u32,

    /// Raw exchanges preserved verbatim across a compression
    #[serde(default = "default_keep_last_exchanges")]
    pub keep_last_exchanges: usize,

    /// Retries on engine rate limiting (other failures never retry)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Linear backoff step in seconds, capped at `retry_backoff_cap_secs`
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,

    #[serde(default = "default_retry_backoff_cap_secs")]
    pub retry_backoff_cap_secs: u64,

    /// Character cap applied to every tool result fed back to the engine
    #[serde(default = "default_tool_output_cap")]
    pub tool_output_cap: usize,

    /// Character cap on the conclusion stored in the session record
    #[serde(default = "default_conclusion_cap")]
    pub conclusion_cap: usize,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_compress_every() -> u32 {
    3
}
fn default_keep_last_exchanges() -> usize {
    2
}
fn default_max_retries() -> u32 {
    5
}
fn default_retry_backoff_secs() -> u64 {
    3
}
fn default_retry_backoff_cap_secs() -> u64 {
    30
}
fn default_tool_output_cap() -> usize {
    6000
}
fn default_conclusion_cap() -> usize {
    2000
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            compress_every: default_compress_every(),
            keep_last_exchanges: default_keep_last_exchanges(),
            max_retries: default_max_retries(),
            retry_backoff_secs: default_retry_backoff_secs(),
            retry_backoff_cap_secs: default_retry_backoff_cap_secs(),
            tool_output_cap: default_tool_output_cap(),
            conclusion_cap: default_conclusion_cap(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// SerpAPI key for precise search (env: `SERPAPI_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serpapi_key: Option<String>,

    /// Brave Search key for broad discovery (env: `BRAVE_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brave_key: Option<String>,

    /// Per-fetch timeout for page retrieval
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Character cap on verbatim page reads
    #[serde(default = "default_page_cap")]
    pub page_cap: usize,
}

fn default_page_timeout_secs() -> u64 {
    30
}
fn default_page_cap() -> usize {
    12000
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("serpapi_key", &redact(&self.serpapi_key))
            .field("brave_key", &redact(&self.brave_key))
            .field("page_timeout_secs", &self.page_timeout_secs)
            .field("page_cap", &self.page_cap)
            .finish()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            serpapi_key: None,
            brave_key: None,
            page_timeout_secs: default_page_timeout_secs(),
            page_cap: default_page_cap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Path to the memory document (env: `PROSPECTOR_MEMORY_PATH`).
    /// Defaults to `~/.prospector/memory.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Past sessions surfaced as context for a new task
    #[serde(default = "default_context_sessions")]
    pub context_sessions: usize,
}

fn default_context_sessions() -> usize {
    5
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            context_sessions: default_context_sessions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory for exported session reports.
    /// Defaults to `~/.prospector/reports`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

/// Custom per-million-token pricing for a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingOverrideConfig {
    /// Price per 1M input tokens in USD
    pub input_per_m: f64,
    /// Price per 1M output tokens in USD
    pub output_per_m: f64,
}

impl AppConfig {
    /// Load configuration from the default path (~/.prospector/config.toml),
    /// then apply environment variable overrides:
    /// - `ANTHROPIC_API_KEY` / `PROSPECTOR_API_KEY` — engine key
    /// - `SERPAPI_API_KEY`, `BRAVE_API_KEY` — search backends
    /// - `PROSPECTOR_MODEL` — engine model
    /// - `PROSPECTOR_MEMORY_PATH` — memory document location
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.engine.api_key.is_none() {
            config.engine.api_key = std::env::var("PROSPECTOR_API_KEY")
                .ok()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok());
        }
        if config.search.serpapi_key.is_none() {
            config.search.serpapi_key = std::env::var("SERPAPI_API_KEY").ok();
        }
        if config.search.brave_key.is_none() {
            config.search.brave_key = std::env::var("BRAVE_API_KEY").ok();
        }
        if let Ok(model) = std::env::var("PROSPECTOR_MODEL") {
            config.engine.model = model;
        }
        if let Ok(path) = std::env::var("PROSPECTOR_MEMORY_PATH") {
            config.memory.path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".prospector")
    }

    /// Resolved memory document path.
    pub fn memory_path(&self) -> PathBuf {
        self.memory
            .path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("memory.json"))
    }

    /// Resolved export report directory.
    pub fn export_dir(&self) -> PathBuf {
        self.export
            .dir
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("reports"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.engine.temperature) {
            return Err(ConfigError::Validation(
                "engine.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.runner.max_iterations == 0 {
            return Err(ConfigError::Validation(
                "runner.max_iterations must be at least 1".into(),
            ));
        }
        if self.runner.compress_every < 2 {
            return Err(ConfigError::Validation(
                "runner.compress_every must be at least 2".into(),
            ));
        }
        if self.runner.tool_output_cap < 200 {
            return Err(ConfigError::Validation(
                "runner.tool_output_cap below 200 would starve the engine of results".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            runner: RunnerConfig::default(),
            search: SearchConfig::default(),
            memory: MemoryConfig::default(),
            export: ExportConfig::default(),
            pricing: HashMap::new(),
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
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    Validation(String),
}
