//! Configuration loading, validation, and management for Datasynth.
//!
//! Loads configuration from `~/.datasynth/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! There is no built-in API key. Commands that talk to the model call
//! [`AppConfig::require_api_key`] and stop with a clear error when none
//! was supplied.

use datasynth_core::provider::GenerationParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.datasynth/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the generation endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Generation endpoint and decoding parameters
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Page fetcher settings
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Retrieval and prompt-window settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("generation", &self.generation)
            .field("scraper", &self.scraper)
            .field("knowledge", &self.knowledge)
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the models collection; the request goes to
    /// `{api_url}/{model}:generateContent`
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".into()
}
fn default_model() -> String {
    "gemini-pro".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_k() -> u32 {
    40
}
fn default_top_p() -> f32 {
    0.95
}
fn default_max_output_tokens() -> u32 {
    1024
}

impl GenerationConfig {
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Scraped text is cut to this many characters
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

fn default_timeout_ms() -> u64 {
    10_000
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into()
}
fn default_max_content_chars() -> usize {
    5000
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Documents pulled from the store per conversation turn
    #[serde(default = "default_query_limit")]
    pub query_limit: usize,

    /// Recent turns rendered into the prompt
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Scraped characters forwarded to the model
    #[serde(default = "default_url_excerpt_chars")]
    pub url_excerpt_chars: usize,

    /// Completeness score at which the business profile counts as full
    #[serde(default = "default_completeness_threshold")]
    pub completeness_threshold: f32,
}

fn default_query_limit() -> usize {
    datasynth_core::memory::DEFAULT_QUERY_LIMIT
}
fn default_history_window() -> usize {
    5
}
fn default_url_excerpt_chars() -> usize {
    2000
}
fn default_completeness_threshold() -> f32 {
    0.8
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            query_limit: default_query_limit(),
            history_window: default_history_window(),
            url_excerpt_chars: default_url_excerpt_chars(),
            completeness_threshold: default_completeness_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.datasynth/config.toml).
    ///
    /// Also checks environment variables:
    /// - `DATASYNTH_API_KEY` (highest priority)
    /// - `GEMINI_API_KEY`
    /// - `DATASYNTH_MODEL`, `DATASYNTH_API_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
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

    /// Apply environment overrides using the given lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let env_key = lookup("DATASYNTH_API_KEY").or_else(|| lookup("GEMINI_API_KEY"));
        if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }

        if let Some(model) = lookup("DATASYNTH_MODEL") {
            self.generation.model = model;
        }

        if let Some(url) = lookup("DATASYNTH_API_URL") {
            self.generation.api_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".datasynth")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.generation;
        if !(0.0..=2.0).contains(&g.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if g.top_p <= 0.0 || g.top_p > 1.0 {
            return Err(ConfigError::ValidationError(
                "generation.top_p must be in (0.0, 1.0]".into(),
            ));
        }

        if g.max_output_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "generation.max_output_tokens must be > 0".into(),
            ));
        }

        if self.scraper.timeout_ms == 0 || self.scraper.max_content_chars == 0 {
            return Err(ConfigError::ValidationError(
                "scraper.timeout_ms and scraper.max_content_chars must be > 0".into(),
            ));
        }

        let k = &self.knowledge;
        if k.query_limit == 0 || k.history_window == 0 || k.url_excerpt_chars == 0 {
            return Err(ConfigError::ValidationError(
                "knowledge.query_limit, history_window and url_excerpt_chars must be > 0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&k.completeness_threshold) {
            return Err(ConfigError::ValidationError(
                "knowledge.completeness_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        Ok(())
    }

    /// Return the API key or fail with setup instructions.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.require_api_key().is_ok()
    }

    /// Generate a default config TOML string (for `config --init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            generation: GenerationConfig::default(),
            scraper: ScraperConfig::default(),
            knowledge: KnowledgeConfig::default(),
            gateway: GatewayConfig::default(),
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

    #[error("No API key configured: set DATASYNTH_API_KEY or GEMINI_API_KEY, or add api_key to the config file")]
    MissingApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.generation.model, "gemini-pro");
        assert_eq!(config.scraper.timeout_ms, 10_000);
        assert_eq!(config.knowledge.query_limit, 3);
        assert_eq!(config.knowledge.history_window, 5);
    }

    #[test]
    fn default_config_has_no_api_key() {
        let config = AppConfig::default();
        assert!(!config.has_api_key());
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let config = AppConfig {
            api_key: Some("   ".into()),
            ..AppConfig::default()
        };
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("super-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.generation.model, config.generation.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.generation.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_query_limit_rejected() {
        let mut config = AppConfig::default();
        config.knowledge.query_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.generation.model, "gemini-pro");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_key = "from-file"

[generation]
model = "gemini-1.5-flash"

[knowledge]
query_limit = 5
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.require_api_key().unwrap(), "from-file");
        assert_eq!(config.generation.model, "gemini-1.5-flash");
        assert_eq!(config.generation.max_output_tokens, 1024);
        assert_eq!(config.knowledge.query_limit, 5);
        assert_eq!(config.knowledge.history_window, 5);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "generation = [not toml").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_take_priority() {
        let env: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "gemini-key"),
            ("DATASYNTH_MODEL", "gemini-2.0-flash"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig {
            api_key: Some("file-key".into()),
            ..AppConfig::default()
        };
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_key.as_deref(), Some("gemini-key"));
        assert_eq!(config.generation.model, "gemini-2.0-flash");
    }

    #[test]
    fn datasynth_key_beats_gemini_key() {
        let env: HashMap<&str, &str> = [
            ("DATASYNTH_API_KEY", "primary"),
            ("GEMINI_API_KEY", "secondary"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini-pro"));
        assert!(toml_str.contains("8787"));
        assert!(!toml_str.contains("api_key"));
    }

    #[test]
    fn generation_params_follow_config() {
        let mut config = AppConfig::default();
        config.generation.top_k = 20;
        let params = config.generation.params();
        assert_eq!(params.top_k, 20);
        assert_eq!(params.max_output_tokens, 1024);
    }
}
