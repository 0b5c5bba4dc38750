//! Configuration loading, validation, and management for Chat Hub.
//!
//! Loads configuration from `~/.chathub/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use chathub_core::ModelTier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The persona every plain-chat request starts with.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Chat Hub, a helpful and friendly conversational assistant.

Your tone must always be friendly, casual, and helpful.
Be clear, accurate, and supportive.
When unsure, respond transparently without speculation.
";

/// The root configuration structure.
///
/// Maps directly to `~/.chathub/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider name; selects the default base URL
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model tier selected when a session starts
    #[serde(default)]
    pub default_model: ModelTier,

    /// Model used for `/image`
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Sampling temperature; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Max tokens per response; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Timeout for completion requests, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Tier → provider model id mapping
    #[serde(default)]
    pub models: ModelsConfig,

    /// Persona configuration
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Memory summarizer configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// URL and file fetcher limits
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Context assembly budget
    #[serde(default)]
    pub context: ContextConfig,

    /// Input reject-list
    #[serde(default)]
    pub guard: GuardConfig,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_image_model() -> String {
    "black-forest-labs/flux.2-pro".into()
}
fn default_request_timeout() -> u64 {
    120
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
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
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("image_model", &self.image_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("models", &self.models)
            .field("identity", &self.identity)
            .field("memory", &self.memory)
            .field("fetch", &self.fetch)
            .field("context", &self.context)
            .field("guard", &self.guard)
            .finish()
    }
}

/// Provider model ids behind each user-facing tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_lite")]
    pub lite: String,
    #[serde(default = "default_fast")]
    pub fast: String,
    #[serde(default = "default_smart")]
    pub smart: String,
    #[serde(default = "default_turbo")]
    pub turbo: String,
}

fn default_lite() -> String {
    "openai/gpt-3.5-turbo".into()
}
fn default_fast() -> String {
    "openai/gpt-4.1".into()
}
fn default_smart() -> String {
    "openai/gpt-4o".into()
}
fn default_turbo() -> String {
    "openai/gpt-oss-120b".into()
}

impl ModelsConfig {
    /// The provider model id for a tier.
    pub fn resolve(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Lite => &self.lite,
            ModelTier::Fast => &self.fast,
            ModelTier::Smart => &self.smart,
            ModelTier::Turbo => &self.turbo,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            lite: default_lite(),
            fast: default_fast(),
            smart: default_smart(),
            turbo: default_turbo(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base persona prompt sent as the first system message
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Run the summarizer after every plain-chat turn
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Lightweight model used for summarization
    #[serde(default = "default_lite")]
    pub model: String,

    /// How many recent non-image turns are summarized
    #[serde(default = "default_memory_window")]
    pub window: usize,
}

fn default_memory_window() -> usize {
    6
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_lite(),
            window: default_memory_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Character budget for any fetched text
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_pdf_max_pages")]
    pub pdf_max_pages: usize,

    #[serde(default = "default_csv_preview_rows")]
    pub csv_preview_rows: usize,
}

fn default_fetch_timeout() -> u64 {
    10
}
fn default_max_chars() -> usize {
    chathub_core::fetch::DEFAULT_MAX_CHARS
}
fn default_user_agent() -> String {
    "Mozilla/5.0".into()
}
fn default_pdf_max_pages() -> usize {
    5
}
fn default_csv_preview_rows() -> usize {
    50
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            max_chars: default_max_chars(),
            user_agent: default_user_agent(),
            pdf_max_pages: default_pdf_max_pages(),
            csv_preview_rows: default_csv_preview_rows(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Token budget for one assembled request
    #[serde(default = "default_budget_tokens")]
    pub budget_tokens: usize,
}

fn default_budget_tokens() -> usize {
    8192
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            budget_tokens: default_budget_tokens(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Substrings that reject an input (matched case-insensitively)
    #[serde(default)]
    pub forbidden: Vec<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.chathub/config.toml).
    ///
    /// Also checks environment variables:
    /// - `CHATHUB_API_KEY` (highest priority), `OPENROUTER_API_KEY`, `OPENAI_API_KEY`
    /// - `CHATHUB_BASE_URL`
    /// - `CHATHUB_MODEL` (a tier label)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
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

    /// Apply environment overrides using `var` as the lookup, then
    /// validate the result.
    pub fn apply_env_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(key) = var("CHATHUB_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            self.api_key = var("OPENROUTER_API_KEY").or_else(|| var("OPENAI_API_KEY"));
        }

        if let Some(url) = var("CHATHUB_BASE_URL") {
            self.base_url = Some(url);
        }

        if let Some(tier) = var("CHATHUB_MODEL") {
            self.default_model = tier.parse().map_err(ConfigError::ValidationError)?;
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".chathub")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }

        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationError(format!(
                    "base_url must start with http:// or https:// (got '{url}')"
                )));
            }
        }

        if self.fetch.max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "fetch.max_chars must be > 0".into(),
            ));
        }

        if self.fetch.timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least 1 second".into(),
            ));
        }

        if self.memory.window == 0 {
            return Err(ConfigError::ValidationError(
                "memory.window must be > 0".into(),
            ));
        }

        if self.guard.forbidden.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "guard.forbidden entries must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// The provider model id for the given tier.
    pub fn model_id(&self, tier: ModelTier) -> &str {
        self.models.resolve(tier)
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            base_url: None,
            default_model: ModelTier::default(),
            image_model: default_image_model(),
            temperature: None,
            max_tokens: None,
            request_timeout_secs: default_request_timeout(),
            models: ModelsConfig::default(),
            identity: IdentityConfig::default(),
            memory: MemoryConfig::default(),
            fetch: FetchConfig::default(),
            context: ContextConfig::default(),
            guard: GuardConfig::default(),
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

impl From<ConfigError> for chathub_core::Error {
    fn from(err: ConfigError) -> Self {
        chathub_core::Error::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "openrouter");
        assert_eq!(config.fetch.max_chars, 6000);
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.memory.window, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tiers_resolve_to_reference_models() {
        let config = AppConfig::default();
        assert_eq!(config.model_id(ModelTier::Lite), "openai/gpt-3.5-turbo");
        assert_eq!(config.model_id(ModelTier::Fast), "openai/gpt-4.1");
        assert_eq!(config.model_id(ModelTier::Smart), "openai/gpt-4o");
        assert_eq!(config.model_id(ModelTier::Turbo), "openai/gpt-oss-120b");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider, config.provider);
        assert_eq!(parsed.image_model, config.image_model);
        assert_eq!(parsed.identity.system_prompt, config.identity.system_prompt);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: Some(5.0),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_forbidden_term_rejected() {
        let mut config = AppConfig::default();
        config.guard.forbidden = vec!["  ".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider, "openrouter");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "default_model = \"smart\"\n\n[guard]\nforbidden = [\"secret\"]").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, ModelTier::Smart);
        assert_eq!(config.guard.forbidden, vec!["secret".to_string()]);
        assert_eq!(config.fetch.pdf_max_pages, 5);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "provider = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_key_priority() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[
                ("OPENAI_API_KEY", "sk-openai"),
                ("OPENROUTER_API_KEY", "sk-or"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-or"));

        config
            .apply_env_overrides(env(&[("CHATHUB_API_KEY", "sk-hub")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-hub"));
    }

    #[test]
    fn env_model_override_validated() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[("CHATHUB_MODEL", "turbo")]))
            .unwrap();
        assert_eq!(config.default_model, ModelTier::Turbo);

        assert!(config
            .apply_env_overrides(env(&[("CHATHUB_MODEL", "galactic")]))
            .is_err());
    }

    #[test]
    fn env_base_url_is_validated() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[("CHATHUB_BASE_URL", "http://localhost:11434/v1")]))
            .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:11434/v1"));

        let err = config
            .apply_env_overrides(env(&[("CHATHUB_BASE_URL", "ftp://x")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn file_base_url_scheme_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "base_url = \"localhost:8080\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-very-secret".into()),
            ..AppConfig::default()
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-very-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("openrouter"));
        assert!(toml_str.contains("flux.2-pro"));
    }
}
