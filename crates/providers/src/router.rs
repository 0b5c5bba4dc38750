//! Provider selection: builds the configured completion backend.

use std::sync::Arc;

use chathub_config::AppConfig;
use chathub_core::provider::Provider;
use tracing::{debug, warn};

use crate::openai_compat::OpenAiCompatProvider;

/// Build the provider described by the configuration.
///
/// Every supported backend speaks the OpenAI wire format, so the provider
/// name only selects the default base URL. `base_url` overrides it.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| default_base_url(&config.provider));

    if !config.has_api_key() {
        warn!(provider = %config.provider, "No API key configured; requests will likely be rejected");
    }

    debug!(provider = %config.provider, base_url = %base_url, "Building completion provider");

    Arc::new(OpenAiCompatProvider::with_timeout(
        &config.provider,
        base_url,
        config.api_key.clone().unwrap_or_default(),
        config.request_timeout_secs,
    ))
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => "https://openrouter.ai/api/v1".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
        assert!(default_base_url("unknown").contains("openrouter.ai"));
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let provider = build_from_config(&config);
        assert_eq!(provider.name(), "openrouter");
    }

    #[test]
    fn provider_name_follows_config() {
        let config = AppConfig {
            provider: "ollama".into(),
            base_url: Some("http://127.0.0.1:9/v1".into()),
            ..AppConfig::default()
        };
        assert_eq!(build_from_config(&config).name(), "ollama");
    }
}
