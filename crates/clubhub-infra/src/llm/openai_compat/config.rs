//! Configuration for the OpenAI-compatible provider.
//!
//! [`OpenAiCompatConfig::from_llm_config`] turns the `[llm]` section of
//! `clubhub.toml` plus the resolved API key into everything the provider
//! needs, including the model's capabilities.

use secrecy::SecretString;

use clubhub_types::config::LlmConfig;
use clubhub_types::llm::ProviderCapabilities;

/// Configuration for an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Name reported in logs and spans.
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    /// `None` when no key is configured.
    pub api_key: Option<SecretString>,
    /// Default model when a request names none.
    pub model: String,
    pub capabilities: ProviderCapabilities,
}

impl OpenAiCompatConfig {
    pub fn from_llm_config(config: &LlmConfig, api_key: Option<SecretString>) -> Self {
        Self {
            provider_name: "openai_compatible".into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            capabilities: capabilities_for_model(&config.model),
        }
    }
}

/// Known limits per model family; unknown models get conservative ones.
pub fn capabilities_for_model(model: &str) -> ProviderCapabilities {
    if model.starts_with("gpt-4o") || model.starts_with("gpt-4.1") {
        ProviderCapabilities {
            tool_calling: true,
            max_context_tokens: 128_000,
            max_output_tokens: 16_384,
        }
    } else if model.starts_with("mistral-large") {
        ProviderCapabilities {
            tool_calling: true,
            max_context_tokens: 128_000,
            max_output_tokens: 32_768,
        }
    } else {
        ProviderCapabilities {
            tool_calling: true,
            max_context_tokens: 32_000,
            max_output_tokens: 4_096,
        }
    }
}
