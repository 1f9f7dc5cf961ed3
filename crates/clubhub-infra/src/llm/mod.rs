//! LLM provider implementations.
//!
//! Contains the OpenAI-compatible implementation of the [`LlmProvider`]
//! trait defined in `clubhub-core`, and a factory ([`create_provider`])
//! that builds it from an [`LlmConfig`].
//!
//! [`LlmProvider`]: clubhub_core::llm::provider::LlmProvider

pub mod openai_compat;

use secrecy::SecretString;

use clubhub_core::llm::box_provider::BoxLlmProvider;
use clubhub_types::config::LlmConfig;
use clubhub_types::llm::LlmError;

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Create a [`BoxLlmProvider`] from an [`LlmConfig`].
///
/// The API key is read from the environment variable named by
/// `config.api_key_env`. A missing or empty key is logged and tolerated:
/// completions then fail with `AuthenticationFailed` and agents answer
/// with their fallback text.
pub fn create_provider(config: &LlmConfig) -> Result<BoxLlmProvider, LlmError> {
    if config.base_url.trim().is_empty() {
        return Err(LlmError::InvalidRequest("llm.base_url must not be empty".into()));
    }
    let api_key = resolve_api_key(&config.api_key_env);
    if api_key.is_none() {
        tracing::warn!(
            env = %config.api_key_env,
            "No API key configured, agents will answer with fallback replies"
        );
    }
    let provider = OpenAiCompatibleProvider::new(OpenAiCompatConfig::from_llm_config(config, api_key));
    Ok(BoxLlmProvider::new(provider))
}

fn resolve_api_key(env_var: &str) -> Option<SecretString> {
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}
