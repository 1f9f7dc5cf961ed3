//! Application configuration types.
//!
//! `AppConfig` represents the top-level `config.toml`. Every section and
//! field has a default so an empty or partial file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from `~/.clubhub/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Limits governing the conversation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// User turns an agent may handle before the session is considered stuck.
    #[serde(default = "default_reset_after_user_turns")]
    pub reset_after_user_turns: u32,

    /// Recent messages handed to the router.
    #[serde(default = "default_routing_history_limit")]
    pub routing_history_limit: u32,

    /// Messages loaded as LLM context before token truncation.
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: u32,

    /// Estimated token budget for system prompt plus history.
    #[serde(default = "default_context_token_budget")]
    pub context_token_budget: u32,

    /// Upper bound for one backend completion call.
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    /// Tool calls executed from a single completion.
    #[serde(default = "default_max_tool_calls_per_turn")]
    pub max_tool_calls_per_turn: usize,
}

fn default_reset_after_user_turns() -> u32 {
    15
}

fn default_routing_history_limit() -> u32 {
    5
}

fn default_max_history_messages() -> u32 {
    50
}

fn default_context_token_budget() -> u32 {
    6_000
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_max_tool_calls_per_turn() -> usize {
    8
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            reset_after_user_turns: default_reset_after_user_turns(),
            routing_history_limit: default_routing_history_limit(),
            max_history_messages: default_max_history_messages(),
            context_token_budget: default_context_token_budget(),
            llm_timeout_secs: default_llm_timeout_secs(),
            max_tool_calls_per_turn: default_max_tool_calls_per_turn(),
        }
    }
}

/// Chat-completion backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f64 {
    0.7
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            api_key_env: default_api_key_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Explicit SQLite URL. Defaults to `sqlite://<data_dir>/clubhub.db`.
    #[serde(default)]
    pub url: Option<String>,
}
