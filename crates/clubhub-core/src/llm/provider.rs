//! LlmProvider trait definition.
//!
//! This is the core abstraction that chat-completion backends implement.
//! Uses RPITIT for `complete`; `BoxLlmProvider` adds dynamic dispatch.

use clubhub_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities};

/// Trait for chat-completion backends (OpenAI-compatible APIs, test doubles).
///
/// Implementations live in clubhub-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// What this provider supports (tool calling, context size).
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Send a completion request, optionally carrying tool definitions, and
    /// receive the full response including any requested tool calls.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
