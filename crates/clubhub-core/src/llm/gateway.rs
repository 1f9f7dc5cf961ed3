//! One agent turn against the chat-completion backend.
//!
//! `LlmGateway` assembles a bounded context, calls the provider with the
//! agent's tool schema, runs requested tools, folds their results back in
//! with a single follow-up completion, and normalizes every failure into the
//! agent's canned fallback text. Errors never leave `run_turn`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, debug, info_span, warn};

use clubhub_types::config::{LlmConfig, OrchestratorConfig};
use clubhub_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, Message, ToolCall, ToolChoice,
};

use crate::agent::registry::AgentSpec;
use crate::tool::ToolDispatcher;

use super::box_provider::BoxLlmProvider;
use super::token_budget::ContextWindow;

/// Static request parameters for every completion.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub timeout: Duration,
    pub context: ContextWindow,
    pub max_tool_calls: usize,
}

impl GatewaySettings {
    pub fn from_config(llm: &LlmConfig, orchestrator: &OrchestratorConfig) -> Self {
        Self {
            model: llm.model.clone(),
            max_tokens: llm.max_tokens,
            temperature: Some(llm.temperature),
            timeout: Duration::from_secs(orchestrator.llm_timeout_secs),
            context: ContextWindow::new(orchestrator.context_token_budget),
            max_tool_calls: orchestrator.max_tool_calls_per_turn,
        }
    }
}

/// Inputs for one model-backed turn.
pub struct TurnRequest<'a> {
    pub agent: &'a AgentSpec,
    /// Prior conversation, oldest first, excluding the current message.
    pub history: &'a [Message],
    pub message: &'a str,
    pub user_id: &'a str,
}

/// Final answer of a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub text: String,
    pub tokens_used: u32,
    /// A tool reported that the agent's task is finished.
    pub task_completed: bool,
}

impl TurnReply {
    fn fallback(agent: &AgentSpec, tokens_used: u32) -> Self {
        Self {
            text: agent.fallback.clone(),
            tokens_used,
            task_completed: false,
        }
    }
}

pub struct LlmGateway {
    provider: Arc<BoxLlmProvider>,
    settings: GatewaySettings,
}

impl LlmGateway {
    /// The context budget never exceeds what the provider's model accepts.
    pub fn new(provider: Arc<BoxLlmProvider>, mut settings: GatewaySettings) -> Self {
        let max_context = provider.capabilities().max_context_tokens;
        settings.context.max_tokens = settings.context.max_tokens.min(max_context);
        Self { provider, settings }
    }

    /// Run one backend round with the agent's tool schema, bounded by the
    /// configured timeout. Providers without tool calling get no schema.
    pub async fn complete(
        &self,
        agent: &AgentSpec,
        messages: Vec<Message>,
    ) -> Result<CompletionResponse, LlmError> {
        let capabilities = self.provider.capabilities();
        let tools = if capabilities.tool_calling {
            agent.tools.clone()
        } else {
            Vec::new()
        };
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            system: None,
            max_tokens: self.settings.max_tokens.min(capabilities.max_output_tokens),
            temperature: self.settings.temperature,
            tools,
            tool_choice: ToolChoice::Auto,
        };

        let span = info_span!(
            "gen_ai.chat",
            gen_ai.provider.name = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.agent.name = %agent.name,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
        );

        let call = async {
            let response = tokio::time::timeout(self.settings.timeout, self.provider.complete(&request))
                .await
                .map_err(|_| LlmError::Timeout {
                    secs: self.settings.timeout.as_secs(),
                })??;

            let current = tracing::Span::current();
            current.record("gen_ai.usage.input_tokens", response.usage.input_tokens);
            current.record("gen_ai.usage.output_tokens", response.usage.output_tokens);
            Ok::<_, LlmError>(response)
        };

        call.instrument(span).await
    }

    /// Produce the agent's answer for one user message.
    ///
    /// Transport errors, timeouts and empty answers yield the agent's
    /// fallback text; token costs of both rounds are summed.
    pub async fn run_turn<T: ToolDispatcher>(&self, turn: TurnRequest<'_>, tools: &T) -> TurnReply {
        let agent = turn.agent;
        let mut messages = self
            .settings
            .context
            .assemble(&agent.system_prompt, turn.history, turn.message);

        let first = match self.complete(agent, messages.clone()).await {
            Ok(response) if !response.is_empty() => response,
            Ok(_) => {
                warn!(agent = %agent.name, "Backend returned neither text nor tool calls");
                return TurnReply::fallback(agent, 0);
            }
            Err(err) => {
                warn!(agent = %agent.name, error = %err, "Completion failed, using fallback");
                return TurnReply::fallback(agent, 0);
            }
        };

        let first_tokens = first.usage.total();
        if first.tool_calls.is_empty() {
            return TurnReply {
                text: first.content,
                tokens_used: first_tokens,
                task_completed: false,
            };
        }

        debug!(
            agent = %agent.name,
            calls = first.tool_calls.len(),
            "Model requested tool calls"
        );
        messages.push(Message::assistant_tool_calls(
            first.content.clone(),
            first.tool_calls.clone(),
        ));
        let task_completed = self
            .execute_tool_calls(agent, &first.tool_calls, turn.user_id, tools, &mut messages)
            .await;

        match self.complete(agent, messages).await {
            Ok(second) if !second.content.trim().is_empty() => TurnReply {
                text: second.content,
                tokens_used: first_tokens + second.usage.total(),
                task_completed,
            },
            Ok(second) => {
                warn!(agent = %agent.name, "Follow-up completion had no text");
                TurnReply {
                    task_completed,
                    ..TurnReply::fallback(agent, first_tokens + second.usage.total())
                }
            }
            Err(err) => {
                warn!(agent = %agent.name, error = %err, "Follow-up completion failed");
                TurnReply {
                    task_completed,
                    ..TurnReply::fallback(agent, first_tokens)
                }
            }
        }
    }

    /// Execute each call and append its `tool` message. Returns whether any
    /// tool reported task completion.
    async fn execute_tool_calls<T: ToolDispatcher>(
        &self,
        agent: &AgentSpec,
        calls: &[ToolCall],
        user_id: &str,
        tools: &T,
        messages: &mut Vec<Message>,
    ) -> bool {
        let mut task_completed = false;
        for (index, call) in calls.iter().enumerate() {
            if index >= self.settings.max_tool_calls {
                messages.push(Message::tool_result(
                    call.id.clone(),
                    "Error: tool call limit reached",
                ));
                continue;
            }

            let content = match tools.dispatch(&agent.name, call, user_id).await {
                Ok(outcome) => {
                    task_completed |= outcome.task_completed;
                    outcome.content
                }
                Err(err) => {
                    warn!(agent = %agent.name, tool = %call.name, error = %err, "Tool call failed");
                    format!("Error: {err}")
                }
            };
            messages.push(Message::tool_result(call.id.clone(), content));
        }
        task_completed
    }
}
