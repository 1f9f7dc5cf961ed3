//! Scripted provider used by the core test suites.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use clubhub_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason, ToolArguments,
    ToolCall, Usage,
};

use super::provider::LlmProvider;

pub(crate) enum Scripted {
    Reply(CompletionResponse),
    Fail(String),
    Hang,
}

/// Returns queued responses in order and records every request it receives.
#[derive(Clone)]
pub(crate) struct MockProvider {
    capabilities: ProviderCapabilities,
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            capabilities: ProviderCapabilities {
                tool_calling: true,
                max_context_tokens: 128_000,
                max_output_tokens: 4_096,
            },
            script: Arc::new(Mutex::new(script.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_capabilities(mut self, capabilities: ProviderCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

pub(crate) fn text(content: &str, input_tokens: u32, output_tokens: u32) -> Scripted {
    Scripted::Reply(CompletionResponse {
        id: "resp-text".to_string(),
        content: content.to_string(),
        model: "mock-model".to_string(),
        stop_reason: StopReason::EndTurn,
        usage: Usage {
            input_tokens,
            output_tokens,
        },
        tool_calls: vec![],
    })
}

pub(crate) fn tool_calls(calls: &[(&str, &str)], input_tokens: u32, output_tokens: u32) -> Scripted {
    Scripted::Reply(CompletionResponse {
        id: "resp-tools".to_string(),
        content: String::new(),
        model: "mock-model".to_string(),
        stop_reason: StopReason::ToolUse,
        usage: Usage {
            input_tokens,
            output_tokens,
        },
        tool_calls: calls
            .iter()
            .enumerate()
            .map(|(i, (name, raw))| ToolCall {
                id: format!("call_{i}"),
                name: name.to_string(),
                arguments: ToolArguments::parse(raw),
            })
            .collect(),
    })
}

pub(crate) fn empty() -> Scripted {
    text("", 5, 0)
}

pub(crate) fn fail(message: &str) -> Scripted {
    Scripted::Fail(message.to_string())
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        async move {
            match next {
                Some(Scripted::Reply(response)) => Ok(response),
                Some(Scripted::Fail(message)) => Err(LlmError::Provider { message }),
                Some(Scripted::Hang) => {
                    tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                    Err(LlmError::Provider {
                        message: "unreachable".to_string(),
                    })
                }
                None => Err(LlmError::Provider {
                    message: "mock script exhausted".to_string(),
                }),
            }
        }
    }
}
