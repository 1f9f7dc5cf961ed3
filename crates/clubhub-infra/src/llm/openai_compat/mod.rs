//! OpenAI-compatible LLM provider implementation.
//!
//! One [`OpenAiCompatibleProvider`] serves any endpoint that speaks the Chat
//! Completions API (OpenAI, Mistral, Gemini's OpenAI beta, local gateways)
//! through a configurable base URL.
//!
//! Uses [`async_openai`] for type-safe request/response handling, including
//! tool schemas and tool-call round trips.

pub mod config;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestToolMessage,
    ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, ChatCompletionTool, ChatCompletionTools,
    CreateChatCompletionRequest, CreateChatCompletionResponse, FinishReason, FunctionCall,
    FunctionObject,
};
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use clubhub_core::llm::provider::LlmProvider;
use clubhub_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, Message, MessageRole, ProviderCapabilities,
    StopReason, ToolArguments, ToolCall, ToolChoice, ToolDefinition, Usage,
};

use self::config::OpenAiCompatConfig;

/// Unified provider for any OpenAI-compatible API.
///
/// # API Key Security
///
/// Does NOT derive Debug: the key lives inside the `async_openai::Client`.
/// A provider without a key still constructs; every call then fails with
/// [`LlmError::AuthenticationFailed`] before touching the network, and the
/// gateway answers with the agent's fallback text.
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
    model: String,
    has_api_key: bool,
    capabilities: ProviderCapabilities,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_base(&config.base_url);
        if let Some(key) = &config.api_key {
            openai_config = openai_config.with_api_key(key.expose_secret());
        }

        Self {
            client: Client::with_config(openai_config),
            provider_name: config.provider_name,
            model: config.model,
            has_api_key: config.api_key.is_some(),
            capabilities: config.capabilities,
        }
    }

    /// Build a [`CreateChatCompletionRequest`] from a generic [`CompletionRequest`].
    ///
    /// `ToolChoice::None` sends no tool schema at all.
    fn build_request(&self, request: &CompletionRequest) -> CreateChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(system_message(system.clone()));
        }
        messages.extend(request.messages.iter().map(to_openai_message));

        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        let mut req = CreateChatCompletionRequest {
            model,
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            ..Default::default()
        };

        if request.tool_choice == ToolChoice::Auto && !request.tools.is_empty() {
            req.tools = Some(request.tools.iter().map(to_openai_tool).collect());
        }

        req
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn system_message(content: String) -> ChatCompletionRequestMessage {
    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
        content: ChatCompletionRequestSystemMessageContent::Text(content),
        name: None,
    })
}

fn to_openai_message(message: &Message) -> ChatCompletionRequestMessage {
    match message.role {
        MessageRole::System => system_message(message.content.clone()),
        MessageRole::User => {
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(message.content.clone()),
                name: None,
            })
        }
        MessageRole::Assistant => {
            let tool_calls = (!message.tool_calls.is_empty())
                .then(|| message.tool_calls.iter().map(to_openai_tool_call).collect());
            // A tool-call turn may carry no text; send `null` rather than "".
            let content = (!message.content.is_empty() || tool_calls.is_none()).then(|| {
                ChatCompletionRequestAssistantMessageContent::Text(message.content.clone())
            });

            #[allow(deprecated)]
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content,
                refusal: None,
                name: None,
                audio: None,
                tool_calls,
                function_call: None,
            })
        }
        MessageRole::Tool => {
            ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
                content: ChatCompletionRequestToolMessageContent::Text(message.content.clone()),
                tool_call_id: message.tool_call_id.clone().unwrap_or_default(),
            })
        }
    }
}

fn to_openai_tool_call(call: &ToolCall) -> ChatCompletionMessageToolCalls {
    ChatCompletionMessageToolCalls::Function(ChatCompletionMessageToolCall {
        id: call.id.clone(),
        function: FunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.to_raw(),
        },
    })
}

fn to_openai_tool(tool: &ToolDefinition) -> ChatCompletionTools {
    ChatCompletionTools::Function(ChatCompletionTool {
        function: FunctionObject {
            name: tool.name.clone(),
            description: Some(tool.description.clone()),
            parameters: Some(tool.parameters.clone()),
            strict: None,
        },
    })
}

/// Convert a Chat Completions response into a generic [`CompletionResponse`].
///
/// Tool-call argument strings are parsed here; malformed ones are kept as
/// [`ToolArguments::Malformed`] for the tool executor to reject.
fn from_openai_response(
    response: CreateChatCompletionResponse,
) -> Result<CompletionResponse, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Deserialization("response has no choices".to_string()))?;

    let tool_calls: Vec<ToolCall> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .filter_map(|call| match call {
            ChatCompletionMessageToolCalls::Function(call) => Some(ToolCall {
                id: call.id,
                arguments: ToolArguments::parse(&call.function.arguments),
                name: call.function.name,
            }),
            #[allow(unreachable_patterns)]
            _ => {
                warn!("Ignoring non-function tool call");
                None
            }
        })
        .collect();

    let stop_reason = match choice.finish_reason {
        Some(FinishReason::Stop) => StopReason::EndTurn,
        Some(FinishReason::Length) => StopReason::MaxTokens,
        Some(FinishReason::ToolCalls) | Some(FinishReason::FunctionCall) => StopReason::ToolUse,
        Some(FinishReason::ContentFilter) => StopReason::ContentFilter,
        None if !tool_calls.is_empty() => StopReason::ToolUse,
        None => StopReason::EndTurn,
    };

    let usage = response
        .usage
        .map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        id: response.id,
        content: choice.message.content.unwrap_or_default(),
        model: response.model,
        stop_reason,
        usage,
        tool_calls,
    })
}

// OpenAiCompatibleProvider intentionally does NOT derive Debug.

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if !self.has_api_key {
            return Err(LlmError::AuthenticationFailed);
        }

        let oai_request = self.build_request(request);
        debug!(
            model = %oai_request.model,
            messages = oai_request.messages.len(),
            tools = oai_request.tools.as_ref().map_or(0, Vec::len),
            "Sending chat completion"
        );

        let response = self
            .client
            .chat()
            .create(oai_request)
            .await
            .map_err(map_openai_error)?;

        from_openai_response(response)
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else if code == "context_length_exceeded"
                || api_err.message.contains("maximum context length")
            {
                context_length_exceeded(&api_err.message)
            } else if code == "server_error" || error_type == "overloaded_error" {
                LlmError::Overloaded(api_err.message.clone())
            } else if error_type == "invalid_request_error" {
                LlmError::InvalidRequest(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401 | 403) => LlmError::AuthenticationFailed,
            Some(429) => LlmError::RateLimited {
                retry_after_ms: None,
            },
            Some(503 | 529) => LlmError::Overloaded(err.to_string()),
            _ => LlmError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}

/// Read the limits out of messages like "maximum context length is 8192
/// tokens. However, your messages resulted in 9000 tokens". Unknown values
/// are reported as 0.
fn context_length_exceeded(message: &str) -> LlmError {
    LlmError::ContextLengthExceeded {
        max: number_after(message, "context length is").unwrap_or(0),
        requested: number_after(message, "resulted in").unwrap_or(0),
    }
}

fn number_after(message: &str, marker: &str) -> Option<u32> {
    let rest = &message[message.find(marker)? + marker.len()..];
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::error::{ApiError, OpenAIError};
    use clubhub_types::config::LlmConfig;
    use secrecy::SecretString;
    use serde_json::json;

    fn provider(api_key: Option<&str>) -> OpenAiCompatibleProvider {
        let llm = LlmConfig {
            base_url: "http://127.0.0.1:9/v1".into(),
            model: "gpt-4o-mini".into(),
            ..LlmConfig::default()
        };
        OpenAiCompatibleProvider::new(OpenAiCompatConfig::from_llm_config(
            &llm,
            api_key.map(SecretString::from),
        ))
    }

    fn search_tool() -> ToolDefinition {
        ToolDefinition {
            name: "search_clubs".into(),
            description: "Search clubs".into(),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    fn request(tools: Vec<ToolDefinition>) -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![
                Message::system("You help with clubs."),
                Message::user("find chess"),
                Message::assistant_tool_calls(
                    "",
                    vec![ToolCall {
                        id: "call_1".into(),
                        name: "search_clubs".into(),
                        arguments: ToolArguments::parse(r#"{"query":"chess"}"#),
                    }],
                ),
                Message::tool_result("call_1", "{\"count\":0}"),
            ],
            system: None,
            max_tokens: 256,
            temperature: Some(0.7),
            tools,
            tool_choice: ToolChoice::Auto,
        }
    }

    fn api_error(message: &str, kind: Option<&str>, code: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: message.to_string(),
            r#type: kind.map(str::to_string),
            param: None,
            code: code.map(str::to_string),
        })
    }

    #[test]
    fn test_build_request_with_tool_round_trip() {
        let body = serde_json::to_value(provider(Some("sk-test")).build_request(&request(vec![
            search_tool(),
        ])))
        .unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_completion_tokens"], 256);
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "search_clubs");

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        let assistant = &messages[2];
        assert_eq!(assistant["role"], "assistant");
        assert!(assistant.get("content").is_none_or(|c| c.is_null()));
        assert_eq!(
            assistant["tool_calls"][0]["function"]["arguments"],
            r#"{"query":"chess"}"#
        );
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "call_1");
    }

    #[test]
    fn test_tool_choice_none_sends_no_tools() {
        let mut req = request(vec![search_tool()]);
        req.tool_choice = ToolChoice::None;
        assert!(provider(Some("sk-test")).build_request(&req).tools.is_none());
        assert!(
            provider(Some("sk-test"))
                .build_request(&request(vec![]))
                .tools
                .is_none()
        );
    }

    #[test]
    fn test_empty_model_uses_default() {
        let mut req = request(vec![]);
        req.model = String::new();
        assert_eq!(provider(Some("sk-test")).build_request(&req).model, "gpt-4o-mini");
    }

    #[test]
    fn test_response_with_tool_calls() {
        let raw = json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_767_225_600,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "call_a", "type": "function",
                         "function": {"name": "search_clubs", "arguments": "{\"query\":\"chess\"}"}},
                        {"id": "call_b", "type": "function",
                         "function": {"name": "create_club", "arguments": "{oops"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 50, "completion_tokens": 12, "total_tokens": 62}
        });
        let response: CreateChatCompletionResponse = serde_json::from_value(raw).unwrap();
        let parsed = from_openai_response(response).unwrap();

        assert_eq!(parsed.stop_reason, StopReason::ToolUse);
        assert_eq!(parsed.usage.total(), 62);
        assert_eq!(parsed.content, "");
        assert_eq!(parsed.tool_calls[0].name, "search_clubs");
        assert!(matches!(parsed.tool_calls[0].arguments, ToolArguments::Valid(_)));
        assert!(matches!(
            parsed.tool_calls[1].arguments,
            ToolArguments::Malformed { .. }
        ));
    }

    #[test]
    fn test_response_without_choices_is_an_error() {
        let response: CreateChatCompletionResponse = serde_json::from_value(json!({
            "id": "x",
            "object": "chat.completion",
            "created": 0,
            "model": "m",
            "choices": []
        }))
        .unwrap();
        assert!(matches!(
            from_openai_response(response),
            Err(LlmError::Deserialization(_))
        ));
    }

    #[test]
    fn test_map_openai_error() {
        assert!(matches!(
            map_openai_error(api_error("Incorrect API key provided", None, Some("invalid_api_key"))),
            LlmError::AuthenticationFailed
        ));
        assert!(matches!(
            map_openai_error(api_error("Rate limit reached", Some("rate_limit_error"), None)),
            LlmError::RateLimited { retry_after_ms: None }
        ));
        assert!(matches!(
            map_openai_error(api_error("The server is overloaded", None, Some("server_error"))),
            LlmError::Overloaded(_)
        ));
        assert!(matches!(
            map_openai_error(OpenAIError::InvalidArgument("bad arg".into())),
            LlmError::InvalidRequest(_)
        ));
    }

    #[test]
    fn test_context_length_error_carries_limits() {
        let err = map_openai_error(api_error(
            "This model's maximum context length is 8192 tokens. However, your messages \
             resulted in 9000 tokens. Please reduce the length of the messages.",
            Some("invalid_request_error"),
            Some("context_length_exceeded"),
        ));
        assert!(matches!(
            err,
            LlmError::ContextLengthExceeded {
                max: 8192,
                requested: 9000
            }
        ));

        let err = map_openai_error(api_error(
            "too long",
            Some("invalid_request_error"),
            Some("context_length_exceeded"),
        ));
        assert!(matches!(
            err,
            LlmError::ContextLengthExceeded { max: 0, requested: 0 }
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let err = provider(None).complete(&request(vec![])).await.unwrap_err();
        assert!(matches!(err, LlmError::AuthenticationFailed));
    }
}
