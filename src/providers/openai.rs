//! OpenAI-compatible provider implementation
//!
//! Implements the `CompletionProvider` trait for the Chat Completions API,
//! handling message conversion, tool calls, and response parsing. A custom
//! base URL covers OpenAI-compatible gateways and local inference servers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::tools::ToolSpec;
use crate::transcript::{Message, Role, ToolCall};

use super::{classify_http_error, ChatOptions, Completion, CompletionProvider, Usage};

/// The default API endpoint URL.
const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// The default model to use.
const DEFAULT_MODEL: &str = "gpt-4o";

// ============================================================================
// Request Wire Types
// ============================================================================

/// Chat Completions request body.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    /// Model identifier
    model: String,
    /// Conversation messages (including system)
    messages: Vec<WireMessage>,
    /// Available tools
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    /// Tool selection mode; "auto" lets the model pick tools freely
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Top-p (nucleus) sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    /// Stop sequences
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

/// A message in wire format.
#[derive(Debug, Serialize)]
struct WireMessage {
    /// Role: "system", "user", "assistant", or "tool"
    role: String,
    /// Message content (null for assistant messages that only call tools)
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    /// Tool calls made by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    /// ID of the tool call this message is responding to
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    /// Tool name on tool-result messages
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

/// A tool call attached to an assistant message.
#[derive(Debug, Serialize)]
struct WireToolCall {
    /// Unique identifier for this tool call
    id: String,
    /// Type of tool call (always "function")
    r#type: String,
    /// Function details
    function: FunctionCall,
}

/// Function call details.
#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    /// Name of the function to call
    name: String,
    /// JSON-encoded arguments
    arguments: String,
}

/// Tool definition in wire format.
#[derive(Debug, Serialize)]
struct WireTool {
    /// Type of tool (always "function")
    r#type: String,
    /// Function definition
    function: FunctionDef,
}

/// Function definition.
#[derive(Debug, Serialize)]
struct FunctionDef {
    /// Function name
    name: String,
    /// Function description
    description: String,
    /// JSON Schema for function parameters
    parameters: serde_json::Value,
}

// ============================================================================
// Response Wire Types
// ============================================================================

/// Chat Completions response body.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    /// Response choices
    choices: Vec<Choice>,
    /// Token usage
    usage: Option<WireUsage>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct Choice {
    /// The message content
    message: ResponseMessage,
}

/// The assistant message in a response.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    /// Text content (may be null if tool_calls present)
    content: Option<String>,
    /// Tool calls made by the model
    tool_calls: Option<Vec<ResponseToolCall>>,
}

/// A tool call in the response.
#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    /// Unique identifier for this tool call
    id: String,
    /// Function details
    function: FunctionCall,
}

/// Token usage in wire format.
#[derive(Debug, Deserialize)]
struct WireUsage {
    /// Tokens in the prompt
    prompt_tokens: u32,
    /// Tokens in the completion
    completion_tokens: u32,
}

/// API error response envelope.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

/// API error details.
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    r#type: String,
}

// ============================================================================
// Provider
// ============================================================================

/// Completion provider speaking the OpenAI Chat Completions wire format.
pub struct OpenAiProvider {
    /// API key for authentication
    api_key: String,
    /// API base URL
    api_base: String,
    /// HTTP client for making requests
    client: Client,
}

impl OpenAiProvider {
    /// Create a new provider against the default OpenAI endpoint.
    ///
    /// # Example
    /// ```
    /// use papermule::providers::{CompletionProvider, OpenAiProvider};
    ///
    /// let provider = OpenAiProvider::new("sk-xxx");
    /// assert_eq!(provider.name(), "openai");
    /// ```
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_base: OPENAI_API_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Create a provider with a custom base URL.
    ///
    /// Useful for OpenAI-compatible APIs (gateways, local inference servers).
    /// A trailing slash on the base URL is removed.
    pub fn with_base_url(api_key: &str, api_base: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a provider with a custom HTTP client (timeouts, proxies).
    pub fn with_client(api_key: &str, api_base: &str, client: Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
        }
    }
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert transcript messages to wire format.
fn convert_messages(messages: Vec<Message>) -> Vec<WireMessage> {
    messages
        .into_iter()
        .map(|msg| {
            let role = match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::Tool => "tool",
            }
            .to_string();

            let tool_calls = msg.tool_calls.map(|tcs| {
                tcs.into_iter()
                    .map(|tc| WireToolCall {
                        id: tc.id,
                        r#type: "function".to_string(),
                        function: FunctionCall {
                            name: tc.name,
                            arguments: tc.arguments,
                        },
                    })
                    .collect()
            });

            WireMessage {
                role,
                content: if msg.content.is_empty() && tool_calls.is_some() {
                    None
                } else {
                    Some(msg.content)
                },
                tool_calls,
                tool_call_id: msg.tool_call_id,
                name: msg.tool_name,
            }
        })
        .collect()
}

/// Convert tool specs to wire format.
fn convert_tools(tools: Vec<ToolSpec>) -> Vec<WireTool> {
    tools
        .into_iter()
        .map(|t| WireTool {
            r#type: "function".to_string(),
            function: FunctionDef {
                name: t.name,
                description: t.description,
                parameters: t.parameters,
            },
        })
        .collect()
}

/// Convert a wire response to a [`Completion`].
fn convert_response(response: ChatCompletionResponse) -> Completion {
    let choice = response.choices.into_iter().next();

    let (content, tool_calls) = match choice {
        Some(c) => {
            let content = c.message.content.unwrap_or_default();
            let tool_calls = c
                .message
                .tool_calls
                .map(|tcs| {
                    tcs.into_iter()
                        .map(|tc| ToolCall::new(&tc.id, &tc.function.name, &tc.function.arguments))
                        .collect()
                })
                .unwrap_or_default();
            (content, tool_calls)
        }
        None => (String::new(), Vec::new()),
    };

    let mut completion = if tool_calls.is_empty() {
        Completion::text(&content)
    } else {
        Completion::with_tools(&content, tool_calls)
    };

    if let Some(usage) = response.usage {
        completion = completion.with_usage(Usage::new(usage.prompt_tokens, usage.completion_tokens));
    }

    completion
}

// ============================================================================
// CompletionProvider Implementation
// ============================================================================

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolSpec>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<Completion> {
        let model = model.unwrap_or(DEFAULT_MODEL);
        let wire_messages = convert_messages(messages);
        let has_tools = !tools.is_empty();
        let wire_tools = if has_tools {
            Some(convert_tools(tools))
        } else {
            None
        };

        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: wire_messages,
            tools: wire_tools,
            tool_choice: if has_tools { Some("auto") } else { None },
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            stop: options.stop,
        };

        debug!(model = model, "Chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();

            // Prefer the structured error message when the body parses
            let detail = match serde_json::from_str::<ApiErrorResponse>(&error_text) {
                Ok(body) => format!("{} - {}", body.error.r#type, body.error.message),
                Err(_) => error_text,
            };

            return Err(classify_http_error(status, &detail).into());
        }

        let completion_response: ChatCompletionResponse = response.json().await?;

        info!("Chat completion response received");
        Ok(convert_response(completion_response))
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new("test-key");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), "gpt-4o");
        assert_eq!(provider.api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn test_provider_with_base_url() {
        let provider = OpenAiProvider::with_base_url("test-key", "https://custom.api/v1/");
        assert_eq!(provider.api_base, "https://custom.api/v1");
    }

    #[test]
    fn test_provider_with_client() {
        let client = Client::new();
        let provider = OpenAiProvider::with_client("test-key", "https://api.openai.com/v1", client);
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_convert_messages_simple() {
        let messages = vec![
            Message::system("You are a research assistant"),
            Message::user("Hello"),
            Message::assistant("Hi there!"),
        ];
        let converted = convert_messages(messages);

        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0].role, "system");
        assert_eq!(
            converted[0].content,
            Some("You are a research assistant".to_string())
        );
        assert_eq!(converted[1].role, "user");
        assert_eq!(converted[2].role, "assistant");
    }

    #[test]
    fn test_convert_messages_with_tool_calls() {
        let call = ToolCall::new("call_1", "arxiv_search", r#"{"query": "rust"}"#);
        let messages = vec![
            Message::assistant_with_tools("Let me search", vec![call]),
            Message::tool_result("call_1", "arxiv_search", "Found results"),
        ];
        let converted = convert_messages(messages);

        assert_eq!(converted.len(), 2);

        // First message: assistant with tool calls
        assert_eq!(converted[0].role, "assistant");
        let tool_calls = converted[0].tool_calls.as_ref().unwrap();
        assert_eq!(tool_calls.len(), 1);
        assert_eq!(tool_calls[0].id, "call_1");
        assert_eq!(tool_calls[0].r#type, "function");
        assert_eq!(tool_calls[0].function.name, "arxiv_search");

        // Second message: tool result carries both the call id and tool name
        assert_eq!(converted[1].role, "tool");
        assert_eq!(converted[1].tool_call_id, Some("call_1".to_string()));
        assert_eq!(converted[1].name, Some("arxiv_search".to_string()));
        assert_eq!(converted[1].content, Some("Found results".to_string()));
    }

    #[test]
    fn test_convert_messages_empty_content_with_tool_calls() {
        let call = ToolCall::new("call_1", "echo", r#"{"message": "test"}"#);
        let messages = vec![Message::assistant_with_tools("", vec![call])];
        let converted = convert_messages(messages);

        // Content should be None when empty and tool_calls present
        assert!(converted[0].content.is_none());
        assert!(converted[0].tool_calls.is_some());
    }

    #[test]
    fn test_convert_tools() {
        let tools = vec![ToolSpec::new(
            "arxiv_search",
            "Search arXiv for papers",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"}
                }
            }),
        )];
        let converted = convert_tools(tools);

        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].r#type, "function");
        assert_eq!(converted[0].function.name, "arxiv_search");
        assert_eq!(converted[0].function.description, "Search arXiv for papers");
    }

    #[test]
    fn test_convert_response_text_only() {
        let response = ChatCompletionResponse {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: Some("Hello!".to_string()),
                    tool_calls: None,
                },
            }],
            usage: Some(WireUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
            }),
        };
        let converted = convert_response(response);

        assert_eq!(converted.content, "Hello!");
        assert!(!converted.has_tool_calls());

        let usage = converted.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 10);
        assert_eq!(usage.completion_tokens, 5);
        assert_eq!(usage.total_tokens, 15);
    }

    #[test]
    fn test_convert_response_with_tool_calls() {
        let response = ChatCompletionResponse {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: Some("".to_string()),
                    tool_calls: Some(vec![ResponseToolCall {
                        id: "call_123".to_string(),
                        function: FunctionCall {
                            name: "arxiv_search".to_string(),
                            arguments: r#"{"query":"test"}"#.to_string(),
                        },
                    }]),
                },
            }],
            usage: None,
        };
        let converted = convert_response(response);

        assert!(converted.has_tool_calls());
        assert_eq!(converted.tool_calls.len(), 1);
        assert_eq!(converted.tool_calls[0].id, "call_123");
        assert_eq!(converted.tool_calls[0].name, "arxiv_search");
        assert_eq!(converted.tool_calls[0].arguments, r#"{"query":"test"}"#);
    }

    #[test]
    fn test_convert_response_empty_choices() {
        let response = ChatCompletionResponse {
            choices: vec![],
            usage: None,
        };
        let converted = convert_response(response);

        assert_eq!(converted.content, "");
        assert!(!converted.has_tool_calls());
    }

    #[test]
    fn test_convert_response_null_content() {
        let response = ChatCompletionResponse {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: None,
                    tool_calls: Some(vec![ResponseToolCall {
                        id: "call_1".to_string(),
                        function: FunctionCall {
                            name: "echo".to_string(),
                            arguments: "{}".to_string(),
                        },
                    }]),
                },
            }],
            usage: None,
        };
        let converted = convert_response(response);

        // Content should be empty string when null
        assert_eq!(converted.content, "");
        assert!(converted.has_tool_calls());
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: Some("Hello".to_string()),
                tool_calls: None,
                tool_call_id: None,
                name: None,
            }],
            tools: None,
            tool_choice: None,
            max_tokens: Some(1000),
            temperature: Some(0.7),
            top_p: None,
            stop: None,
        };

        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains("gpt-4o"));
        assert!(json.contains("max_tokens"));
        assert!(json.contains("Hello"));
        assert!(json.contains("temperature"));
        // Optional fields that are None should not be present
        assert!(!json.contains("top_p"));
        assert!(!json.contains("stop"));
        assert!(!json.contains("tools"));
        assert!(!json.contains("tool_choice"));
    }

    #[test]
    fn test_request_with_tools_sets_auto_choice() {
        let request = ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![],
            tools: Some(vec![WireTool {
                r#type: "function".to_string(),
                function: FunctionDef {
                    name: "arxiv_search".to_string(),
                    description: "Search arXiv".to_string(),
                    parameters: serde_json::json!({"type": "object"}),
                },
            }]),
            tool_choice: Some("auto"),
            max_tokens: None,
            temperature: None,
            top_p: None,
            stop: None,
        };

        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains("tools"));
        assert!(json.contains(r#""type":"function""#));
        assert!(json.contains(r#""tool_choice":"auto""#));
    }

    #[test]
    fn test_wire_message_with_tool_call_id() {
        let msg = WireMessage {
            role: "tool".to_string(),
            content: Some("Tool result".to_string()),
            tool_calls: None,
            tool_call_id: Some("call_123".to_string()),
            name: Some("echo".to_string()),
        };

        let json = serde_json::to_string(&msg).unwrap();

        assert!(json.contains("tool_call_id"));
        assert!(json.contains("call_123"));
        assert!(json.contains(r#""name":"echo""#));
    }

    #[test]
    fn test_multiple_tool_calls_conversion() {
        let tc1 = ToolCall::new("call_1", "tool_a", r#"{"arg": "a"}"#);
        let tc2 = ToolCall::new("call_2", "tool_b", r#"{"arg": "b"}"#);

        let messages = vec![Message::assistant_with_tools("Running both", vec![tc1, tc2])];
        let converted = convert_messages(messages);

        assert_eq!(converted.len(), 1);
        let tool_calls = converted[0].tool_calls.as_ref().unwrap();
        assert_eq!(tool_calls.len(), 2);
        assert_eq!(tool_calls[0].function.name, "tool_a");
        assert_eq!(tool_calls[1].function.name, "tool_b");
    }
}
