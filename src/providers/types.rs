//! Provider types for papermule
//!
//! This module defines the core types and traits for completion providers:
//! the `CompletionProvider` trait, chat options, and the completion type the
//! tool loop consumes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tools::ToolSpec;
use crate::transcript::{Message, ToolCall};

/// Trait for completion providers (OpenAI-compatible endpoints, test doubles).
///
/// Implement this trait to plug in a new provider. The provider translates
/// between papermule's message format and its own wire format, and owns its
/// transport-level concerns (timeouts, retry lives in [`RetryProvider`]).
///
/// Providers are constructed once at startup and passed explicitly to the
/// loop and pipeline; there is no module-level client or global registry.
///
/// [`RetryProvider`]: crate::providers::RetryProvider
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request the next assistant turn for a conversation.
    ///
    /// # Arguments
    /// * `messages` - The conversation history
    /// * `tools` - Tool specs the model may call; tool choice is automatic
    ///   whenever this is non-empty
    /// * `model` - Optional model override (provider default if None)
    /// * `options` - Sampling options (temperature, max_tokens, ...)
    ///
    /// # Returns
    /// The model's reply, which may carry text content and/or tool calls.
    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolSpec>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<Completion>;

    /// The default model for this provider.
    fn default_model(&self) -> &str;

    /// The provider name (e.g. "openai").
    fn name(&self) -> &str;
}

/// Options for completion requests. Builder-style.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling
    pub temperature: Option<f32>,
    /// Nucleus sampling parameter
    pub top_p: Option<f32>,
    /// Stop sequences that halt generation
    pub stop: Option<Vec<String>>,
}

impl ChatOptions {
    /// Create new default chat options.
    ///
    /// # Example
    /// ```
    /// use papermule::providers::ChatOptions;
    ///
    /// let options = ChatOptions::new();
    /// assert!(options.max_tokens.is_none());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    ///
    /// # Example
    /// ```
    /// use papermule::providers::ChatOptions;
    ///
    /// let options = ChatOptions::new().with_temperature(0.3);
    /// assert_eq!(options.temperature, Some(0.3));
    /// ```
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the top_p (nucleus sampling) parameter.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set stop sequences that will halt generation.
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }
}

/// One assistant turn returned by a completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Text content of the reply (empty when the model only calls tools)
    pub content: String,
    /// Tool calls requested by the model, in provider order
    pub tool_calls: Vec<ToolCall>,
    /// Token usage information, when the provider reports it
    pub usage: Option<Usage>,
}

impl Completion {
    /// Create a plain text completion with no tool calls.
    ///
    /// # Example
    /// ```
    /// use papermule::providers::Completion;
    ///
    /// let c = Completion::text("done: hi");
    /// assert!(!c.has_tool_calls());
    /// ```
    pub fn text(content: &str) -> Self {
        Self {
            content: content.to_string(),
            tool_calls: vec![],
            usage: None,
        }
    }

    /// Create a completion carrying tool calls.
    ///
    /// # Example
    /// ```
    /// use papermule::providers::Completion;
    /// use papermule::transcript::ToolCall;
    ///
    /// let call = ToolCall::new("call_1", "echo", r#"{"x": "hi"}"#);
    /// let c = Completion::with_tools("", vec![call]);
    /// assert!(c.has_tool_calls());
    /// ```
    pub fn with_tools(content: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.to_string(),
            tool_calls,
            usage: None,
        }
    }

    /// Check whether the model requested any tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Attach usage information.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Convert this completion into the assistant [`Message`] to append.
    pub fn into_message(self) -> Message {
        if self.tool_calls.is_empty() {
            Message::assistant(&self.content)
        } else {
            Message::assistant_with_tools(&self.content, self.tool_calls)
        }
    }
}

/// Token usage reported for one completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used (prompt + completion)
    pub total_tokens: u32,
}

impl Usage {
    /// Create new usage information.
    ///
    /// # Example
    /// ```
    /// use papermule::providers::Usage;
    ///
    /// let usage = Usage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}
