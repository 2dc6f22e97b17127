//! Transcript types for papermule
//!
//! This module defines the core types for conversation history: messages,
//! roles, tool-call requests, and the transcript container itself.

use serde::{Deserialize, Serialize};

use crate::error::{MuleError, Result};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompts and instructions
    System,
    /// Messages from the user
    User,
    /// Messages from the model
    Assistant,
    /// Results from tool executions
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A tool call requested by the model.
///
/// The `id` is unique within the assistant message that carried the request;
/// the matching tool-result message echoes it back via `tool_call_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier for this call, assigned by the provider
    pub id: String,
    /// Name of the tool to call
    pub name: String,
    /// JSON-encoded arguments for the tool
    pub arguments: String,
}

impl ToolCall {
    /// Create a new tool call.
    ///
    /// # Example
    /// ```
    /// use papermule::transcript::ToolCall;
    ///
    /// let call = ToolCall::new("call_123", "arxiv_search", r#"{"query": "agents"}"#);
    /// assert_eq!(call.name, "arxiv_search");
    /// ```
    pub fn new(id: &str, name: &str, arguments: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    /// Parse the arguments as a specific type.
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.arguments)
    }
}

/// A single message in a conversation.
///
/// Messages come from the user, the model, the system prompt, or tool
/// executions. Once appended to a [`Transcript`] a message is never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: Role,
    /// The text content of the message (may be empty)
    pub content: String,
    /// Tool calls requested by the model (assistant messages only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// ID of the tool call this message answers (tool-result messages only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Registered name of the tool that produced this result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    /// Create a new user message.
    ///
    /// # Example
    /// ```
    /// use papermule::transcript::{Message, Role};
    ///
    /// let msg = Message::user("Survey recent agent evaluation papers.");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create a new system message.
    pub fn system(content: &str) -> Self {
        Self {
            role: Role::System,
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create an assistant message carrying tool-call requests.
    ///
    /// # Example
    /// ```
    /// use papermule::transcript::{Message, ToolCall};
    ///
    /// let call = ToolCall::new("call_1", "echo", r#"{"message": "hi"}"#);
    /// let msg = Message::assistant_with_tools("Let me check.", vec![call]);
    /// assert!(msg.has_tool_calls());
    /// ```
    pub fn assistant_with_tools(content: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create a tool-result message answering one tool-call request.
    ///
    /// Carries both the originating call id and the tool's registered name,
    /// so a reader (and the provider) can pair results with requests.
    ///
    /// # Example
    /// ```
    /// use papermule::transcript::{Message, Role};
    ///
    /// let msg = Message::tool_result("call_123", "echo", "hi");
    /// assert_eq!(msg.role, Role::Tool);
    /// assert_eq!(msg.tool_call_id.as_deref(), Some("call_123"));
    /// assert_eq!(msg.tool_name.as_deref(), Some("echo"));
    /// ```
    pub fn tool_result(tool_call_id: &str, tool_name: &str, content: &str) -> Self {
        Self {
            role: Role::Tool,
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.to_string()),
            tool_name: Some(tool_name.to_string()),
        }
    }

    /// Check if this message carries tool-call requests.
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls
            .as_ref()
            .map(|tc| !tc.is_empty())
            .unwrap_or(false)
    }

    /// Check if this is a tool-result message.
    pub fn is_tool_result(&self) -> bool {
        self.role == Role::Tool && self.tool_call_id.is_some()
    }
}

/// The ordered history of one conversation.
///
/// Append-only by construction: messages can be pushed and read, never
/// replaced or removed. One loop run owns its transcript exclusively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create a new empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript opening with a system prompt and a user request.
    ///
    /// This is the shape the tool loop expects as input.
    ///
    /// # Example
    /// ```
    /// use papermule::transcript::Transcript;
    ///
    /// let t = Transcript::opening("You are a research assistant.", "Find papers on RAG.");
    /// assert_eq!(t.len(), 2);
    /// assert!(t.validate_opening().is_ok());
    /// ```
    pub fn opening(system_prompt: &str, user_request: &str) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(user_request)],
        }
    }

    /// Append a message. Appending is the only mutation a transcript allows.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The messages in chronological order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Clone the messages out for a provider call.
    pub fn to_messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Validate the opening contract: a system message first, followed by at
    /// least one user message.
    ///
    /// The tool loop refuses to run on transcripts that violate this.
    pub fn validate_opening(&self) -> Result<()> {
        match self.messages.first() {
            None => {
                return Err(MuleError::Transcript(
                    "transcript is empty; expected a system message followed by a user message"
                        .to_string(),
                ))
            }
            Some(first) if first.role != Role::System => {
                return Err(MuleError::Transcript(format!(
                    "transcript must open with a system message, found {}",
                    first.role
                )))
            }
            Some(_) => {}
        }

        if !self.messages.iter().skip(1).any(|m| m.role == Role::User) {
            return Err(MuleError::Transcript(
                "transcript must contain at least one user message after the system prompt"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
