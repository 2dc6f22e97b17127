//! Context builder for loop conversations
//!
//! Provides the `ContextBuilder` for constructing the opening transcript of
//! a loop run: the system prompt (optionally listing the available tools)
//! followed by the user's request.

use crate::transcript::{Message, Transcript};

/// Default system prompt for papermule runs.
const DEFAULT_SYSTEM_PROMPT: &str = r#"You are papermule, a research assistant.

You have access to tools to help accomplish tasks. Use them when needed.

Be concise but accurate. Cite sources with full URLs whenever relevant."#;

/// Builder for the opening transcript of a loop run.
///
/// # Example
///
/// ```rust
/// use papermule::agent::ContextBuilder;
///
/// let builder = ContextBuilder::new()
///     .with_tool_names(vec!["arxiv_search".to_string()]);
///
/// let transcript = builder.build_opening("Survey agent evaluation methods.");
/// assert_eq!(transcript.len(), 2);
/// assert!(transcript.validate_opening().is_ok());
/// ```
pub struct ContextBuilder {
    /// The system prompt to use
    system_prompt: String,
    /// Names of the available tools, rendered into the system prompt
    tool_names: Vec<String>,
}

impl ContextBuilder {
    /// Create a new context builder with the default system prompt.
    ///
    /// # Example
    /// ```rust
    /// use papermule::agent::ContextBuilder;
    ///
    /// let builder = ContextBuilder::new();
    /// let system = builder.build_system_message();
    /// assert!(system.content.contains("papermule"));
    /// ```
    pub fn new() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            tool_names: Vec::new(),
        }
    }

    /// Set a custom system prompt.
    ///
    /// # Example
    /// ```rust
    /// use papermule::agent::ContextBuilder;
    ///
    /// let builder = ContextBuilder::new()
    ///     .with_system_prompt("You are a careful editor.");
    /// assert_eq!(builder.system_prompt(), "You are a careful editor.");
    /// ```
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// List the available tools in the system prompt.
    ///
    /// An empty list adds nothing.
    pub fn with_tool_names(mut self, tools: Vec<String>) -> Self {
        self.tool_names = tools;
        self
    }

    /// Build the system message with all configured content.
    pub fn build_system_message(&self) -> Message {
        let mut content = self.system_prompt.clone();
        if !self.tool_names.is_empty() {
            content.push_str("\n\n## Available Tools\n\n");
            content.push_str(&self.tool_names.join(", "));
        }
        Message::system(&content)
    }

    /// Build the opening transcript for a loop run: system prompt plus the
    /// user's request.
    pub fn build_opening(&self, user_request: &str) -> Transcript {
        let mut transcript = Transcript::new();
        transcript.push(self.build_system_message());
        transcript.push(Message::user(user_request));
        transcript
    }

    /// Get the current system prompt.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
