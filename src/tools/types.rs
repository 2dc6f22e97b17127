//! Tool types for papermule
//!
//! Defines the `Tool` trait all tools implement, the `ToolContext` passed to
//! executions, and the `ToolSpec` shipped to completion providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Specification of a tool as advertised to the completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The name of the tool (unique within a registry)
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema describing the tool's parameters
    pub parameters: Value,
}

impl ToolSpec {
    /// Create a new tool spec.
    ///
    /// # Example
    /// ```
    /// use papermule::tools::ToolSpec;
    /// use serde_json::json;
    ///
    /// let spec = ToolSpec::new(
    ///     "arxiv_search",
    ///     "Search arXiv for papers",
    ///     json!({
    ///         "type": "object",
    ///         "properties": {
    ///             "query": { "type": "string", "description": "Search query" }
    ///         },
    ///         "required": ["query"]
    ///     }),
    /// );
    /// assert_eq!(spec.name, "arxiv_search");
    /// ```
    pub fn new(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

/// Trait that all tools must implement.
///
/// Tools are capabilities the model can call during a loop run: searching
/// arXiv, looking up Wikipedia, writing a note. A tool returns its result as
/// text ready to be placed into a tool message, or an error that the loop
/// captures into a failure payload (a failing tool never aborts the run).
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use papermule::tools::{Tool, ToolContext};
/// use papermule::error::Result;
///
/// struct MyTool;
///
/// #[async_trait]
/// impl Tool for MyTool {
///     fn name(&self) -> &str { "my_tool" }
///     fn description(&self) -> &str { "Does something useful" }
///     fn parameters(&self) -> Value {
///         serde_json::json!({
///             "type": "object",
///             "properties": {},
///             "required": []
///         })
///     }
///     async fn invoke(&self, _args: Value, _ctx: &ToolContext) -> Result<String> {
///         Ok("Done!".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool name. Used by the model to request this tool; must be
    /// unique within a registry.
    fn name(&self) -> &str;

    /// The tool description, sent to the model so it knows when and how
    /// to use the tool.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters.
    fn parameters(&self) -> Value;

    /// Invoke the tool with the given arguments.
    ///
    /// # Arguments
    /// * `args` - The JSON object the model passed
    /// * `ctx` - The execution context (workspace, ...)
    ///
    /// # Returns
    /// The serialized result text, or an error to be captured by the loop.
    async fn invoke(&self, args: Value, ctx: &ToolContext) -> Result<String>;
}

/// Context provided to tools during execution.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// The workspace directory for file-writing tools
    pub workspace: Option<String>,
}

impl ToolContext {
    /// Create a new empty tool context.
    ///
    /// # Example
    /// ```
    /// use papermule::tools::ToolContext;
    ///
    /// let ctx = ToolContext::new();
    /// assert!(ctx.workspace.is_none());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the workspace directory.
    ///
    /// # Example
    /// ```
    /// use papermule::tools::ToolContext;
    ///
    /// let ctx = ToolContext::new().with_workspace("/home/user/reports");
    /// assert_eq!(ctx.workspace.as_deref(), Some("/home/user/reports"));
    /// ```
    pub fn with_workspace(mut self, workspace: &str) -> Self {
        self.workspace = Some(workspace.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_context_new() {
        let ctx = ToolContext::new();
        assert!(ctx.workspace.is_none());
    }

    #[test]
    fn test_tool_context_with_workspace() {
        let ctx = ToolContext::new().with_workspace("/home/user/reports");
        assert_eq!(ctx.workspace.as_deref(), Some("/home/user/reports"));
    }

    #[test]
    fn test_tool_context_clone() {
        let ctx1 = ToolContext::new().with_workspace("/test");
        let ctx2 = ctx1.clone();
        assert_eq!(ctx1.workspace, ctx2.workspace);
    }

    #[test]
    fn test_tool_spec_new() {
        let spec = ToolSpec::new(
            "wikipedia_search",
            "Look up an encyclopedic summary",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string" }
                },
                "required": ["title"]
            }),
        );

        assert_eq!(spec.name, "wikipedia_search");
        assert_eq!(spec.description, "Look up an encyclopedic summary");
        assert!(spec.parameters.is_object());
    }

    #[test]
    fn test_tool_spec_serialization() {
        let spec = ToolSpec::new("echo", "Echo a message", serde_json::json!({"type": "object"}));

        let json = serde_json::to_string(&spec).unwrap();
        let parsed: ToolSpec = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.name, "echo");
        assert_eq!(parsed.description, "Echo a message");
    }
}
