//! Tools module - tool definitions and execution for model function calling
//!
//! This module provides the infrastructure for defining the tools the model
//! can call during a loop run, plus the built-in research tools.
//!
//! # Overview
//!
//! - `Tool` trait: the interface all tools implement
//! - `ToolContext`: execution context (workspace directory)
//! - `ToolRegistry`: name-to-capability mapping the loop resolves against
//! - `ToolSpec`: the definition shipped to the completion provider
//!
//! # Built-in Tools
//!
//! - `EchoTool`: echo tool for tests and diagnostics
//! - `CurrentTimeTool`: current local time
//! - `WeatherTool`: weather at the machine's IP-derived location
//! - `WriteNoteTool`: write a text note under the workspace
//! - `ArxivSearchTool`: search arXiv for papers
//! - `WikipediaTool`: encyclopedic summaries
//!
//! # Example
//!
//! ```rust
//! use papermule::tools::{EchoTool, Tool, ToolContext, ToolRegistry};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let mut registry = ToolRegistry::new();
//! registry.register(Box::new(EchoTool));
//!
//! let tool = registry.get("echo").unwrap();
//! let result = tool.invoke(json!({"message": "Hello!"}), &ToolContext::new()).await;
//! assert_eq!(result.unwrap(), "Hello!");
//!
//! let specs = registry.specs();
//! assert_eq!(specs.len(), 1);
//! # });
//! ```

pub mod arxiv;
pub mod clock;
pub mod notes;
mod registry;
mod types;
pub mod weather;
pub mod wikipedia;

pub use arxiv::ArxivSearchTool;
pub use clock::CurrentTimeTool;
pub use notes::WriteNoteTool;
pub use registry::ToolRegistry;
pub use types::{Tool, ToolContext, ToolSpec};
pub use weather::WeatherTool;
pub use wikipedia::WikipediaTool;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A simple echo tool for testing purposes.
///
/// Echoes back any message provided to it. Useful for exercising the tool
/// infrastructure without network access.
///
/// # Example
///
/// ```rust
/// use papermule::tools::{EchoTool, Tool, ToolContext};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let tool = EchoTool;
/// let result = tool.invoke(json!({"message": "Hello"}), &ToolContext::new()).await;
/// assert_eq!(result.unwrap(), "Hello");
/// # });
/// ```
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes back the provided message"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The message to echo"
                }
            },
            "required": ["message"]
        })
    }

    async fn invoke(&self, args: Value, _ctx: &ToolContext) -> Result<String> {
        let message = args
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("(no message)");
        Ok(message.to_string())
    }
}

/// Build a registry with the full built-in research toolset.
///
/// The echo tool is not included; register it separately when diagnosing
/// loop behavior.
pub fn research_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ArxivSearchTool::new()));
    registry.register(Box::new(WikipediaTool::new()));
    registry.register(Box::new(WeatherTool::new()));
    registry.register(Box::new(CurrentTimeTool));
    registry.register(Box::new(WriteNoteTool));
    registry
}
