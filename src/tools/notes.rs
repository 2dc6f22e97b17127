//! Note-writing tool.
//!
//! Writes a text note under the workspace output directory and returns the
//! path. The file name must be a bare `.txt` name; anything that could
//! escape the workspace is rejected.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::error::{MuleError, Result};

use super::{Tool, ToolContext};

/// Subdirectory of the workspace that receives notes.
const OUTPUT_DIR: &str = "output";

/// Tool that writes a string into a `.txt` file (overwrites if it exists).
pub struct WriteNoteTool;

impl WriteNoteTool {
    /// Validate a note file name and resolve it under the workspace.
    fn resolve(workspace: &str, file_name: &str) -> Result<PathBuf> {
        if file_name.is_empty() {
            return Err(MuleError::Tool("note file name is empty".to_string()));
        }
        if file_name.contains('/') || file_name.contains('\\') || file_name.contains("..") {
            return Err(MuleError::Tool(format!(
                "note file name must not contain path separators: {}",
                file_name
            )));
        }
        if !file_name.ends_with(".txt") {
            return Err(MuleError::Tool(format!(
                "note file name must end with .txt: {}",
                file_name
            )));
        }
        Ok(Path::new(workspace).join(OUTPUT_DIR).join(file_name))
    }
}

#[async_trait]
impl Tool for WriteNoteTool {
    fn name(&self) -> &str {
        "write_note"
    }

    fn description(&self) -> &str {
        "Write a text note into a .txt file under the workspace output directory (overwrites if it exists)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_name": {
                    "type": "string",
                    "description": "Name of the output file, with .txt extension"
                },
                "content": {
                    "type": "string",
                    "description": "Text to write"
                }
            },
            "required": ["file_name", "content"]
        })
    }

    async fn invoke(&self, args: Value, ctx: &ToolContext) -> Result<String> {
        let file_name = args
            .get("file_name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MuleError::Tool("missing required argument: file_name".to_string()))?;
        let content = args
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MuleError::Tool("missing required argument: content".to_string()))?;

        let workspace = ctx.workspace.as_deref().unwrap_or(".");
        let path = Self::resolve(workspace, file_name)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;

        let path_str = path.to_string_lossy().to_string();
        info!(path = %path_str, bytes = content.len(), "Note written");
        Ok(path_str)
    }
}
