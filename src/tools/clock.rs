//! Clock tool.
//!
//! Returns the current local time. Useful for letting the model timestamp
//! notes and reports.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;

use super::{Tool, ToolContext};

/// Tool returning the current local time as `HH:MM:SS`.
pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Returns the current local time as a string"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn invoke(&self, _args: Value, _ctx: &ToolContext) -> Result<String> {
        Ok(chrono::Local::now().format("%H:%M:%S").to_string())
    }
}
