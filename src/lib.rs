//! papermule - research-report assistant driven by a bounded tool-calling loop

pub mod agent;
pub mod config;
pub mod error;
pub mod eval;
pub mod providers;
pub mod report;
pub mod tools;
pub mod transcript;
pub mod utils;

pub use agent::{ContextBuilder, LoopOutcome, LoopRun, ToolCallLoop};
pub use config::Config;
pub use error::{MuleError, Result};
pub use providers::{
    ChatOptions, Completion, CompletionProvider, OpenAiProvider, RetryProvider, Usage,
};
pub use tools::{Tool, ToolContext, ToolRegistry, ToolSpec};
pub use transcript::{Message, Role, ToolCall, Transcript};
