//! Agent module - the tool-calling conversation loop
//!
//! This module provides the core loop and context building for papermule.
//! The loop is responsible for:
//!
//! - Sending the transcript to a completion provider, once per turn
//! - Dispatching the tool calls the model requests, in order
//! - Feeding tool results back into the transcript
//! - Terminating on a final answer or an explicit turn-budget signal
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐     ┌──────────────┐     ┌────────────────────┐
//! │ ContextBuilder │────>│ ToolCallLoop │────>│ CompletionProvider │
//! │ (opening msgs) │     │              │     │ (OpenAI-compatible)│
//! └────────────────┘     └──────────────┘     └────────────────────┘
//!                               │
//!                               ▼
//!                        ┌──────────────┐
//!                        │ ToolRegistry │
//!                        │ (arXiv, ...) │
//!                        └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use papermule::agent::{ContextBuilder, ToolCallLoop};
//! use papermule::providers::OpenAiProvider;
//! use papermule::tools::research_registry;
//!
//! async fn run() {
//!     let provider = OpenAiProvider::new("your-api-key");
//!     let registry = research_registry();
//!     let transcript = ContextBuilder::new().build_opening("Survey RAG papers.");
//!
//!     let run = ToolCallLoop::new()
//!         .with_max_turns(3)
//!         .run(&provider, &registry, transcript)
//!         .await
//!         .unwrap();
//!     println!("{}", run.outcome.content());
//! }
//! ```

mod context;
mod r#loop;

pub use context::ContextBuilder;
pub use r#loop::{LoopOutcome, LoopRun, ToolCallLoop, ToolFailure, DEFAULT_MAX_TURNS};
