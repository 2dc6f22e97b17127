//! Conversation transcript types.
//!
//! A [`Transcript`] is the ordered, append-only history of one tool-calling
//! conversation: system prompt, user request, assistant turns (possibly
//! carrying tool-call requests) and tool results. It lives for exactly one
//! loop run and is handed back to the caller when the run finishes.

mod types;

pub use types::{Message, Role, ToolCall, Transcript};
