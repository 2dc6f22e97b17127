//! Providers module - completion providers for the tool loop
//!
//! This module defines the `CompletionProvider` trait and common types for
//! talking to chat-completion endpoints. The bundled [`OpenAiProvider`]
//! speaks the OpenAI Chat Completions wire format, which also covers
//! OpenAI-compatible gateways via a custom base URL.
//!
//! Transient-failure retry is a provider-layer concern: wrap any provider in
//! [`RetryProvider`] to get exponential backoff on 429/5xx/timeouts. The
//! tool loop itself never retries.
//!
//! # Example
//!
//! ```rust,ignore
//! use papermule::providers::{ChatOptions, CompletionProvider, OpenAiProvider, RetryProvider};
//! use papermule::transcript::Message;
//!
//! async fn example() {
//!     let inner = OpenAiProvider::new("sk-xxx");
//!     let provider = RetryProvider::new(Box::new(inner)).with_max_retries(5);
//!
//!     let messages = vec![Message::system("You are helpful."), Message::user("Hi!")];
//!     let reply = provider
//!         .complete(messages, vec![], None, ChatOptions::new())
//!         .await
//!         .unwrap();
//!     println!("{}", reply.content);
//! }
//! ```

pub mod openai;
pub mod retry;
mod types;

pub use openai::OpenAiProvider;
pub use retry::RetryProvider;
pub use types::{ChatOptions, Completion, CompletionProvider, Usage};

use crate::error::ProviderError;

/// Map an HTTP status code and response body to a structured [`ProviderError`].
///
/// Centralizes the status-to-classification mapping so every HTTP-backed
/// provider produces consistent typed errors.
pub fn classify_http_error(status: u16, body: &str) -> ProviderError {
    match status {
        401 => ProviderError::Auth(body.to_string()),
        402 => ProviderError::Billing(body.to_string()),
        404 => ProviderError::ModelNotFound(body.to_string()),
        429 => ProviderError::RateLimit(body.to_string()),
        400 => ProviderError::InvalidRequest(body.to_string()),
        500..=599 => ProviderError::ServerError(body.to_string()),
        _ => ProviderError::Unknown(format!("HTTP {}: {}", status, body)),
    }
}
