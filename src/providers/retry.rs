//! Retry provider - decorator that adds automatic retry with exponential backoff.
//!
//! Wraps any [`CompletionProvider`] to transparently retry transient errors
//! such as HTTP 429 (rate limit), 5xx (server errors), and overload
//! conditions. This keeps retry policy out of the tool loop: the loop sees
//! either a completion or a final, non-transient error.
//!
//! # Example
//!
//! ```rust,ignore
//! use papermule::providers::{OpenAiProvider, RetryProvider};
//!
//! let inner = OpenAiProvider::new("api-key");
//! let provider = RetryProvider::new(Box::new(inner))
//!     .with_max_retries(5)
//!     .with_base_delay_ms(500);
//! ```

use async_trait::async_trait;
use tracing::warn;

use crate::error::{MuleError, Result};
use crate::tools::ToolSpec;
use crate::transcript::Message;

use super::{ChatOptions, Completion, CompletionProvider};

/// Patterns in untyped error messages that indicate a transient failure.
const RETRYABLE_PATTERNS: &[&str] = &[
    "429",
    "500",
    "502",
    "503",
    "504",
    "rate limit",
    "rate_limit",
    "overloaded",
    "too many requests",
    "server error",
    "internal server error",
    "bad gateway",
    "service unavailable",
    "gateway timeout",
];

/// A decorator provider that retries transient errors with exponential backoff.
///
/// Non-transient errors (400, 401, 403, 404) are returned immediately.
pub struct RetryProvider {
    /// The wrapped provider that performs actual requests.
    inner: Box<dyn CompletionProvider>,
    /// Maximum number of retry attempts before giving up. Default: 3.
    max_retries: u32,
    /// Base delay in milliseconds for exponential backoff. Default: 1000.
    base_delay_ms: u64,
    /// Maximum delay cap in milliseconds. Default: 30000.
    max_delay_ms: u64,
}

impl std::fmt::Debug for RetryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryProvider")
            .field("inner", &self.inner.name())
            .field("max_retries", &self.max_retries)
            .field("base_delay_ms", &self.base_delay_ms)
            .field("max_delay_ms", &self.max_delay_ms)
            .finish()
    }
}

impl RetryProvider {
    /// Create a new `RetryProvider` wrapping the given inner provider.
    ///
    /// Defaults: 3 retries, 1s base delay, 30s delay cap.
    pub fn new(inner: Box<dyn CompletionProvider>) -> Self {
        Self {
            inner,
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }

    /// Set the maximum number of retry attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay in milliseconds for exponential backoff.
    ///
    /// The actual delay for attempt `n` is:
    /// `min(base_delay_ms * 2^n + jitter, max_delay_ms)`
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set the maximum delay cap in milliseconds.
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }
}

/// Check whether a [`MuleError`] represents a transient failure worth retrying.
///
/// Typed [`ProviderError`](crate::error::ProviderError) values delegate to
/// [`is_retryable`](crate::error::ProviderError::is_retryable); untyped
/// `Provider(String)` errors fall back to substring matching.
pub fn is_retryable(err: &MuleError) -> bool {
    match err {
        MuleError::ProviderTyped(pe) => pe.is_retryable(),
        MuleError::Provider(_) => {
            let msg = err.to_string().to_lowercase();

            // Explicitly exclude non-retryable client errors
            let non_retryable = ["400", "401", "403", "404"];
            for pattern in &non_retryable {
                if msg.contains(pattern) {
                    return false;
                }
            }

            RETRYABLE_PATTERNS.iter().any(|p| msg.contains(p))
        }
        _ => false,
    }
}

/// Compute and sleep for the backoff delay for a given retry attempt.
///
/// Delay formula: `min(base_delay_ms * 2^attempt + jitter, max_delay_ms)`
///
/// Jitter is derived from the nanosecond component of the current system
/// time, which decorrelates concurrent retries without pulling in `rand`.
pub async fn delay_with_jitter(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) {
    let jitter_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64 % (base_delay_ms.max(1)))
        .unwrap_or(0);

    let delay = compute_delay(attempt, base_delay_ms, max_delay_ms, jitter_ms);

    tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
}

/// Compute the backoff delay for a given attempt (without sleeping).
pub fn compute_delay(attempt: u32, base_delay_ms: u64, max_delay_ms: u64, jitter_ms: u64) -> u64 {
    let exponential = base_delay_ms.saturating_mul(1u64 << attempt.min(16));
    exponential.saturating_add(jitter_ms).min(max_delay_ms)
}

#[async_trait]
impl CompletionProvider for RetryProvider {
    fn name(&self) -> &str {
        // Delegate to the inner provider; the wrapping is evident from the
        // type itself and the trait requires a borrowed &str.
        self.inner.name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolSpec>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<Completion> {
        let mut last_err: Option<MuleError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                if let Some(ref err) = last_err {
                    warn!(
                        provider = self.inner.name(),
                        attempt = attempt,
                        max_retries = self.max_retries,
                        error = %err,
                        "Retrying completion request after transient error"
                    );
                }
                delay_with_jitter(attempt - 1, self.base_delay_ms, self.max_delay_ms).await;
            }

            match self
                .inner
                .complete(messages.clone(), tools.clone(), model, options.clone())
                .await
            {
                Ok(completion) => return Ok(completion),
                Err(err) => {
                    if !is_retryable(&err) || attempt == self.max_retries {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
            }
        }

        // Unreachable: the loop always returns, but the compiler cannot
        // prove it. Provide a sensible fallback.
        Err(last_err
            .unwrap_or_else(|| MuleError::Provider("Retry loop exited without result".to_string())))
    }
}
