//! Configuration type definitions for papermule
//!
//! All types implement serde traits for JSON serialization and have
//! sensible defaults, so a missing or partial config file still works.

use serde::{Deserialize, Serialize};

/// Main configuration struct for papermule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Agent defaults (model, turn budget, sampling)
    pub agent: AgentDefaults,
    /// Completion provider configuration
    pub provider: ProviderConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Source evaluation configuration
    pub eval: EvalConfig,
}

/// Agent defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDefaults {
    /// Model identifier passed to the provider
    pub model: String,
    /// Bound on provider round-trips per loop run
    pub max_turns: usize,
    /// Maximum tokens per completion
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Workspace directory for tool output ("~" expands to home)
    pub workspace: String,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_turns: 5,
            max_tokens: 4096,
            temperature: 1.0,
            workspace: "~/.papermule/workspace".to_string(),
        }
    }
}

/// Completion provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key; falls back to the OPENAI_API_KEY environment variable
    pub api_key: Option<String>,
    /// Base URL override for OpenAI-compatible endpoints
    pub api_base: Option<String>,
    /// Retry policy for transient provider errors
    pub retry: RetryConfig,
}

/// Retry policy for transient provider errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum retry attempts before giving up
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact human-readable text
    Compact,
    /// Structured JSON lines for log aggregators
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Default level filter when RUST_LOG is unset
    pub level: String,
    /// Optional log file path (stderr when unset)
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Source evaluation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Minimum preferred-domain ratio required to pass
    pub min_ratio: f64,
    /// Domains added to the built-in preferred list
    pub extra_domains: Vec<String>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            min_ratio: crate::eval::DEFAULT_MIN_RATIO,
            extra_domains: Vec::new(),
        }
    }
}
