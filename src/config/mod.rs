//! Configuration management for papermule
//!
//! Configuration is loaded from `~/.papermule/config.json` with
//! `PAPERMULE_*` environment variable overrides. There is no global config
//! instance: `Config::load()` returns a value the caller passes around
//! explicitly.

mod types;

pub use types::*;

use std::path::{Path, PathBuf};

use crate::error::{MuleError, Result};

impl Config {
    /// The papermule configuration directory (~/.papermule).
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".papermule")
    }

    /// The path to the config file (~/.papermule/config.json).
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// A missing config file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Write this configuration as pretty JSON to a specific path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Variables follow the pattern `PAPERMULE_SECTION_KEY`.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PAPERMULE_AGENT_MODEL") {
            self.agent.model = val;
        }
        if let Ok(val) = std::env::var("PAPERMULE_AGENT_MAX_TURNS") {
            if let Ok(v) = val.parse() {
                self.agent.max_turns = v;
            }
        }
        if let Ok(val) = std::env::var("PAPERMULE_AGENT_MAX_TOKENS") {
            if let Ok(v) = val.parse() {
                self.agent.max_tokens = v;
            }
        }
        if let Ok(val) = std::env::var("PAPERMULE_AGENT_TEMPERATURE") {
            if let Ok(v) = val.parse() {
                self.agent.temperature = v;
            }
        }
        if let Ok(val) = std::env::var("PAPERMULE_AGENT_WORKSPACE") {
            self.agent.workspace = val;
        }

        if let Ok(val) = std::env::var("PAPERMULE_PROVIDER_API_KEY") {
            self.provider.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("PAPERMULE_PROVIDER_API_BASE") {
            self.provider.api_base = Some(val);
        }

        if let Ok(val) = std::env::var("PAPERMULE_LOGGING_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Resolve the provider API key: config first, then OPENAI_API_KEY.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(ref key) = self.provider.api_key {
            if !key.is_empty() {
                return Ok(key.clone());
            }
        }
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(MuleError::Config(
                "no API key configured; set provider.api_key or OPENAI_API_KEY".to_string(),
            )),
        }
    }

    /// The workspace directory with `~` expanded to the home directory.
    pub fn workspace_path(&self) -> PathBuf {
        let ws = &self.agent.workspace;
        if let Some(rest) = ws.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(ws)
    }
}
