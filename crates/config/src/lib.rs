//! Configuration loading and validation for repokeep.
//!
//! Loads configuration from `~/.repokeep/config.toml` with environment
//! variable overrides. Validates settings before an agent run starts so a
//! missing API key fails fast with a clear message instead of mid-run.

use repokeep_core::error::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Environment variables consulted for the API key, in priority order.
const API_KEY_ENV_VARS: &[&str] = &["REPOKEEP_API_KEY", "OPENROUTER_API_KEY", "OPENAI_API_KEY"];

/// The root configuration structure.
///
/// Maps directly to `~/.repokeep/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the chat-completions endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider to use ("openrouter", "openai", or "custom")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Base URL override for custom OpenAI-compatible endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Default chat model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature; upgrade planning wants determinism
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Maximum model invocations per agent run before aborting
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_max_steps() -> u32 {
    25
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            base_url: None,
            default_model: default_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            max_steps: default_max_steps(),
        }
    }
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

impl AppConfig {
    /// The configuration directory (`~/.repokeep`).
    pub fn config_dir() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".repokeep")
    }

    /// Load config from disk and apply environment overrides.
    ///
    /// A missing config file is not an error — everything has a default
    /// except the API key, which `validate()` checks separately.
    pub fn load() -> Result<Self, Error> {
        let path = Self::config_dir().join("config.toml");
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|e| Error::Config {
                message: format!("failed to read {}: {e}", path.display()),
            })?;
            Self::from_toml_str(&raw)?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML document into a config.
    pub fn from_toml_str(raw: &str) -> Result<Self, Error> {
        toml::from_str(raw).map_err(|e| Error::Config {
            message: format!("invalid config: {e}"),
        })
    }

    /// Apply environment overrides via an injected lookup (tests pass a
    /// closure over a map instead of mutating the process environment).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for var in API_KEY_ENV_VARS {
            if let Some(key) = lookup(var) {
                if !key.is_empty() {
                    self.api_key = Some(key);
                    break;
                }
            }
        }
        if let Some(model) = lookup("REPOKEEP_MODEL") {
            if !model.is_empty() {
                self.default_model = model;
            }
        }
        if let Some(url) = lookup("REPOKEEP_BASE_URL") {
            if !url.is_empty() {
                self.base_url = Some(url);
            }
        }
    }

    /// Check that the config is usable for a run.
    pub fn validate(&self) -> Result<(), Error> {
        if self.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(Error::Config {
                message: format!(
                    "no API key configured; set one of {} or add api_key to {}",
                    API_KEY_ENV_VARS.join(", "),
                    Self::config_dir().join("config.toml").display()
                ),
            });
        }
        if self.max_steps == 0 {
            return Err(Error::Config {
                message: "max_steps must be at least 1".into(),
            });
        }
        Ok(())
    }
}
