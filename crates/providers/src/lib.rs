//! Chat model backends for repokeep.
//!
//! One provider implementation covers every OpenAI-compatible endpoint
//! (OpenAI, OpenRouter, Ollama, vLLM, custom proxies). Each agent run
//! binds exactly one provider; tests substitute a scripted stand-in via
//! the `Provider` trait instead of anything in this crate.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use repokeep_config::AppConfig;
use repokeep_core::error::{Error, ProviderError};
use repokeep_core::Provider;
use std::sync::Arc;

/// Build the provider named by the config.
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, Error> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| ProviderError::NotConfigured("no API key available".into()))?;

    let provider: Arc<dyn Provider> = match (config.provider.as_str(), &config.base_url) {
        (_, Some(url)) => Arc::new(OpenAiCompatProvider::new("custom", url, api_key)),
        ("openrouter", None) => Arc::new(OpenAiCompatProvider::openrouter(api_key)),
        ("openai", None) => Arc::new(OpenAiCompatProvider::openai(api_key)),
        ("ollama", None) => Arc::new(OpenAiCompatProvider::ollama(None)),
        (other, None) => {
            return Err(ProviderError::NotConfigured(format!("unknown provider '{other}'")).into())
        }
    };
    Ok(provider)
}
