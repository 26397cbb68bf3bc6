//! # TroGiang Providers
//!
//! Embedding and answer adapters for the teaching assistant.
//!
//! Every supported backend (OpenAI, Gemini, Ollama, DeepSeek, Groq, llama.cpp,
//! OpenRouter, custom endpoints) speaks the OpenAI wire format, so a single
//! pair of adapters covers them; providers differ only by endpoint URL,
//! auth style and API key.

pub mod openai_compatible;
pub mod prompt;
pub mod provider_registry;
pub mod response;

use std::sync::Arc;
use trogiang_core::config::{EmbeddingConfig, LlmConfig};
use trogiang_core::error::{Result, TroGiangError};
use trogiang_core::traits::{AnswerProvider, EmbeddingProvider};

use openai_compatible::{Endpoint, OpenAiCompatibleAnswerer, OpenAiCompatibleEmbedder};

pub use prompt::NOT_FOUND_SENTINEL;

use provider_registry::ProviderConfig;

const CUSTOM_CHAT_PATH: &str = "/chat/completions";
const CUSTOM_EMBEDDINGS_PATH: &str = "/embeddings";

/// Resolve an endpoint from a provider name, or `custom:<url>`.
///
/// Returns the registry entry too; it is `None` for custom endpoints.
fn resolve_endpoint(
    provider: &str,
    api_key: &str,
    endpoint: &str,
    timeout_secs: u64,
) -> Result<(Endpoint, Option<&'static ProviderConfig>)> {
    if provider.starts_with("custom:") {
        return Ok((Endpoint::custom(provider, api_key, timeout_secs)?, None));
    }
    let registry = provider_registry::get_provider_config(provider)
        .ok_or_else(|| TroGiangError::ProviderNotFound(provider.into()))?;
    let endpoint = Endpoint::from_registry(registry, api_key, endpoint, timeout_secs)?;
    Ok((endpoint, Some(registry)))
}

/// Configured model, or the provider's suggestion when left empty.
fn pick_model(configured: &str, suggested: Option<&str>, provider: &str) -> Result<String> {
    if !configured.trim().is_empty() {
        return Ok(configured.trim().to_string());
    }
    suggested
        .map(String::from)
        .ok_or_else(|| TroGiangError::Config(format!("no model configured for '{provider}'")))
}

/// Create the embedding provider described by `config`.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let (endpoint, registry) = resolve_endpoint(
        &config.provider,
        &config.api_key,
        &config.endpoint,
        config.timeout_secs,
    )?;
    let (path, suggested) = match registry {
        None => (CUSTOM_EMBEDDINGS_PATH, None),
        Some(r) => {
            let path = r.embeddings_path.ok_or_else(|| {
                TroGiangError::Config(format!(
                    "provider '{}' has no embeddings endpoint",
                    config.provider
                ))
            })?;
            (path, r.default_embedding_model)
        }
    };
    let model = pick_model(&config.model, suggested, &config.provider)?;
    tracing::debug!("Embedding via {} ({model})", endpoint.name());
    Ok(Arc::new(OpenAiCompatibleEmbedder::new(
        endpoint,
        path,
        &model,
        config.batch_size,
    )))
}

/// Create the answer provider described by `config`.
pub fn create_answerer(config: &LlmConfig) -> Result<Arc<dyn AnswerProvider>> {
    let (endpoint, registry) = resolve_endpoint(
        &config.provider,
        &config.api_key,
        &config.endpoint,
        config.timeout_secs,
    )?;
    let (path, suggested) = match registry {
        None => (CUSTOM_CHAT_PATH, None),
        Some(r) => (r.chat_path, Some(r.default_chat_model)),
    };
    let model = pick_model(&config.model, suggested, &config.provider)?;
    tracing::debug!("Answering via {} ({model})", endpoint.name());
    Ok(Arc::new(OpenAiCompatibleAnswerer::new(
        endpoint,
        path,
        &model,
        config.temperature,
        config.max_tokens,
    )))
}

/// List all available provider names.
pub fn available_providers() -> Vec<&'static str> {
    let mut names = provider_registry::all_provider_names();
    names.push("custom");
    names
}
