//! Unified OpenAI-compatible embedding and answer adapters.
//!
//! Both adapters share an [`Endpoint`]: base URL, auth style, API key and an
//! HTTP client with a request timeout. A timed-out call surfaces as
//! `TroGiangError::Timeout` instead of hanging.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use trogiang_core::error::{Result, TroGiangError};
use trogiang_core::traits::{AnswerProvider, Embedding, EmbeddingProvider};

use crate::prompt::{NOT_FOUND_SENTINEL, build_messages};
use crate::provider_registry::{AuthStyle, ProviderConfig};
use crate::response::{parse_answer, parse_embeddings};

/// Connection details for one provider.
pub struct Endpoint {
    /// Provider name (e.g., "gemini", "ollama").
    name: String,
    api_key: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    base_url: String,
    auth_style: AuthStyle,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl Endpoint {
    /// Create from a known provider config.
    ///
    /// Resolution order:
    /// - API key: `api_key` argument > registry env vars > empty
    /// - Base URL: `endpoint` argument > env override > registry default
    pub fn from_registry(
        registry: &ProviderConfig,
        api_key: &str,
        endpoint: &str,
        timeout_secs: u64,
    ) -> Result<Self> {
        let api_key = if !api_key.is_empty() {
            api_key.to_string()
        } else {
            registry
                .env_keys
                .iter()
                .find_map(|key| std::env::var(key).ok())
                .unwrap_or_default()
        };

        let base_url = if !endpoint.is_empty() {
            endpoint.trim_end_matches('/').to_string()
        } else {
            registry
                .base_url_env
                .and_then(|env_key| {
                    let val = std::env::var(env_key).ok()?;
                    // For OLLAMA_HOST / LLAMACPP_HOST, append /v1 if not present
                    if val.ends_with("/v1") {
                        Some(val)
                    } else {
                        Some(format!("{}/v1", val.trim_end_matches('/')))
                    }
                })
                .unwrap_or_else(|| registry.base_url.to_string())
        };

        Self::build(registry.name, api_key, base_url, registry.auth_style, timeout_secs)
    }

    /// Create for a custom endpoint (e.g., "custom:https://my-server.com/v1").
    pub fn custom(target: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        let base_url = target
            .strip_prefix("custom:")
            .unwrap_or(target)
            .trim_end_matches('/')
            .to_string();
        if base_url.is_empty() {
            return Err(TroGiangError::Config("custom provider needs a URL".into()));
        }

        let api_key = if !api_key.is_empty() {
            api_key.to_string()
        } else {
            std::env::var("CUSTOM_API_KEY").unwrap_or_default()
        };
        let auth_style = if api_key.is_empty() {
            AuthStyle::None
        } else {
            AuthStyle::Bearer
        };

        Self::build("custom", api_key, base_url, auth_style, timeout_secs)
    }

    fn build(
        name: &str,
        api_key: String,
        base_url: String,
        auth_style: AuthStyle,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|e| TroGiangError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            name: name.to_string(),
            api_key,
            base_url,
            auth_style,
            timeout_secs: timeout_secs.max(1),
            client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the auth header for the request.
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_style {
            AuthStyle::Bearer if !self.api_key.is_empty() => {
                req.header("Authorization", format!("Bearer {}", self.api_key))
            }
            _ => req,
        }
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> TroGiangError {
        if e.is_timeout() {
            TroGiangError::Timeout(self.timeout_secs)
        } else {
            TroGiangError::Http(format!("{} connection failed ({}): {}", self.name, url, e))
        }
    }

    /// POST a JSON body to `path` and return the parsed JSON reply.
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        // For providers that require auth, check API key
        if self.auth_style != AuthStyle::None && self.api_key.is_empty() {
            return Err(TroGiangError::ApiKeyMissing(self.name.clone()));
        }

        let url = format!("{}{}", self.base_url, path);
        let req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body);
        let resp = self
            .apply_auth(req)
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(TroGiangError::Provider(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }

        resp.json()
            .await
            .map_err(|e| self.map_send_error(&url, e))
    }
}

/// Embedding adapter for `/embeddings`.
pub struct OpenAiCompatibleEmbedder {
    endpoint: Endpoint,
    path: String,
    model: String,
    batch_size: usize,
}

impl OpenAiCompatibleEmbedder {
    pub fn new(endpoint: Endpoint, path: &str, model: &str, batch_size: usize) -> Self {
        Self {
            endpoint,
            path: path.to_string(),
            model: model.to_string(),
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatibleEmbedder {
    fn name(&self) -> &str {
        self.endpoint.name()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let inputs: Vec<&str> = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(self.batch_size) {
            let body = json!({ "model": self.model, "input": batch });
            let reply = self.endpoint.post_json(&self.path, &body).await?;
            let batch_vectors = parse_embeddings(&reply)?;
            if batch_vectors.len() != batch.len() {
                return Err(TroGiangError::Provider(format!(
                    "{} returned {} embeddings for {} inputs",
                    self.endpoint.name(),
                    batch_vectors.len(),
                    batch.len()
                )));
            }
            vectors.extend(batch_vectors);
        }

        tracing::debug!(
            "🧮 {} embedded {} texts with {}",
            self.endpoint.name(),
            vectors.len(),
            self.model
        );
        Ok(vectors)
    }
}

/// Answer adapter for `/chat/completions`.
pub struct OpenAiCompatibleAnswerer {
    endpoint: Endpoint,
    chat_path: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiCompatibleAnswerer {
    pub fn new(
        endpoint: Endpoint,
        chat_path: &str,
        model: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            endpoint,
            chat_path: chat_path.to_string(),
            model: model.to_string(),
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl AnswerProvider for OpenAiCompatibleAnswerer {
    fn name(&self) -> &str {
        self.endpoint.name()
    }

    async fn answer(&self, question: &str, context: &[String]) -> Result<String> {
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "messages": build_messages(question, context),
        });
        let reply = self.endpoint.post_json(&self.chat_path, &body).await?;

        match parse_answer(&reply) {
            Some(text) => Ok(text),
            None => {
                tracing::debug!("{} returned an empty answer", self.endpoint.name());
                Ok(NOT_FOUND_SENTINEL.to_string())
            }
        }
    }
}
