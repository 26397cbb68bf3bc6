//! Embedding provider trait.

use async_trait::async_trait;

use crate::error::Result;

/// A fixed-length vector produced by an embedding model.
pub type Embedding = Vec<f32>;

/// Turns text into embedding vectors.
///
/// Implementations return one vector per non-blank input, in input order.
/// Blank inputs may be skipped, so callers should filter them out first
/// if they rely on positional alignment.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name, used in logs.
    fn name(&self) -> &str;

    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>>;
}
