//! Answer provider trait.

use async_trait::async_trait;

use crate::error::Result;

/// Composes a natural-language answer with a generative model.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Provider name, used in logs.
    fn name(&self) -> &str;

    /// Answer `question`. When `context` is non-empty the model must stay
    /// inside it and reply with the "not found in document" sentinel when
    /// the passages are insufficient.
    async fn answer(&self, question: &str, context: &[String]) -> Result<String>;
}
