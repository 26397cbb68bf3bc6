//! TroGiang error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TroGiangError>;

#[derive(Debug, Error)]
pub enum TroGiangError {
    /// Rejected before reaching the embedding or storage layers.
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Length mismatch: {chunks} chunks but {vectors} vectors")]
    LengthMismatch { chunks: usize, vectors: usize },

    #[error("No knowledge base for class '{class}', topic '{topic}'")]
    NotFound { class: String, topic: String },

    #[error("Class not found: {0}")]
    ClassNotFound(String),

    #[error("Class already exists: {0}")]
    ClassExists(String),

    #[error("Topic already exists: {0}")]
    TopicExists(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("API key missing for provider: {0}")]
    ApiKeyMissing(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TroGiangError {
    /// True for failures of the remote embedding/answer services.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Provider(_) | Self::Http(_) | Self::Timeout(_) | Self::ApiKeyMissing(_)
        )
    }

    /// True when the requested class or topic simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ClassNotFound(_))
    }
}
