//! Capability traits for the external model services.

pub mod answer;
pub mod embedding;

pub use answer::AnswerProvider;
pub use embedding::{Embedding, EmbeddingProvider};
