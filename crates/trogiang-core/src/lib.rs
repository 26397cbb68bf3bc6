//! # TroGiang Core
//!
//! Shared building blocks for the TroGiang teaching assistant:
//! configuration, the error taxonomy, and the capability traits that
//! embedding and answer providers implement.

pub mod config;
pub mod error;
pub mod traits;

pub use config::TroGiangConfig;
pub use error::{Result, TroGiangError};
pub use traits::{AnswerProvider, Embedding, EmbeddingProvider};
