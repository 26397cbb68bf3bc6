//! # TroGiang Knowledge Base
//!
//! Retrieval core of the teaching assistant: a teacher's document becomes
//! a per-topic knowledge base of (chunk, embedding) pairs, and a student's
//! question is answered from the best-matching chunks.
//!
//! ## How it works
//! ```text
//! Teacher uploads "Sinh học 10 - Tế bào.txt"
//!   ↓ extract::extract_text
//! chunker::split_into_chunks (≤ 100 words, sentence-aligned)
//!   ↓ EmbeddingProvider::embed
//! KnowledgeStore.save("10A1", "Tế bào")  → SQLite, one transaction
//!
//! Student: "Ti thể có chức năng gì?"
//!   ↓ EmbeddingProvider::embed
//! search::rank (cosine, top 3, ties → lower index)
//!   ↓
//! AnswerProvider::answer(question, chunks)
//! ```

pub mod chunker;
pub mod extract;
pub mod pipeline;
pub mod search;
pub mod slug;
pub mod store;

pub use chunker::{Chunk, split_into_chunks};
pub use pipeline::{ANSWER_UNAVAILABLE, Answer, IngestReport, KnowledgeService};
pub use search::SearchResult;
pub use slug::slugify;
pub use store::{KnowledgeStore, StoreStats, TopicKnowledge};
