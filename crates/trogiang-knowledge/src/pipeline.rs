//! Ingestion and question-answering pipeline.
//!
//! Ingest: text → chunks → embeddings → store.
//! Ask:    question → embedding → rank stored chunks → answer.

use std::sync::Arc;
use trogiang_core::error::{Result, TroGiangError};
use trogiang_core::traits::{AnswerProvider, EmbeddingProvider};

use crate::chunker::{Chunk, DEFAULT_MAX_WORDS};
use crate::search;
use crate::slug::slugify;
use crate::store::KnowledgeStore;

/// Shown to the student when an upstream model call fails.
pub const ANSWER_UNAVAILABLE: &str = "Đã xảy ra lỗi khi gọi mô hình.";

/// Default number of passages given to the answer model.
pub const DEFAULT_TOP_K: usize = 3;

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub class_key: String,
    pub topic_key: String,
    pub chunk_count: usize,
    pub word_count: usize,
    pub dimension: usize,
}

/// Answer returned to the student.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Passages handed to the model, best match first.
    pub context: Vec<String>,
    /// True when an upstream failure replaced the model's answer.
    pub degraded: bool,
}

impl Answer {
    fn unavailable(context: Vec<String>) -> Self {
        Self {
            text: ANSWER_UNAVAILABLE.to_string(),
            context,
            degraded: true,
        }
    }
}

/// Ties the store to the embedding and answer providers.
pub struct KnowledgeService {
    store: KnowledgeStore,
    embedder: Arc<dyn EmbeddingProvider>,
    answerer: Arc<dyn AnswerProvider>,
    max_words: usize,
    top_k: usize,
}

impl KnowledgeService {
    pub fn new(
        store: KnowledgeStore,
        embedder: Arc<dyn EmbeddingProvider>,
        answerer: Arc<dyn AnswerProvider>,
    ) -> Self {
        Self {
            store,
            embedder,
            answerer,
            max_words: DEFAULT_MAX_WORDS,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Override chunk size and retrieval depth.
    pub fn with_limits(mut self, max_words: usize, top_k: usize) -> Self {
        self.max_words = max_words.max(1);
        self.top_k = top_k.max(1);
        self
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Chunk, embed and persist a document as the topic's knowledge base.
    pub async fn ingest(&self, class_id: &str, topic_id: &str, text: &str) -> Result<IngestReport> {
        let pieces = Chunk::from_document(text, self.max_words);
        if pieces.is_empty() {
            return Err(TroGiangError::Input("document has no text to index".into()));
        }
        let word_count = pieces.iter().map(|c| c.word_count).sum();
        let chunks: Vec<String> = pieces.into_iter().map(|c| c.text).collect();

        let vectors = self.embedder.embed(&chunks).await?;
        if vectors.len() != chunks.len() {
            return Err(TroGiangError::Provider(format!(
                "{} returned {} embeddings for {} chunks",
                self.embedder.name(),
                vectors.len(),
                chunks.len()
            )));
        }

        self.store.save(class_id, topic_id, &chunks, &vectors)?;

        let report = IngestReport {
            class_key: slugify(class_id),
            topic_key: slugify(topic_id),
            chunk_count: chunks.len(),
            word_count,
            dimension: vectors[0].len(),
        };
        tracing::info!(
            "📚 Indexed {}/{}: {} chunks, {} words, dim {}",
            report.class_key,
            report.topic_key,
            report.chunk_count,
            report.word_count,
            report.dimension
        );
        Ok(report)
    }

    /// Find the passages most relevant to `question`.
    ///
    /// Upstream failures propagate; see [`Self::ask`] for the degraded path.
    pub async fn retrieve(&self, class_id: &str, topic_id: &str, question: &str) -> Result<Vec<String>> {
        let question = validate_question(question)?;
        let kb = self.load_required(class_id, topic_id)?;
        let query = self.embed_question(question).await?;
        search::rank(&query, &kb.vectors, &kb.chunks, self.top_k)
    }

    /// Answer a student's question from the topic's knowledge base.
    ///
    /// Missing topics, bad input, storage faults and dimension mismatches
    /// are errors. Embedding or generation failures yield a degraded answer.
    pub async fn ask(&self, class_id: &str, topic_id: &str, question: &str) -> Result<Answer> {
        let question = validate_question(question)?;
        let kb = self.load_required(class_id, topic_id)?;

        let query = match self.embed_question(question).await {
            Ok(q) => q,
            Err(e) if e.is_upstream() => {
                tracing::warn!("⚠️ Embedding via {} failed: {e}", self.embedder.name());
                return Ok(Answer::unavailable(Vec::new()));
            }
            Err(e) => return Err(e),
        };

        let context = search::rank(&query, &kb.vectors, &kb.chunks, self.top_k)?;
        tracing::debug!("Retrieved {} passages for question", context.len());

        match self.answerer.answer(question, &context).await {
            Ok(text) => Ok(Answer {
                text,
                context,
                degraded: false,
            }),
            Err(e) if e.is_upstream() => {
                tracing::warn!("⚠️ Answer via {} failed: {e}", self.answerer.name());
                Ok(Answer::unavailable(context))
            }
            Err(e) => Err(e),
        }
    }

    fn load_required(&self, class_id: &str, topic_id: &str) -> Result<crate::store::TopicKnowledge> {
        self.store
            .load(class_id, topic_id)?
            .ok_or_else(|| TroGiangError::NotFound {
                class: slugify(class_id),
                topic: slugify(topic_id),
            })
    }

    async fn embed_question(&self, question: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed(&[question.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                TroGiangError::Provider(format!("{} returned no embedding", self.embedder.name()))
            })
    }
}

fn validate_question(question: &str) -> Result<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(TroGiangError::Input("question is empty".into()));
    }
    Ok(question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use trogiang_core::traits::Embedding;

    /// Embeds by keyword presence: one axis per keyword.
    struct KeywordEmbedder {
        keywords: Vec<&'static str>,
        fail: bool,
    }

    impl KeywordEmbedder {
        fn new(keywords: &[&'static str]) -> Self {
            Self { keywords: keywords.to_vec(), fail: false }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn name(&self) -> &str {
            "keyword"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            if self.fail {
                return Err(TroGiangError::Timeout(30));
            }
            Ok(texts
                .iter()
                .filter(|t| !t.trim().is_empty())
                .map(|t| {
                    let lower = t.to_lowercase();
                    self.keywords
                        .iter()
                        .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
                        .collect()
                })
                .collect())
        }
    }

    /// Echoes its context and remembers what it was given.
    #[derive(Default)]
    struct EchoAnswerer {
        seen: Mutex<Vec<(String, Vec<String>)>>,
        fail: bool,
    }

    #[async_trait]
    impl AnswerProvider for EchoAnswerer {
        fn name(&self) -> &str {
            "echo"
        }

        async fn answer(&self, question: &str, context: &[String]) -> Result<String> {
            if self.fail {
                return Err(TroGiangError::Http("connection refused".into()));
            }
            self.seen
                .lock()
                .unwrap()
                .push((question.to_string(), context.to_vec()));
            Ok(context.join(" | "))
        }
    }

    const DOC: &str = "Cats are mammals. Dogs are mammals too. Fish live in water.";

    fn service(embedder: KeywordEmbedder, answerer: Arc<EchoAnswerer>) -> KnowledgeService {
        KnowledgeService::new(KnowledgeStore::in_memory().unwrap(), Arc::new(embedder), answerer)
            .with_limits(5, 1)
    }

    #[tokio::test]
    async fn test_ingest_then_ask() {
        let answerer = Arc::new(EchoAnswerer::default());
        let svc = service(KeywordEmbedder::new(&["cat", "dog", "fish"]), answerer.clone());

        let report = svc.ingest("10A1", "Động vật", DOC).await.unwrap();
        assert_eq!(report.chunk_count, 3);
        assert_eq!(report.word_count, 11);
        assert_eq!(report.dimension, 3);
        assert_eq!(report.topic_key, "Động_vật");

        let answer = svc.ask("10A1", "Động vật", "Where do fish live?").await.unwrap();
        assert!(!answer.degraded);
        assert_eq!(answer.context, vec!["Fish live in water."]);
        assert_eq!(answer.text, "Fish live in water.");

        let seen = answerer.seen.lock().unwrap();
        assert_eq!(seen[0].0, "Where do fish live?");
    }

    #[tokio::test]
    async fn test_retrieve_respects_top_k() {
        let svc = KnowledgeService::new(
            KnowledgeStore::in_memory().unwrap(),
            Arc::new(KeywordEmbedder::new(&["cat", "dog", "fish", "mammal"])),
            Arc::new(EchoAnswerer::default()),
        )
        .with_limits(5, 2);
        svc.ingest("c", "t", DOC).await.unwrap();

        let passages = svc.retrieve("c", "t", "Which are mammals, dogs?").await.unwrap();
        assert_eq!(passages, vec!["Dogs are mammals too.", "Cats are mammals."]);
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let svc = service(KeywordEmbedder::new(&["x"]), Arc::new(EchoAnswerer::default()));
        let err = svc.ingest("c", "t", "   \n ").await.unwrap_err();
        assert!(matches!(err, TroGiangError::Input(_)));
        assert!(svc.store().load("c", "t").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_topic_is_not_found() {
        let svc = service(KeywordEmbedder::new(&["x"]), Arc::new(EchoAnswerer::default()));
        let err = svc.ask("c", "never saved", "hello?").await.unwrap_err();
        assert!(matches!(err, TroGiangError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let svc = service(KeywordEmbedder::new(&["x"]), Arc::new(EchoAnswerer::default()));
        svc.ingest("c", "t", DOC).await.unwrap();
        assert!(matches!(svc.ask("c", "t", "  ").await, Err(TroGiangError::Input(_))));
    }

    #[tokio::test]
    async fn test_answer_failure_degrades() {
        let answerer = Arc::new(EchoAnswerer { fail: true, ..Default::default() });
        let svc = service(KeywordEmbedder::new(&["cat", "dog", "fish"]), answerer);
        svc.ingest("c", "t", DOC).await.unwrap();

        let answer = svc.ask("c", "t", "cats?").await.unwrap();
        assert!(answer.degraded);
        assert_eq!(answer.text, ANSWER_UNAVAILABLE);
        assert_eq!(answer.context, vec!["Cats are mammals."]);
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_ask_but_fails_ingest() {
        let store = KnowledgeStore::in_memory().unwrap();
        store.save("c", "t", &["Cats are mammals.".into()], &[vec![1.0, 0.0]]).unwrap();
        let svc = KnowledgeService::new(
            store,
            Arc::new(KeywordEmbedder { keywords: vec!["cat"], fail: true }),
            Arc::new(EchoAnswerer::default()),
        );

        let answer = svc.ask("c", "t", "cats?").await.unwrap();
        assert!(answer.degraded);
        assert!(answer.context.is_empty());

        let err = svc.ingest("c", "other", DOC).await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_model_change_is_dimension_mismatch() {
        let store = KnowledgeStore::in_memory().unwrap();
        store.save("c", "t", &["Cats are mammals.".into()], &[vec![1.0, 0.0]]).unwrap();
        let svc = KnowledgeService::new(
            store,
            Arc::new(KeywordEmbedder::new(&["cat", "dog", "fish"])),
            Arc::new(EchoAnswerer::default()),
        );

        let err = svc.ask("c", "t", "cats?").await.unwrap_err();
        assert!(matches!(err, TroGiangError::DimensionMismatch { expected: 2, actual: 3 }));
    }
}
