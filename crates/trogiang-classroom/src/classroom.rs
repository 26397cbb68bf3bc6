//! Classroom — the registry and the knowledge service working together.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use trogiang_core::config::TroGiangConfig;
use trogiang_core::error::{Result, TroGiangError};
use trogiang_core::traits::{AnswerProvider, EmbeddingProvider};
use trogiang_knowledge::extract::extract_text;
use trogiang_knowledge::{Answer, IngestReport, KnowledgeService, KnowledgeStore};

use crate::registry::{ClassRegistry, TopicEntry};

pub struct Classroom {
    registry: ClassRegistry,
    knowledge: KnowledgeService,
}

impl Classroom {
    pub fn new(registry: ClassRegistry, knowledge: KnowledgeService) -> Self {
        Self { registry, knowledge }
    }

    /// Directory holding the class JSON files.
    pub fn registry_dir(config: &TroGiangConfig) -> PathBuf {
        config.data_path().join("classes")
    }

    /// SQLite file holding every topic's knowledge base.
    pub fn store_path(config: &TroGiangConfig) -> PathBuf {
        config.data_path().join("knowledge.db")
    }

    /// Open the registry and knowledge store under `config.data_dir`.
    pub fn open(
        config: &TroGiangConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        answerer: Arc<dyn AnswerProvider>,
    ) -> Result<Self> {
        let registry = ClassRegistry::new(&Self::registry_dir(config))?;
        let store = KnowledgeStore::open(&Self::store_path(config))?;
        let knowledge = KnowledgeService::new(store, embedder, answerer)
            .with_limits(config.knowledge.max_words, config.knowledge.top_k);
        Ok(Self::new(registry, knowledge))
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn knowledge(&self) -> &KnowledgeService {
        &self.knowledge
    }

    /// Index `text` as a new topic of the class.
    ///
    /// The topic is only recorded in the registry once its knowledge base
    /// has been saved.
    pub async fn create_topic(
        &self,
        class_code: &str,
        display_name: &str,
        text: &str,
    ) -> Result<(TopicEntry, IngestReport)> {
        let info = self.registry.require(class_code)?;
        let key = ClassRegistry::check_topic_available(&info, display_name)?;

        let report = self.knowledge.ingest(&info.class_code, &key, text).await?;
        let entry = self.registry.add_topic(&info.class_code, display_name)?;
        Ok((entry, report))
    }

    /// Extract a document from disk and index it as a new topic.
    pub async fn create_topic_from_file(
        &self,
        class_code: &str,
        display_name: &str,
        path: &Path,
    ) -> Result<(TopicEntry, IngestReport)> {
        let text = extract_text(path)?;
        self.create_topic(class_code, display_name, &text).await
    }

    /// Topics of a class, in creation order.
    pub fn topics(&self, class_code: &str) -> Result<Vec<TopicEntry>> {
        Ok(self.registry.require(class_code)?.topics)
    }

    /// Answer a student's question about one of the class's topics.
    pub async fn ask(&self, class_code: &str, topic: &str, question: &str) -> Result<Answer> {
        let info = self.registry.require(class_code)?;
        let entry = info.find_topic(topic).ok_or_else(|| TroGiangError::NotFound {
            class: info.class_code.clone(),
            topic: topic.to_string(),
        })?;
        self.knowledge.ask(&info.class_code, &entry.file, question).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use trogiang_core::traits::Embedding;

    /// Letter-frequency embedding over a–z.
    struct LetterEmbedder;

    #[async_trait]
    impl EmbeddingProvider for LetterEmbedder {
        fn name(&self) -> &str {
            "letters"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            Ok(texts
                .iter()
                .filter(|t| !t.trim().is_empty())
                .map(|t| {
                    let mut v = vec![0.0f32; 26];
                    for c in t.to_ascii_lowercase().bytes().filter(u8::is_ascii_lowercase) {
                        v[(c - b'a') as usize] += 1.0;
                    }
                    v
                })
                .collect())
        }
    }

    struct FirstPassage;

    #[async_trait]
    impl AnswerProvider for FirstPassage {
        fn name(&self) -> &str {
            "first"
        }

        async fn answer(&self, _question: &str, context: &[String]) -> Result<String> {
            Ok(context.first().cloned().unwrap_or_default())
        }
    }

    fn classroom(name: &str) -> (Classroom, PathBuf) {
        let dir = std::env::temp_dir().join(format!("trogiang-classroom-{name}"));
        std::fs::remove_dir_all(&dir).ok();
        let config = TroGiangConfig {
            data_dir: dir.to_string_lossy().to_string(),
            ..Default::default()
        };
        let room = Classroom::open(&config, Arc::new(LetterEmbedder), Arc::new(FirstPassage)).unwrap();
        (room, dir)
    }

    #[tokio::test]
    async fn test_topic_lifecycle() {
        let (room, dir) = classroom("lifecycle");
        room.registry().create_class("10A1").unwrap();

        let (entry, report) = room
            .create_topic("10A1", "Động vật", "Cats are mammals. Dogs are mammals too. Fish live in water.")
            .await
            .unwrap();
        assert_eq!(entry.file, "Động_vật");
        assert_eq!(report.chunk_count, 1);
        assert_eq!(room.topics("10A1").unwrap(), vec![entry.clone()]);

        let answer = room.ask("10A1", "Động vật", "What do cats are?").await.unwrap();
        assert!(!answer.degraded);
        assert!(answer.text.contains("Cats are mammals."));

        let dup = room.create_topic("10A1", "Động vật", "Other text.").await;
        assert!(matches!(dup, Err(TroGiangError::TopicExists(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_empty_document_leaves_no_topic() {
        let (room, dir) = classroom("empty");
        room.registry().create_class("10A1").unwrap();
        let err = room.create_topic("10A1", "Rỗng", "   ").await.unwrap_err();
        assert!(matches!(err, TroGiangError::Input(_)));
        assert!(room.topics("10A1").unwrap().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_unknown_class_and_topic() {
        let (room, dir) = classroom("unknown");
        assert!(matches!(
            room.ask("nope", "t", "q?").await,
            Err(TroGiangError::ClassNotFound(_))
        ));
        room.registry().create_class("10A1").unwrap();
        assert!(matches!(
            room.ask("10A1", "t", "q?").await,
            Err(TroGiangError::NotFound { .. })
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_paths_live_under_data_dir() {
        let config = TroGiangConfig {
            data_dir: "/srv/trogiang".into(),
            ..Default::default()
        };
        assert_eq!(Classroom::registry_dir(&config), PathBuf::from("/srv/trogiang/classes"));
        assert_eq!(Classroom::store_path(&config), PathBuf::from("/srv/trogiang/knowledge.db"));
    }

    #[tokio::test]
    async fn test_create_topic_from_file() {
        let (room, dir) = classroom("file");
        room.registry().create_class("9B").unwrap();
        let doc = dir.join("bai1.txt");
        std::fs::write(&doc, "Nước sôi ở 100 độ C. Nước đá tan ở 0 độ C.").unwrap();

        let (entry, _) = room.create_topic_from_file("9B", "Nhiệt học", &doc).await.unwrap();
        assert!(room.knowledge().store().exists("9B", &entry.file).unwrap());

        let broken = dir.join("bai2.pdf");
        std::fs::write(&broken, b"%PDF-1.7 truncated").unwrap();
        assert!(matches!(
            room.create_topic_from_file("9B", "Quang học", &broken).await,
            Err(TroGiangError::Extraction(_))
        ));
        assert_eq!(room.topics("9B").unwrap().len(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }
}
