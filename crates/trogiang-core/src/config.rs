//! TroGiang configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TroGiangError};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TroGiangConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

fn default_data_dir() -> String { "~/.trogiang/data".into() }

impl Default for TroGiangConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            knowledge: KnowledgeConfig::default(),
        }
    }
}

impl TroGiangConfig {
    /// Load config from the default path (~/.trogiang/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TroGiangError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| TroGiangError::Config(format!("Failed to parse config: {e}")))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to the given path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| TroGiangError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the TroGiang home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".trogiang")
    }

    /// Data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).as_ref())
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_provider() -> String { "gemini".into() }
fn default_embedding_model() -> String { "text-embedding-004".into() }
fn default_embedding_timeout() -> u64 { 30 }
fn default_batch_size() -> usize { 32 }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_embedding_model(),
            api_key: String::new(),
            endpoint: String::new(),
            timeout_secs: default_embedding_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

/// Generative model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_model() -> String { "gemini-1.5-flash".into() }
fn default_temperature() -> f32 { 0.3 }
fn default_max_tokens() -> u32 { 1024 }
fn default_llm_timeout() -> u64 { 60 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_llm_model(),
            api_key: String::new(),
            endpoint: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Chunking and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_max_words() -> usize { 100 }
fn default_top_k() -> usize { 3 }

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            max_words: default_max_words(),
            top_k: default_top_k(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TroGiangConfig::default();
        assert_eq!(config.embedding.provider, "gemini");
        assert_eq!(config.embedding.model, "text-embedding-004");
        assert_eq!(config.llm.model, "gemini-1.5-flash");
        assert_eq!(config.knowledge.max_words, 100);
        assert_eq!(config.knowledge.top_k, 3);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            data_dir = "/srv/trogiang"

            [embedding]
            provider = "openai"
            model = "text-embedding-3-small"

            [llm]
            provider = "ollama"
            model = "qwen2.5"
            temperature = 0.1

            [knowledge]
            max_words = 80
        "#;

        let config: TroGiangConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.embedding.provider, "openai");
        assert_eq!(config.llm.model, "qwen2.5");
        assert!((config.llm.temperature - 0.1).abs() < 0.01);
        assert_eq!(config.knowledge.max_words, 80);
        assert_eq!(config.knowledge.top_k, 3);
        assert_eq!(config.data_path(), PathBuf::from("/srv/trogiang"));
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: TroGiangConfig = toml::from_str("").unwrap();
        assert_eq!(config.embedding.timeout_secs, 30);
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.embedding.batch_size, 32);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("trogiang-config-test");
        let path = dir.join("config.toml");
        let mut config = TroGiangConfig::default();
        config.knowledge.top_k = 5;
        config.save_to(&path).unwrap();

        let loaded = TroGiangConfig::load_from(&path).unwrap();
        assert_eq!(loaded.knowledge.top_k, 5);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_home_dir() {
        let home = TroGiangConfig::home_dir();
        assert!(home.to_string_lossy().contains("trogiang"));
    }
}
