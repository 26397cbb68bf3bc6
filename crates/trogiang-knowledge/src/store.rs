//! Knowledge store — SQLite persistence for topic knowledge bases.
//!
//! One logical unit per (class, topic): a `topics` row carrying the
//! dimension and chunk count, plus one `chunks` row per passage with its
//! embedding as a little-endian `f32` blob. A save replaces the whole unit
//! inside a single transaction, so readers never see a half-written base.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use trogiang_core::error::{Result, TroGiangError};
use trogiang_core::traits::Embedding;

use crate::slug::slugify;

/// Aligned chunks and vectors for one topic: `chunks[i]` ↔ `vectors[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicKnowledge {
    pub chunks: Vec<String>,
    pub vectors: Vec<Embedding>,
}

impl TopicKnowledge {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Embedding dimension (0 for an empty base).
    pub fn dimension(&self) -> usize {
        self.vectors.first().map(Vec::len).unwrap_or(0)
    }
}

/// Store-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub topics: usize,
    pub chunks: usize,
}

/// SQLite-backed knowledge store.
pub struct KnowledgeStore {
    conn: Mutex<Connection>,
}

fn db_err(e: rusqlite::Error) -> TroGiangError {
    TroGiangError::Storage(e.to_string())
}

impl KnowledgeStore {
    /// Open or create the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        let store = Self { conn: Mutex::new(conn) };
        store.migrate()?;
        tracing::debug!("Opened knowledge store at {}", path.display());
        Ok(store)
    }

    /// Non-persistent store, mostly for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        let store = Self { conn: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS topics (
                class_key TEXT NOT NULL,
                topic_key TEXT NOT NULL,
                dimension INTEGER NOT NULL,
                chunk_count INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (class_key, topic_key)
            );

            CREATE TABLE IF NOT EXISTS chunks (
                class_key TEXT NOT NULL,
                topic_key TEXT NOT NULL,
                idx INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (class_key, topic_key, idx)
            );",
        )
        .map_err(db_err)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TroGiangError::Storage(format!("store lock poisoned: {e}")))
    }

    /// Persist a topic's chunks and vectors, replacing any previous base.
    pub fn save(
        &self,
        class_id: &str,
        topic_id: &str,
        chunks: &[String],
        vectors: &[Embedding],
    ) -> Result<()> {
        if chunks.is_empty() {
            return Err(TroGiangError::Input("cannot save an empty knowledge base".into()));
        }
        if chunks.len() != vectors.len() {
            return Err(TroGiangError::LengthMismatch {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }
        let dimension = vectors[0].len();
        if dimension == 0 {
            return Err(TroGiangError::Input("embedding vectors are empty".into()));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(TroGiangError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        let class_key = slugify(class_id);
        let topic_key = slugify(topic_id);
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err)?;

        tx.execute(
            "DELETE FROM chunks WHERE class_key = ?1 AND topic_key = ?2",
            params![class_key, topic_key],
        )
        .map_err(db_err)?;
        tx.execute(
            "INSERT OR REPLACE INTO topics (class_key, topic_key, dimension, chunk_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                class_key,
                topic_key,
                dimension as i64,
                chunks.len() as i64,
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(db_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO chunks (class_key, topic_key, idx, text, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(db_err)?;
            for (idx, (text, vector)) in chunks.iter().zip(vectors).enumerate() {
                stmt.execute(params![class_key, topic_key, idx as i64, text, encode_vector(vector)?])
                    .map_err(db_err)?;
            }
        }
        tx.commit().map_err(db_err)?;

        tracing::debug!(
            "💾 Saved {} chunks (dim {}) for {}/{}",
            chunks.len(),
            dimension,
            class_key,
            topic_key
        );
        Ok(())
    }

    /// Load a topic's knowledge base; `Ok(None)` when it was never saved.
    pub fn load(&self, class_id: &str, topic_id: &str) -> Result<Option<TopicKnowledge>> {
        let class_key = slugify(class_id);
        let topic_key = slugify(topic_id);
        let conn = self.lock()?;

        let header: Option<(i64, i64)> = conn
            .query_row(
                "SELECT dimension, chunk_count FROM topics WHERE class_key = ?1 AND topic_key = ?2",
                params![class_key, topic_key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(db_err)?;
        let Some((dimension, chunk_count)) = header else {
            return Ok(None);
        };
        let header_err = |field: &str, value: i64| {
            TroGiangError::Storage(format!("{class_key}/{topic_key}: corrupt {field} {value}"))
        };
        let dimension = usize::try_from(dimension).map_err(|_| header_err("dimension", dimension))?;
        let chunk_count =
            usize::try_from(chunk_count).map_err(|_| header_err("chunk count", chunk_count))?;

        let mut stmt = conn
            .prepare(
                "SELECT idx, text, embedding FROM chunks
                 WHERE class_key = ?1 AND topic_key = ?2 ORDER BY idx",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![class_key, topic_key], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?))
            })
            .map_err(db_err)?;

        let mut chunks = Vec::new();
        let mut vectors = Vec::new();
        for (expected_idx, row) in rows.enumerate() {
            let (idx, text, blob) = row.map_err(db_err)?;
            if idx as usize != expected_idx {
                return Err(TroGiangError::Storage(format!(
                    "{class_key}/{topic_key}: missing chunk {expected_idx}"
                )));
            }
            let vector = decode_vector(&blob)?;
            if vector.len() != dimension {
                return Err(TroGiangError::Storage(format!(
                    "{class_key}/{topic_key}: chunk {idx} has dimension {}, expected {dimension}",
                    vector.len()
                )));
            }
            chunks.push(text);
            vectors.push(vector);
        }

        if chunks.len() != chunk_count || chunks.is_empty() {
            return Err(TroGiangError::Storage(format!(
                "{class_key}/{topic_key}: found {} chunks, expected {chunk_count}",
                chunks.len()
            )));
        }
        Ok(Some(TopicKnowledge { chunks, vectors }))
    }

    /// Whether a base exists for the pair.
    pub fn exists(&self, class_id: &str, topic_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM topics WHERE class_key = ?1 AND topic_key = ?2",
                params![slugify(class_id), slugify(topic_id)],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    /// Topic keys stored for a class, sorted.
    pub fn list_topics(&self, class_id: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT topic_key FROM topics WHERE class_key = ?1 ORDER BY topic_key")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![slugify(class_id)], |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(db_err)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;
        let (topics, chunks): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(chunk_count), 0) FROM topics",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(db_err)?;
        Ok(StoreStats {
            topics: topics as usize,
            chunks: chunks as usize,
        })
    }
}

fn encode_vector(vector: &[f32]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(vector.len() * 4);
    for &value in vector {
        buf.write_f32::<LittleEndian>(value)?;
    }
    Ok(buf)
}

fn decode_vector(blob: &[u8]) -> Result<Embedding> {
    if blob.len() % 4 != 0 {
        return Err(TroGiangError::Storage(format!(
            "corrupt embedding blob of {} bytes",
            blob.len()
        )));
    }
    let mut vector = vec![0.0f32; blob.len() / 4];
    LittleEndian::read_f32_into(blob, &mut vector);
    Ok(vector)
}
