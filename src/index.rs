//! Persistent similarity index.
//!
//! A directory-rooted collection of (chunk, embedding) pairs persisted as a
//! single JSON document and searched by cosine similarity. Inserts are
//! additive and never overwrite; the only deletion is a full clear. The
//! embedding dimension is persisted with the collection and enforced on every
//! insert and search, so an index built with one embedding model cannot be
//! silently queried with another.
//!
//! `search` on an empty collection fails with `EmptyIndex` rather than
//! returning an empty result, so callers cannot mistake "no data ingested"
//! for "nothing similar found".

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};

const STORE_FILE: &str = "store.json";

/// A bounded segment of document text, the unit stored in the index.
///
/// Immutable once inserted; duplicate ingestion of the same file produces
/// duplicate chunks (no content dedup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text.
    pub text: String,
    /// Path of the source document.
    pub source_path: String,
    /// Ordinal of this chunk within its source document.
    pub position: usize,
    /// File-level metadata attached at ingestion time.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// One stored entry: chunk plus its embedding, keyed by an opaque id.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    id: Uuid,
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Search hit with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Collection statistics.
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub count: usize,
    pub collection_name: String,
    pub dimension: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    collection: String,
    /// Fixed once the first entry is inserted.
    dimension: Option<usize>,
    entries: Vec<IndexEntry>,
}

/// Persistent vector store rooted at a directory, keyed by collection name.
pub struct VectorStore {
    dir: PathBuf,
    data: StoreData,
}

impl VectorStore {
    /// Open (or create) the collection under `root/collection`.
    pub fn open(root: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let dir = root.as_ref().join(collection);
        std::fs::create_dir_all(&dir)?;

        let store_path = dir.join(STORE_FILE);
        let data = if store_path.exists() {
            let contents = std::fs::read_to_string(&store_path)?;
            serde_json::from_str(&contents)?
        } else {
            StoreData {
                collection: collection.to_string(),
                dimension: None,
                entries: Vec::new(),
            }
        };

        debug!(
            "Opened collection '{}' with {} entries",
            data.collection,
            data.entries.len()
        );
        Ok(Self { dir, data })
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.data.entries.len()
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.data.entries.is_empty()
    }

    /// Append chunk/embedding pairs. Additive; safe to call repeatedly.
    ///
    /// Fails with `DimensionMismatch` when an embedding does not match the
    /// collection's fixed dimension.
    pub fn insert(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(Error::InvalidConfig(format!(
                "chunk/embedding count mismatch: {} vs {}",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(0);
        }

        let expected = self.data.dimension.unwrap_or(embeddings[0].len());
        for embedding in &embeddings {
            if embedding.len() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }
        self.data.dimension = Some(expected);

        let count = chunks.len();
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            self.data.entries.push(IndexEntry {
                id: Uuid::new_v4(),
                chunk,
                embedding,
            });
        }

        self.persist()?;
        info!("Inserted {} entries into '{}'", count, self.data.collection);
        Ok(count)
    }

    /// Top-k entries ranked by descending cosine similarity to the query
    /// embedding. Ties keep insertion order (stable sort).
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if self.data.entries.is_empty() {
            return Err(Error::EmptyIndex);
        }

        if let Some(expected) = self.data.dimension {
            if query.len() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut scored: Vec<ScoredChunk> = self
            .data
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        debug!("Search returned {} result(s)", scored.len());
        Ok(scored)
    }

    /// Collection statistics.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            count: self.data.entries.len(),
            collection_name: self.data.collection.clone(),
            dimension: self.data.dimension,
        }
    }

    /// Remove all entries. Irreversible. The dimension guard resets with the
    /// content, so a cleared collection may be re-indexed with a new model.
    pub fn clear(&mut self) -> Result<()> {
        self.data.entries.clear();
        self.data.dimension = None;
        self.persist()?;
        info!("Cleared collection '{}'", self.data.collection);
        Ok(())
    }

    /// Atomic replace: the store file is never observably truncated.
    fn persist(&self) -> Result<()> {
        let store_path = self.dir.join(STORE_FILE);
        let tmp_path = self.dir.join(format!("{STORE_FILE}.tmp"));

        let contents = serde_json::to_string(&self.data)?;
        std::fs::write(&tmp_path, contents)?;
        std::fs::rename(&tmp_path, &store_path)?;
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source_path: "doc.txt".to_string(),
            position: 0,
            metadata: serde_json::Map::new(),
        }
    }

    fn store(dir: &Path) -> VectorStore {
        VectorStore::open(dir, "test_collection").unwrap()
    }

    #[test]
    fn cosine_similarity_handles_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);

        let aligned = cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]);
        assert!((aligned - 1.0).abs() < 1e-6);

        let orthogonal = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(orthogonal.abs() < 1e-6);
    }

    #[test]
    fn search_on_empty_collection_is_empty_index_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        assert!(matches!(store.search(&[1.0, 0.0], 3), Err(Error::EmptyIndex)));
    }

    #[test]
    fn insert_then_search_ranks_by_similarity() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        store
            .insert(
                vec![chunk("a"), chunk("b"), chunk("c")],
                vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
            )
            .unwrap();

        let results = store.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.text, "a");
        assert_eq!(results[1].chunk.text, "c");
        assert_eq!(results[2].chunk.text, "b");
        // Non-increasing scores
        assert!(results[0].score >= results[1].score);
        assert!(results[1].score >= results[2].score);
    }

    #[test]
    fn search_respects_k() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        let chunks: Vec<Chunk> = (0..5).map(|i| chunk(&format!("c{i}"))).collect();
        let embeddings: Vec<Vec<f32>> = (0..5).map(|i| vec![i as f32, 1.0]).collect();
        store.insert(chunks, embeddings).unwrap();

        let results = store.search(&[1.0, 1.0], 3).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn search_ties_keep_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        // Identical embeddings -> identical scores
        store
            .insert(
                vec![chunk("first"), chunk("second"), chunk("third")],
                vec![vec![1.0, 0.0]; 3],
            )
            .unwrap();

        let results = store.search(&[1.0, 0.0], 3).unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn insert_is_additive_and_never_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        store
            .insert(vec![chunk("same")], vec![vec![1.0, 0.0]])
            .unwrap();
        store
            .insert(vec![chunk("same")], vec![vec![1.0, 0.0]])
            .unwrap();

        assert_eq!(store.len(), 2);
    }

    #[test]
    fn insert_rejects_dimension_drift() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        store
            .insert(vec![chunk("a")], vec![vec![1.0, 0.0, 0.0]])
            .unwrap();

        let err = store
            .insert(vec![chunk("b")], vec![vec![1.0, 0.0]])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn search_rejects_query_dimension_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        store
            .insert(vec![chunk("a")], vec![vec![1.0, 0.0, 0.0]])
            .unwrap();

        let err = store.search(&[1.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn insert_rejects_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        let err = store
            .insert(vec![chunk("a"), chunk("b")], vec![vec![1.0]])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn collection_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let mut store = store(dir.path());
            store
                .insert(
                    vec![chunk("persisted")],
                    vec![vec![0.5, 0.5]],
                )
                .unwrap();
        }

        let reopened = store(dir.path());
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.stats().dimension, Some(2));

        let results = reopened.search(&[0.5, 0.5], 1).unwrap();
        assert_eq!(results[0].chunk.text, "persisted");
    }

    #[test]
    fn dimension_guard_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let mut store = store(dir.path());
            store
                .insert(vec![chunk("a")], vec![vec![1.0, 0.0, 0.0, 0.0]])
                .unwrap();
        }

        // A new session with a different embedding dimension must be rejected
        let mut reopened = store(dir.path());
        let err = reopened
            .insert(vec![chunk("b")], vec![vec![1.0, 0.0]])
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 4, .. }));
    }

    #[test]
    fn clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        store
            .insert(vec![chunk("a"), chunk("b")], vec![vec![1.0]; 2])
            .unwrap();
        store.clear().unwrap();

        assert!(store.is_empty());
        assert!(matches!(store.search(&[1.0], 1), Err(Error::EmptyIndex)));

        // Cleared on disk too
        let reopened = self::store(dir.path());
        assert!(reopened.is_empty());
    }

    #[test]
    fn stats_reports_count_and_collection() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        store
            .insert(vec![chunk("a")], vec![vec![1.0, 2.0]])
            .unwrap();

        let stats = store.stats();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.collection_name, "test_collection");
        assert_eq!(stats.dimension, Some(2));
    }

    #[test]
    fn insert_empty_batch_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        assert_eq!(store.insert(Vec::new(), Vec::new()).unwrap(), 0);
        assert!(store.is_empty());
    }
}
