//! Document ingestion pipeline.
//!
//! Walks a directory, filters candidates by extension and size, extracts
//! text, chunks it, embeds the chunks, and inserts them into the similarity
//! index. One bad file never aborts the batch: per-file failures are logged
//! and skipped, and the result counts only the files that succeeded. Each
//! successfully processed file also gets one `document_processing` memory
//! record.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::chunker::Chunker;
use crate::config::Config;
use crate::embeddings::EmbedBackend;
use crate::error::{Error, Result};
use crate::index::{Chunk, VectorStore};
use crate::loader;
use crate::memory::{MemoryKind, MemoryStore};

/// Counts returned from one ingestion call. Files that failed are excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingResult {
    pub processed_files: usize,
    pub total_chunks: usize,
}

/// Directory ingestion pipeline.
pub struct Pipeline {
    chunker: Chunker,
    allowed_extensions: Vec<String>,
    max_file_size: u64,
}

impl Pipeline {
    /// Build a pipeline from the runtime configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            chunker: Chunker::new(config.chunk_size, config.chunk_overlap)?,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_file_size: config.max_file_size,
        })
    }

    /// Recursively ingest every allowed file under `root`.
    pub async fn process_directory(
        &self,
        root: &Path,
        backend: &EmbedBackend,
        index: &mut VectorStore,
        memory: &MemoryStore,
    ) -> Result<ProcessingResult> {
        if !root.exists() {
            return Err(Error::NotFound(root.display().to_string()));
        }

        let mut result = ProcessingResult::default();

        for entry in WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if !self.is_allowed(path) {
                continue;
            }

            match self.process_file(path, backend, index, memory).await {
                Ok(chunks) => {
                    result.processed_files += 1;
                    result.total_chunks += chunks;
                }
                Err(err) => {
                    warn!("Skipping {}: {}", path.display(), err);
                }
            }
        }

        info!(
            "Ingested {} file(s), {} chunk(s) from {}",
            result.processed_files,
            result.total_chunks,
            root.display()
        );
        Ok(result)
    }

    /// Ingest a single file. Returns the number of chunks inserted.
    pub async fn process_file(
        &self,
        path: &Path,
        backend: &EmbedBackend,
        index: &mut VectorStore,
        memory: &MemoryStore,
    ) -> Result<usize> {
        let file_meta = file_metadata(path)?;
        let size = file_meta["file_size"].as_u64().unwrap_or(0);
        if size > self.max_file_size {
            return Err(Error::TooLarge {
                path: path.display().to_string(),
                size,
                limit: self.max_file_size,
            });
        }

        let segments = loader::load(path)?;

        let mut chunks = Vec::new();
        let mut position = 0usize;
        for segment in &segments {
            for text in self.chunker.chunks(&segment.text) {
                if text.trim().is_empty() {
                    continue;
                }
                let mut metadata = file_meta.clone();
                if let Some(page) = segment.page {
                    metadata.insert("page".to_string(), json!(page));
                }
                chunks.push(Chunk {
                    text: text.to_string(),
                    source_path: path.display().to_string(),
                    position,
                    metadata,
                });
                position += 1;
            }
        }

        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = backend.embed_batch(&texts).await?;
        let inserted = index.insert(chunks, embeddings)?;

        memory.add(
            MemoryKind::DocumentProcessing,
            [
                ("file_path".to_string(), json!(path.display().to_string())),
                ("chunks_count".to_string(), json!(inserted)),
            ]
            .into_iter()
            .collect(),
            file_meta,
        )?;

        info!("Processed {}: {} chunk(s)", path.display(), inserted);
        Ok(inserted)
    }

    fn is_allowed(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.allowed_extensions.iter().any(|a| a == &ext)
            })
            .unwrap_or(false)
    }
}

/// File-level metadata attached to every chunk and memory record.
fn file_metadata(path: &Path) -> Result<serde_json::Map<String, serde_json::Value>> {
    let stat = std::fs::metadata(path)
        .map_err(|e| Error::ReadError(format!("{}: {}", path.display(), e)))?;

    let mut meta = serde_json::Map::new();
    meta.insert(
        "filename".to_string(),
        json!(path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()),
    );
    meta.insert("file_size".to_string(), json!(stat.len()));
    meta.insert(
        "extension".to_string(),
        json!(path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default()),
    );
    if let Ok(created) = stat.created() {
        meta.insert(
            "created_time".to_string(),
            json!(DateTime::<Utc>::from(created).to_rfc3339()),
        );
    }
    if let Ok(modified) = stat.modified() {
        meta.insert(
            "modified_time".to_string(),
            json!(DateTime::<Utc>::from(modified).to_rfc3339()),
        );
    }

    Ok(meta)
}
