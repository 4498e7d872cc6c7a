//! Retrieval-augmented RPP generation.
//!
//! The agent composes the other components: embed query, fetch top-k chunks,
//! build a grounded prompt, call the local model once (no retry), and log the
//! outcome. An empty index fails the request before any backend call is made
//! and writes no memory record.

use std::path::Path;

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::Config;
use crate::embeddings::EmbedBackend;
use crate::error::{Error, Result};
use crate::index::{IndexStats, VectorStore};
use crate::memory::{MemoryKind, MemoryStore};
use crate::ollama::OllamaClient;
use crate::pipeline::{Pipeline, ProcessingResult};
use crate::prompts;

/// Number of chunks retrieved to ground a generation request.
const RETRIEVAL_TOP_K: usize = 3;
/// Number of recent feedback records considered for prompt enrichment.
const FEEDBACK_LOOKBACK: usize = 5;

/// A generated lesson plan with its grounding sources.
#[derive(Debug, Clone)]
pub struct GeneratedRpp {
    /// Memory record id of this generation (usable for feedback).
    pub id: String,
    /// Generated lesson-plan text.
    pub rpp: String,
    /// Metadata of the chunks used as grounding context.
    pub sources: Vec<serde_json::Map<String, Value>>,
}

/// Aggregated system statistics.
#[derive(Debug, Clone)]
pub struct SystemStats {
    pub index: IndexStats,
    pub total_memories: usize,
    pub document_processing_memories: usize,
    pub rpp_generation_memories: usize,
    pub feedback_memories: usize,
    pub local_model: String,
    pub embedding_model: String,
}

/// RPP assistant agent.
pub struct RppAgent {
    config: Config,
    ollama: OllamaClient,
    backend: EmbedBackend,
    index: VectorStore,
    memory: MemoryStore,
}

impl RppAgent {
    /// Create an agent with Ollama embeddings, per the configuration.
    pub fn new(config: Config) -> Result<Self> {
        let ollama = OllamaClient::with_url(&config.ollama_url);
        let backend = EmbedBackend::ollama(ollama.clone(), config.embedding_model.clone());
        Self::with_backend(config, backend)
    }

    /// Create an agent with an explicit embedding backend (offline/tests).
    pub fn with_backend(config: Config, backend: EmbedBackend) -> Result<Self> {
        config.validate()?;

        let index = VectorStore::open(&config.vector_store_dir, &config.collection_name)?;
        let memory = MemoryStore::open(&config.memory_file, config.max_memory_items)?;
        let ollama = OllamaClient::with_url(&config.ollama_url);

        info!(
            "Agent ready: model={}, embeddings={}, index entries={}",
            config.local_model,
            backend.model_name(),
            index.len()
        );

        Ok(Self {
            config,
            ollama,
            backend,
            index,
            memory,
        })
    }

    /// Ingest every supported document under `dir` into the index.
    pub async fn process_documents(&mut self, dir: &Path) -> Result<ProcessingResult> {
        let pipeline = Pipeline::new(&self.config)?;
        pipeline
            .process_directory(dir, &self.backend, &mut self.index, &self.memory)
            .await
    }

    /// Generate an RPP grounded in the top-k most relevant chunks.
    ///
    /// Fails with `EmptyIndex` before calling the model when nothing has been
    /// ingested; backend errors surface as `GenerationFailure` after a single
    /// attempt.
    pub async fn generate(
        &mut self,
        query: &str,
        context: &serde_json::Map<String, Value>,
    ) -> Result<GeneratedRpp> {
        // Fail before the embedding call too, not just before generation
        if self.index.is_empty() {
            return Err(Error::EmptyIndex);
        }

        let query_embedding = self.backend.embed(query).await?;
        let hits = self.index.search(&query_embedding, RETRIEVAL_TOP_K)?;

        let grounding = hits
            .iter()
            .map(|h| h.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let feedback = self.relevant_feedback(context)?;
        let prompt = prompts::build_rpp_prompt(&grounding, query, context, &feedback);

        debug!(
            "Generating with {} grounding chunk(s), prompt {} chars",
            hits.len(),
            prompt.len()
        );

        let rpp = self
            .ollama
            .generate(
                &prompt,
                &self.config.local_model,
                self.config.temperature,
                self.config.max_tokens,
            )
            .await?;

        let sources: Vec<serde_json::Map<String, Value>> = hits
            .iter()
            .map(|h| {
                let mut meta = h.chunk.metadata.clone();
                meta.insert("source_path".to_string(), json!(h.chunk.source_path));
                meta.insert("position".to_string(), json!(h.chunk.position));
                meta
            })
            .collect();

        let id = self.memory.add(
            MemoryKind::RppGeneration,
            [
                ("query".to_string(), json!(query)),
                ("response".to_string(), json!(rpp)),
                ("context".to_string(), Value::Object(context.clone())),
                (
                    "sources".to_string(),
                    Value::Array(sources.iter().cloned().map(Value::Object).collect()),
                ),
            ]
            .into_iter()
            .collect(),
            serde_json::Map::new(),
        )?;

        info!("Generated RPP {} ({} chars)", id, rpp.len());
        Ok(GeneratedRpp { id, rpp, sources })
    }

    /// Store operator feedback for a generated RPP. Returns the feedback
    /// record id.
    pub fn store_feedback(&self, rpp_id: &str, feedback: &str) -> Result<String> {
        let feedback_type = if feedback.to_lowercase().contains("contoh soal") {
            "content"
        } else {
            "general"
        };

        self.memory.add(
            MemoryKind::Feedback,
            [
                ("feedback".to_string(), json!(feedback)),
                ("feedback_type".to_string(), json!(feedback_type)),
            ]
            .into_iter()
            .collect(),
            [("rpp_id".to_string(), json!(rpp_id))].into_iter().collect(),
        )
    }

    /// Aggregate index and memory statistics.
    pub fn stats(&self) -> Result<SystemStats> {
        Ok(SystemStats {
            index: self.index.stats(),
            total_memories: self.memory.count(None)?,
            document_processing_memories: self
                .memory
                .count(Some(MemoryKind::DocumentProcessing))?,
            rpp_generation_memories: self.memory.count(Some(MemoryKind::RppGeneration))?,
            feedback_memories: self.memory.count(Some(MemoryKind::Feedback))?,
            local_model: self.config.local_model.clone(),
            embedding_model: self.backend.model_name().to_string(),
        })
    }

    /// Clear memory records, optionally scoped by kind.
    pub fn clear_memory(&self, kind: Option<MemoryKind>) -> Result<()> {
        self.memory.clear(kind)
    }

    /// Clear the similarity index. Irreversible.
    pub fn clear_index(&mut self) -> Result<()> {
        self.index.clear()
    }

    /// Memory store handle (read access for callers).
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Check if the configured Ollama server is reachable.
    pub async fn is_running(&self) -> bool {
        self.ollama.is_running().await
    }

    /// Models available on the configured Ollama server.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        self.ollama.list_models().await
    }

    /// Recent feedback for the same subject, folded into the prompt.
    fn relevant_feedback(&self, context: &serde_json::Map<String, Value>) -> Result<String> {
        let Some(subject) = context.get("mata_pelajaran") else {
            return Ok(String::new());
        };

        let records = self
            .memory
            .get(Some(MemoryKind::Feedback), Some(FEEDBACK_LOOKBACK))?;

        let relevant: Vec<&str> = records
            .iter()
            .filter(|r| {
                r.metadata
                    .get("context")
                    .and_then(|c| c.get("mata_pelajaran"))
                    == Some(subject)
            })
            .filter_map(|r| r.content.get("feedback").and_then(Value::as_str))
            .collect();

        Ok(relevant.join("\n"))
    }
}
