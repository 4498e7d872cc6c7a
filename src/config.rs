//! Configuration for the RPP assistant
//!
//! Loads configuration from a config.yml file, falling back to defaults when
//! the file is absent. Components receive the config explicitly; nothing is
//! created on disk at load time.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between adjacent chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
/// Default maximum file size accepted by the ingestion pipeline (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
/// Default cap on retained memory records.
pub const DEFAULT_MAX_MEMORY_ITEMS: usize = 1000;

/// Runtime configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ollama model used for RPP generation.
    pub local_model: String,
    /// Ollama model used for embeddings.
    pub embedding_model: String,
    /// Ollama server base URL.
    pub ollama_url: String,
    /// Chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters. Must be < chunk_size.
    pub chunk_overlap: usize,
    /// Sampling temperature for generation.
    pub temperature: f32,
    /// Context window / max tokens for generation.
    pub max_tokens: u32,
    /// File extensions accepted by the ingestion pipeline (without dot).
    pub allowed_extensions: Vec<String>,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Similarity index collection name.
    pub collection_name: String,
    /// Root directory of the persistent similarity index.
    pub vector_store_dir: PathBuf,
    /// Path of the memory log JSON file.
    pub memory_file: PathBuf,
    /// Maximum number of retained memory records.
    pub max_memory_items: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            local_model: "rpp:latest".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            temperature: 0.7,
            max_tokens: 2000,
            allowed_extensions: vec![
                "pdf".to_string(),
                "docx".to_string(),
                "txt".to_string(),
            ],
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            collection_name: "rpp_knowledge_base".to_string(),
            vector_store_dir: PathBuf::from("models/vector_store"),
            memory_file: PathBuf::from("memory/personal_memory/memory.json"),
            max_memory_items: DEFAULT_MAX_MEMORY_ITEMS,
        }
    }
}

impl Config {
    /// Load config.yml from the current directory, or fall back to defaults.
    pub fn new() -> Self {
        Self::load("config.yml").unwrap_or_default()
    }

    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|_| Error::NotFound(path.display().to_string()))?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate invariants that the components rely on.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be > 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be < chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.max_memory_items == 0 {
            return Err(Error::InvalidConfig(
                "max_memory_items must be > 0".to_string(),
            ));
        }
        if self.allowed_extensions.is_empty() {
            return Err(Error::InvalidConfig(
                "allowed_extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
