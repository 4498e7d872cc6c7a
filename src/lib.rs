//! RPP Assistant Library
//!
//! This library provides tools to:
//! - Ingest reference documents (PDF, DOCX, plain text) into a persistent
//!   similarity index with overlapping character chunking
//! - Retrieve the most relevant chunks to ground lesson-plan ("RPP")
//!   generation against a local Ollama model
//! - Keep a bounded, JSON-persisted memory of ingestions, generations, and
//!   operator feedback
//! - Set up a customized agent persona by templating a Modelfile and
//!   registering it with the local model runtime

pub mod agent;
pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod loader;
pub mod memory;
pub mod modelfile;
pub mod ollama;
pub mod pipeline;
pub mod prompts;

// Re-export common types
pub use agent::{GeneratedRpp, RppAgent, SystemStats};
pub use chunker::Chunker;
pub use config::Config;
pub use embeddings::{EmbedBackend, LocalEmbedder};
pub use error::{Error, Result};
pub use index::{Chunk, IndexStats, ScoredChunk, VectorStore};
pub use loader::{DocumentFormat, Segment};
pub use memory::{MemoryKind, MemoryRecord, MemoryStore};
pub use ollama::OllamaClient;
pub use pipeline::{Pipeline, ProcessingResult};
