//! Embedding backends.
//!
//! Two backends behind one enum: the Ollama embeddings endpoint for real use
//! and a deterministic local hashed bag-of-words embedder for offline runs
//! and tests. The embedding function must stay identical between indexing and
//! querying; the similarity index guards the dimension on both paths.

use crate::error::Result;
use crate::ollama::OllamaClient;

/// Default dimension of the local embedder.
pub const LOCAL_EMBEDDING_DIM: usize = 256;

/// Embedding backend: opaque `embed(text) -> vector` capability.
pub enum EmbedBackend {
    /// Ollama `/api/embeddings` with a named model.
    Ollama { client: OllamaClient, model: String },
    /// Deterministic local embeddings (offline/tests).
    Local(LocalEmbedder),
}

impl EmbedBackend {
    /// Backend over an Ollama embedding model.
    pub fn ollama(client: OllamaClient, model: impl Into<String>) -> Self {
        EmbedBackend::Ollama {
            client,
            model: model.into(),
        }
    }

    /// Deterministic local backend with the default dimension.
    pub fn local() -> Self {
        EmbedBackend::Local(LocalEmbedder::new(LOCAL_EMBEDDING_DIM))
    }

    /// Deterministic local backend with a custom dimension.
    pub fn local_with_dim(dim: usize) -> Self {
        EmbedBackend::Local(LocalEmbedder::new(dim))
    }

    /// Embed a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match self {
            EmbedBackend::Ollama { client, model } => client.embed(text, model).await,
            EmbedBackend::Local(local) => Ok(local.embed(text)),
        }
    }

    /// Embed multiple texts. The Ollama endpoint takes one prompt per call,
    /// so the batch is sequential.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Model identifier for stats and logs.
    pub fn model_name(&self) -> &str {
        match self {
            EmbedBackend::Ollama { model, .. } => model,
            EmbedBackend::Local(_) => "local-hash",
        }
    }
}

/// Deterministic, fast embedding for offline/local use.
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dim: usize,
}

impl LocalEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut vec = vec![0.0f32; self.dim];
        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let idx = (hasher.finish() as usize) % self.dim;
            vec[idx] += 1.0;
        }

        normalize(&mut vec);
        vec
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
}
