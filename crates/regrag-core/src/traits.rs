use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Chunk, ChunkId, RetrievedPassage};

/// An optional backend, negotiated once when it is constructed.
///
/// Consumers branch on this instead of assuming the backend is present.
#[derive(Clone)]
pub enum Capability<T> {
    Available(T),
    Unavailable(String),
}

impl<T> Capability<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Available(inner) => Some(inner),
            Self::Unavailable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable(reason) => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Capability<U> {
        match self {
            Self::Available(inner) => Capability::Available(f(inner)),
            Self::Unavailable(reason) => Capability::Unavailable(reason),
        }
    }
}

impl<T> From<anyhow::Result<T>> for Capability<T> {
    fn from(res: anyhow::Result<T>) -> Self {
        match res {
            Ok(inner) => Self::Available(inner),
            Err(e) => Self::Unavailable(format!("{e:#}")),
        }
    }
}

impl<T> std::fmt::Debug for Capability<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(_) => f.write_str("Available"),
            Self::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

pub trait Embedder: Send + Sync {
    /// Stable identifier for the model (e.g. `bge-m3:d1024`).
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    /// L2-normalized embeddings, one per input, in input order.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Pairwise (query, passage) relevance scoring.
pub trait Reranker: Send + Sync {
    fn id(&self) -> &str;
    /// One score per passage, in passage order; higher is more relevant.
    fn score(&self, query: &str, passages: &[&str]) -> anyhow::Result<Vec<f32>>;
}

/// A named collection of (chunk, embedding) pairs.
///
/// Writes happen only during ingestion; retrieval is read-only.
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn name(&self) -> &str;
    async fn exists(&self) -> Result<bool>;
    /// Insert or overwrite by chunk id. Returns the number of rows written.
    async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize>;
    /// Drop chunks of `source_id` whose ordinal is `>= keep`.
    async fn prune_source(&self, source_id: &str, keep: usize) -> Result<()>;
    /// Nearest neighbours by cosine similarity, best first.
    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedPassage>>;
    async fn count(&self) -> Result<usize>;
    async fn chunk_ids(&self) -> Result<Vec<ChunkId>>;
    /// Record which embedder built the collection.
    async fn set_embedder(&self, embedder_id: &str) -> Result<()>;
    async fn embedder(&self) -> Result<Option<String>>;
}
