//! Domain types shared by ingestion, storage and retrieval.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub type ChunkId = String;

/// Separator used when a source's scope tags are flattened into chunk metadata.
pub const SCOPE_SEPARATOR: &str = ";";

/// One regulatory source document as declared in the manifest.
///
/// - `id`: unique key, also the prefix of every chunk id produced from this source
/// - `kind`: category string (`type` in the manifest file)
/// - `path`: file path relative to the corpus root (or its `data/` directory)
/// - `citation`: human-readable citation copied verbatim into every retrieved passage
/// - `scope`: free-text topical tags used by the filter stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    #[serde(default)]
    pub citation: String,
    #[serde(default)]
    pub scope: Vec<String>,
}

impl SourceEntry {
    pub fn flattened_scope(&self) -> String {
        self.scope.join(SCOPE_SEPARATOR)
    }
}

/// A retrievable window of a source's extracted text.
///
/// `id` is `"{source_id}_{ordinal}"`; metadata is identical across all chunks of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub source_id: String,
    pub title: String,
    pub kind: String,
    pub citation: String,
    pub scope: String,
    pub ordinal: usize,
}

impl Chunk {
    pub fn make_id(source_id: &str, ordinal: usize) -> ChunkId {
        format!("{source_id}_{ordinal}")
    }
}

/// The unit handed from the retriever to its consumers.
///
/// `score` is the embedding similarity (higher is better) and is left untouched by
/// re-ranking, which only changes order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub id: ChunkId,
    pub text: String,
    pub title: String,
    pub citation: String,
    pub source_id: String,
    pub kind: String,
    pub scope: String,
    pub score: f32,
}

impl RetrievedPassage {
    pub fn from_chunk(chunk: &Chunk, score: f32) -> Self {
        Self {
            id: chunk.id.clone(),
            text: chunk.text.clone(),
            title: chunk.title.clone(),
            citation: chunk.citation.clone(),
            source_id: chunk.source_id.clone(),
            kind: chunk.kind.clone(),
            scope: chunk.scope.clone(),
            score,
        }
    }
}

/// Per-source coverage line produced by `inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub id: String,
    pub path: String,
    pub resolved: Option<PathBuf>,
    pub exists: bool,
    pub extension: String,
    pub text_length: usize,
}
