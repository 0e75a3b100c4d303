//! In-process collection with the same contract as the LanceDB one.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use regrag_core::error::{Error, Result};
use regrag_core::traits::VectorStore;
use regrag_core::types::{Chunk, ChunkId, RetrievedPassage};

#[derive(Default)]
struct Inner {
	rows: BTreeMap<ChunkId, (Chunk, Vec<f32>)>,
	embedder: Option<String>,
	created: bool,
}

pub struct MemoryCollection {
	name: String,
	inner: RwLock<Inner>,
}

impl MemoryCollection {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), inner: RwLock::new(Inner::default()) }
	}
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
	if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

#[async_trait]
impl VectorStore for MemoryCollection {
	fn name(&self) -> &str { &self.name }

	async fn exists(&self) -> Result<bool> { Ok(self.inner.read().await.created) }

	async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
		if chunks.len() != embeddings.len() {
			return Err(Error::Store(format!("{} chunks but {} embeddings", chunks.len(), embeddings.len())));
		}
		let mut inner = self.inner.write().await;
		if let Some(dim) = inner.rows.values().next().map(|(_, v)| v.len()) {
			if let Some(bad) = embeddings.iter().find(|v| v.len() != dim) {
				return Err(Error::InvalidConfig(format!("embedding has {} dims but collection stores {dim}", bad.len())));
			}
		}
		for (chunk, vector) in chunks.iter().zip(embeddings) {
			inner.rows.insert(chunk.id.clone(), (chunk.clone(), vector.clone()));
		}
		if !chunks.is_empty() {
			inner.created = true;
		}
		Ok(chunks.len())
	}

	async fn prune_source(&self, source_id: &str, keep: usize) -> Result<()> {
		self.inner.write().await.rows.retain(|_, (c, _)| c.source_id != source_id || c.ordinal < keep);
		Ok(())
	}

	async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedPassage>> {
		let inner = self.inner.read().await;
		if !inner.created {
			return Err(Error::IndexUnavailable(format!("collection '{}' has not been built", self.name)));
		}
		let mut hits: Vec<RetrievedPassage> =
			inner.rows.values().map(|(c, v)| RetrievedPassage::from_chunk(c, cosine(query, v))).collect();
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		hits.truncate(k);
		Ok(hits)
	}

	async fn count(&self) -> Result<usize> { Ok(self.inner.read().await.rows.len()) }

	async fn chunk_ids(&self) -> Result<Vec<ChunkId>> { Ok(self.inner.read().await.rows.keys().cloned().collect()) }

	async fn set_embedder(&self, embedder_id: &str) -> Result<()> {
		let mut inner = self.inner.write().await;
		inner.embedder = Some(embedder_id.to_string());
		inner.created = true;
		Ok(())
	}

	async fn embedder(&self) -> Result<Option<String>> { Ok(self.inner.read().await.embedder.clone()) }
}
