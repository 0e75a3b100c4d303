//! Vector collections for chunk embeddings.
//!
//! [`LanceCollection`] persists rows in a LanceDB table plus a `<name>_meta`
//! key/value table; [`MemoryCollection`] keeps everything in process. Both
//! implement [`VectorStore`].

use async_trait::async_trait;
use lancedb::Connection;
use std::path::Path;

use regrag_core::config::Settings;
use regrag_core::error::Result;
use regrag_core::traits::VectorStore;
use regrag_core::types::{Chunk, ChunkId, RetrievedPassage};

pub mod memory;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use memory::MemoryCollection;

const EMBEDDER_KEY: &str = "embedder";

pub struct LanceCollection {
	pub(crate) db: Connection,
	pub(crate) table_name: String,
	pub(crate) meta_table: String,
	pub(crate) dim: usize,
}

impl LanceCollection {
	/// Connect to the database directory. The table itself is created lazily on first upsert.
	pub async fn open(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
		let db = table::open_db(db_path.to_string_lossy().as_ref()).await?;
		Ok(Self { db, table_name: table_name.to_string(), meta_table: format!("{table_name}_meta"), dim })
	}

	pub async fn from_settings(settings: &Settings) -> Result<Self> {
		Self::open(&settings.db_path(), &settings.index.collection, settings.embedding.dim).await
	}

	pub fn dim(&self) -> usize { self.dim }
}

#[async_trait]
impl VectorStore for LanceCollection {
	fn name(&self) -> &str { &self.table_name }

	async fn exists(&self) -> Result<bool> { table::table_exists(&self.db, &self.table_name).await }

	async fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> { self.write(chunks, embeddings).await }

	async fn prune_source(&self, source_id: &str, keep: usize) -> Result<()> { self.delete_tail(source_id, keep).await }

	async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedPassage>> { self.search(query, k).await }

	async fn count(&self) -> Result<usize> { self.rows().await }

	async fn chunk_ids(&self) -> Result<Vec<ChunkId>> { self.ids().await }

	async fn set_embedder(&self, embedder_id: &str) -> Result<()> {
		table::set_meta(&self.db, &self.meta_table, EMBEDDER_KEY, embedder_id).await
	}

	async fn embedder(&self) -> Result<Option<String>> { table::get_meta(&self.db, &self.meta_table, EMBEDDER_KEY).await }
}
