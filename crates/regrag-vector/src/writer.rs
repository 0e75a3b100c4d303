use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use std::sync::Arc;

use regrag_core::error::{Error, Result};
use regrag_core::types::Chunk;

use crate::schema::{build_chunk_schema, vector_dim};
use crate::table::{quote, table_exists};
use crate::LanceCollection;

impl LanceCollection {
	/// Insert-or-replace rows keyed on `id`; creates the table on first write.
	pub(crate) async fn write(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
		if chunks.len() != embeddings.len() {
			return Err(Error::Store(format!("{} chunks but {} embeddings", chunks.len(), embeddings.len())));
		}
		if chunks.is_empty() {
			return Ok(0);
		}
		if let Some(bad) = embeddings.iter().find(|v| v.len() != self.dim) {
			return Err(Error::InvalidConfig(format!(
				"embedding has {} dims but collection '{}' stores {}",
				bad.len(),
				self.table_name,
				self.dim
			)));
		}
		let record_batch = self.chunks_to_record_batch(chunks, embeddings)?;
		let schema = record_batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		if table_exists(&self.db, &self.table_name).await? {
			let table = self.db.open_table(&self.table_name).execute().await.map_err(Error::store)?;
			let existing = table.schema().await.map_err(Error::store)?;
			if let Some(stored) = vector_dim(&existing).filter(|d| *d != self.dim) {
				return Err(Error::InvalidConfig(format!(
					"collection '{}' was built with {stored}-dim vectors, embedder produces {}",
					self.table_name, self.dim
				)));
			}
			let mut mi = table.merge_insert(&["id"]);
			mi.when_matched_update_all(None).when_not_matched_insert_all();
			mi.execute(reader).await.map_err(Error::store)?;
		} else {
			tracing::info!(collection = %self.table_name, dim = self.dim, "creating collection");
			self.db.create_table(&self.table_name, reader).execute().await.map_err(Error::store)?;
		}
		tracing::debug!(collection = %self.table_name, rows = chunks.len(), "upserted batch");
		Ok(chunks.len())
	}

	pub(crate) async fn delete_tail(&self, source_id: &str, keep: usize) -> Result<()> {
		if !table_exists(&self.db, &self.table_name).await? {
			return Ok(());
		}
		let table = self.db.open_table(&self.table_name).execute().await.map_err(Error::store)?;
		let predicate = format!("source_id = '{}' AND chunk_index >= {keep}", quote(source_id));
		table.delete(&predicate).await.map_err(Error::store)?;
		Ok(())
	}

	fn chunks_to_record_batch(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
		let schema = build_chunk_schema(self.dim);
		let mut ids = Vec::with_capacity(chunks.len());
		let mut source_ids = Vec::with_capacity(chunks.len());
		let mut titles = Vec::with_capacity(chunks.len());
		let mut kinds = Vec::with_capacity(chunks.len());
		let mut citations = Vec::with_capacity(chunks.len());
		let mut scopes = Vec::with_capacity(chunks.len());
		let mut contents = Vec::with_capacity(chunks.len());
		let mut chunk_indices = Vec::with_capacity(chunks.len());
		for c in chunks {
			ids.push(c.id.as_str());
			source_ids.push(c.source_id.as_str());
			titles.push(c.title.as_str());
			kinds.push(c.kind.as_str());
			citations.push(c.citation.as_str());
			scopes.push(c.scope.as_str());
			contents.push(c.text.as_str());
			chunk_indices.push(i32::try_from(c.ordinal).map_err(Error::store)?);
		}
		let vectors = embeddings.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>()));
		RecordBatch::try_new(schema, vec![
			Arc::new(StringArray::from(ids)),
			Arc::new(StringArray::from(source_ids)),
			Arc::new(StringArray::from(titles)),
			Arc::new(StringArray::from(kinds)),
			Arc::new(StringArray::from(citations)),
			Arc::new(StringArray::from(scopes)),
			Arc::new(StringArray::from(contents)),
			Arc::new(Int32Array::from(chunk_indices)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, self.dim as i32)),
		])
		.map_err(Error::store)
	}
}
