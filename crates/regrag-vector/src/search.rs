use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::DistanceType;

use regrag_core::error::{Error, Result};
use regrag_core::types::{ChunkId, RetrievedPassage};

use crate::table::table_exists;
use crate::LanceCollection;

impl LanceCollection {
	pub(crate) async fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedPassage>> {
		if !table_exists(&self.db, &self.table_name).await? {
			return Err(Error::IndexUnavailable(format!("collection '{}' has not been built", self.table_name)));
		}
		if query.len() != self.dim {
			return Err(Error::InvalidConfig(format!("query has {} dims, collection stores {}", query.len(), self.dim)));
		}
		if k == 0 {
			return Ok(Vec::new());
		}
		let table = self.db.open_table(&self.table_name).execute().await.map_err(Error::store)?;
		let mut results = table
			.vector_search(query.to_vec())
			.map_err(Error::store)?
			.distance_type(DistanceType::Cosine)
			.limit(k)
			.execute()
			.await
			.map_err(Error::store)?;
		let mut hits = Vec::new();
		while let Some(batch) = results.try_next().await.map_err(Error::store)? {
			hits.extend(passages_from_batch(&batch)?);
		}
		// Lance returns nearest first; keep that order stable for equal scores.
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		hits.truncate(k);
		Ok(hits)
	}

	pub(crate) async fn rows(&self) -> Result<usize> {
		if !table_exists(&self.db, &self.table_name).await? {
			return Ok(0);
		}
		let table = self.db.open_table(&self.table_name).execute().await.map_err(Error::store)?;
		table.count_rows(None).await.map_err(Error::store)
	}

	pub(crate) async fn ids(&self) -> Result<Vec<ChunkId>> {
		if !table_exists(&self.db, &self.table_name).await? {
			return Ok(Vec::new());
		}
		let table = self.db.open_table(&self.table_name).execute().await.map_err(Error::store)?;
		let mut stream = table
			.query()
			.select(Select::columns(&["id"]))
			.execute()
			.await
			.map_err(Error::store)?;
		let mut ids = Vec::new();
		while let Some(batch) = stream.try_next().await.map_err(Error::store)? {
			let col = string_column(&batch, "id")?;
			ids.extend((0..batch.num_rows()).map(|i| col.value(i).to_string()));
		}
		ids.sort();
		Ok(ids)
	}
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| Error::Store(format!("column '{name}' missing from result batch")))
}

/// Decode one result batch; similarity is `1 - cosine distance`.
fn passages_from_batch(batch: &RecordBatch) -> Result<Vec<RetrievedPassage>> {
	let id = string_column(batch, "id")?;
	let content = string_column(batch, "content")?;
	let title = string_column(batch, "title")?;
	let citation = string_column(batch, "citation")?;
	let source_id = string_column(batch, "source_id")?;
	let kind = string_column(batch, "kind")?;
	let scope = string_column(batch, "scope")?;
	let distance = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());
	Ok((0..batch.num_rows())
		.map(|i| RetrievedPassage {
			id: id.value(i).to_string(),
			text: content.value(i).to_string(),
			title: title.value(i).to_string(),
			citation: citation.value(i).to_string(),
			source_id: source_id.value(i).to_string(),
			kind: kind.value(i).to_string(),
			scope: scope.value(i).to_string(),
			score: distance.filter(|d| d.is_valid(i)).map_or(0.0, |d| 1.0 - d.value(i)),
		})
		.collect())
}
