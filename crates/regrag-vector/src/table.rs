//! LanceDB connection and housekeeping helpers.
//!
//! Database open, ensure-table, and a small key/value metadata table holding
//! collection-level facts such as the embedder that built it.

use arrow_array::{ArrayRef, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use chrono::Utc;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Connection;
use std::sync::Arc;

use regrag_core::error::{Error, Result};

use crate::schema::build_meta_schema;

pub async fn open_db(uri: &str) -> Result<Connection> {
    lancedb::connect(uri).execute().await.map_err(Error::store)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await.map_err(Error::store)?;
    Ok(names.iter().any(|n| n == name))
}

pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<()> {
    if table_exists(conn, name).await? {
        return Ok(());
    }
    // create empty table with 0 rows
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await.map_err(Error::store)?;
    Ok(())
}

fn meta_row(key: &str, value: &str) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec![key])),
        Arc::new(StringArray::from(vec![value])),
        Arc::new(TimestampMillisecondArray::from(vec![Utc::now().timestamp_millis()])),
    ];
    RecordBatch::try_new(build_meta_schema(), columns).map_err(Error::store)
}

/// Insert or overwrite `key` in the metadata table, creating the table on first use.
pub async fn set_meta(conn: &Connection, table: &str, key: &str, value: &str) -> Result<()> {
    ensure_table(conn, table, build_meta_schema()).await?;
    let t = conn.open_table(table).execute().await.map_err(Error::store)?;
    let rows = RecordBatchIterator::new(vec![Ok(meta_row(key, value)?)], build_meta_schema());
    let mut upsert = t.merge_insert(&["key"]);
    upsert.when_matched_update_all(None).when_not_matched_insert_all();
    upsert.execute(Box::new(rows)).await.map_err(Error::store)?;
    Ok(())
}

pub async fn get_meta(conn: &Connection, table: &str, key: &str) -> Result<Option<String>> {
    if !table_exists(conn, table).await? {
        return Ok(None);
    }
    let t = conn.open_table(table).execute().await.map_err(Error::store)?;
    let mut stream = t
        .query()
        .only_if(format!("key = '{}'", quote(key)))
        .execute()
        .await
        .map_err(Error::store)?;
    while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await.map_err(Error::store)? {
        if batch.num_rows() == 0 {
            continue;
        }
        let val = batch
            .column_by_name("value")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| Error::Store("meta.value column missing".into()))?;
        return Ok(Some(val.value(0).to_string()));
    }
    Ok(None)
}

/// Escape a value for use inside a single-quoted filter literal.
pub fn quote(value: &str) -> String {
    value.replace('\'', "''")
}
