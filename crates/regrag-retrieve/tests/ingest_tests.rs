mod common;

use std::sync::Arc;

use regrag_core::chunker::ChunkingConfig;
use regrag_core::error::Error;
use regrag_core::manifest::SourcesManifest;
use regrag_core::traits::{Capability, Embedder, VectorStore};
use regrag_embed::HashEmbedder;
use regrag_retrieve::ingest::{inspect, unreferenced_files};
use regrag_retrieve::IndexBuilder;
use regrag_vector::MemoryCollection;

fn builder(root: &std::path::Path, store: Arc<MemoryCollection>) -> IndexBuilder {
    IndexBuilder::new(root, ChunkingConfig::new(120, 20).expect("cfg"), common::hash_embedder(), store)
        .expect("builder")
        .with_batch_size(3)
}

#[tokio::test]
async fn ingestion_is_idempotent() {
    let tmp = tempfile::tempdir().expect("tmp");
    common::write_corpus(tmp.path());
    let store = Arc::new(MemoryCollection::new("adgm_sources"));
    let b = builder(tmp.path(), store.clone());
    let manifest_path = tmp.path().join("data/sources_manifest.json");

    let first = b.ingest_file(&manifest_path).await.expect("ingest");
    let ids_first = store.chunk_ids().await.expect("ids");
    assert_eq!(first.sources_indexed, 3);
    assert_eq!(first.chunks_indexed, ids_first.len());
    let skipped: Vec<&str> = first.skipped.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(skipped, ["missing_guidance", "empty_notice"]);

    let second = b.ingest_file(&manifest_path).await.expect("ingest again");
    assert_eq!(second.chunks_indexed, first.chunks_indexed);
    assert_eq!(store.chunk_ids().await.expect("ids"), ids_first);
    assert_eq!(store.count().await.expect("count"), ids_first.len());
    assert_eq!(store.embedder().await.expect("stamp").as_deref(), Some("hash:d128"));
}

#[tokio::test]
async fn shrinking_source_drops_stale_chunks() {
    let tmp = tempfile::tempdir().expect("tmp");
    common::write_corpus(tmp.path());
    let store = Arc::new(MemoryCollection::new("adgm_sources"));
    let b = builder(tmp.path(), store.clone());
    let manifest = SourcesManifest::load(&tmp.path().join("data/sources_manifest.json")).expect("manifest");
    b.ingest(&manifest).await.expect("ingest");

    std::fs::write(tmp.path().join("data/sources/employment_regulations_2024.txt"), "Working hours are limited.")
        .expect("write");
    b.ingest(&manifest).await.expect("ingest");
    let ids = store.chunk_ids().await.expect("ids");
    let employment: Vec<&String> = ids.iter().filter(|id| id.starts_with("employment_regulations_2024_")).collect();
    assert_eq!(employment, ["employment_regulations_2024_0"]);
}

#[tokio::test]
async fn manifest_missing_id_indexes_nothing() {
    let tmp = tempfile::tempdir().expect("tmp");
    common::write_corpus(tmp.path());
    let bad = tmp.path().join("bad_manifest.json");
    std::fs::write(&bad, r#"{"sources": [{"title": "No id", "type": "regulation", "path": "jurisdiction.md"}]}"#)
        .expect("write");
    let store = Arc::new(MemoryCollection::new("adgm_sources"));
    let err = builder(tmp.path(), store.clone()).ingest_file(&bad).await.expect_err("must fail");
    assert!(matches!(err, Error::Manifest { .. }));
    assert_eq!(store.count().await.expect("count"), 0);
    assert!(!store.exists().await.expect("exists"));
}

/// Same vectors as the hash embedder under a different identity.
struct Renamed(HashEmbedder);

impl Embedder for Renamed {
    fn id(&self) -> &str { "hash-v2" }
    fn dim(&self) -> usize { self.0.dim() }
    fn max_len(&self) -> usize { self.0.max_len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { self.0.embed_batch(texts) }
}

#[tokio::test]
async fn switching_embedders_keeps_old_stamp_while_sources_are_skipped() {
    let tmp = tempfile::tempdir().expect("tmp");
    common::write_corpus(tmp.path());
    let store = Arc::new(MemoryCollection::new("adgm_sources"));
    let manifest = SourcesManifest::load(&tmp.path().join("data/sources_manifest.json")).expect("manifest");
    builder(tmp.path(), store.clone()).ingest(&manifest).await.expect("ingest");

    let renamed: Capability<Arc<dyn Embedder>> = Capability::Available(Arc::new(Renamed(HashEmbedder::new(common::DIM))));
    let switched = IndexBuilder::new(tmp.path(), ChunkingConfig::new(120, 20).expect("cfg"), renamed, store.clone())
        .expect("builder");
    let report = switched.ingest(&manifest).await.expect("ingest");
    assert_eq!(report.sources_indexed, 3);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(store.embedder().await.expect("stamp").as_deref(), Some("hash:d128"));

    let complete = SourcesManifest::new(
        manifest.all().iter().filter(|s| s.id != "missing_guidance" && s.id != "empty_notice").cloned().collect(),
    );
    let report = switched.ingest(&complete).await.expect("ingest");
    assert!(report.skipped.is_empty());
    assert_eq!(store.embedder().await.expect("stamp").as_deref(), Some("hash-v2"));
}

#[tokio::test]
async fn unavailable_embedder_is_fatal() {
    let tmp = tempfile::tempdir().expect("tmp");
    common::write_corpus(tmp.path());
    let store = Arc::new(MemoryCollection::new("adgm_sources"));
    let none: Capability<Arc<dyn Embedder>> = Capability::unavailable("no model files");
    let b = IndexBuilder::new(tmp.path(), ChunkingConfig::default(), none, store).expect("builder");
    let manifest = SourcesManifest::load(&tmp.path().join("data/sources_manifest.json")).expect("manifest");
    assert!(matches!(b.ingest(&manifest).await, Err(Error::Embedding(_))));
}

#[test]
fn inspect_reports_coverage_without_indexing() {
    let tmp = tempfile::tempdir().expect("tmp");
    common::write_corpus(tmp.path());
    let manifest = SourcesManifest::load(&tmp.path().join("data/sources_manifest.json")).expect("manifest");
    let reports = inspect(tmp.path(), &manifest);
    assert_eq!(reports.len(), 5);

    let companies = &reports[1];
    assert!(companies.exists);
    assert_eq!(companies.extension, ".html");
    assert!(companies.text_length > 0);

    let missing = &reports[3];
    assert!(!missing.exists);
    assert_eq!(missing.resolved, None);
    assert_eq!(missing.text_length, 0);

    let root_level = &reports[2];
    assert_eq!(root_level.resolved.as_deref(), Some(tmp.path().join("jurisdiction.md").as_path()));
}

#[test]
fn unlisted_corpus_files_are_reported() {
    let tmp = tempfile::tempdir().expect("tmp");
    common::write_corpus(tmp.path());
    let manifest = SourcesManifest::load(&tmp.path().join("data/sources_manifest.json")).expect("manifest");
    let orphans = unreferenced_files(tmp.path(), &manifest);
    assert_eq!(orphans, vec![tmp.path().join("data/sources/unlisted.pdf")]);
}
