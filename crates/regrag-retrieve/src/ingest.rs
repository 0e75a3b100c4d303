//! Batch ingestion of the regulatory corpus into a vector collection.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regrag_core::chunker::{chunk_source, ChunkingConfig};
use regrag_core::config::{expand_path, Settings};
use regrag_core::error::{Error, Result};
use regrag_core::extract::{extension_label, extract, SourceFormat};
use regrag_core::manifest::SourcesManifest;
use regrag_core::traits::{Capability, Embedder, VectorStore};
use regrag_core::types::{Chunk, SourceEntry, SourceReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSource {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub chunks_indexed: usize,
    pub sources_indexed: usize,
    pub skipped: Vec<SkippedSource>,
}

/// First existing candidate among `root/rel` and `root/data/rel`. Absolute paths are taken as-is.
pub fn resolve_source_path(root: &Path, rel: &str) -> Option<PathBuf> {
    let rel = expand_path(rel);
    if rel.is_absolute() {
        return rel.exists().then_some(rel);
    }
    [root.join(&rel), root.join("data").join(&rel)].into_iter().find(|p| p.exists())
}

pub struct IndexBuilder {
    root: PathBuf,
    chunking: ChunkingConfig,
    batch_size: usize,
    embedder: Capability<Arc<dyn Embedder>>,
    store: Arc<dyn VectorStore>,
    progress: bool,
}

impl IndexBuilder {
    pub fn new(
        root: impl Into<PathBuf>,
        chunking: ChunkingConfig,
        embedder: Capability<Arc<dyn Embedder>>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        chunking.validate()?;
        Ok(Self { root: root.into(), chunking, batch_size: 64, embedder, store, progress: false })
    }

    pub fn from_settings(
        settings: &Settings,
        embedder: Capability<Arc<dyn Embedder>>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let chunking = ChunkingConfig::new(settings.index.chunk_size, settings.index.chunk_overlap)?;
        Ok(Self::new(settings.corpus_root(), chunking, embedder, store)?.with_batch_size(settings.index.batch_size))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Draw a progress bar on stderr while ingesting.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Load the manifest at `path` and ingest it. A manifest error aborts before anything is written.
    pub async fn ingest_file(&self, manifest_path: &Path) -> Result<IngestReport> {
        let manifest = SourcesManifest::load(manifest_path)?;
        self.ingest(&manifest).await
    }

    /// Upsert every usable source. Per-source problems are skipped; store failures abort.
    pub async fn ingest(&self, manifest: &SourcesManifest) -> Result<IngestReport> {
        let embedder = match &self.embedder {
            Capability::Available(e) => e.clone(),
            Capability::Unavailable(reason) => {
                return Err(Error::Embedding(format!("embedding backend unavailable: {reason}")));
            }
        };
        let previous = self.store.embedder().await?;
        let restamping = previous.as_deref().is_some_and(|stamp| stamp != embedder.id());
        if restamping {
            tracing::warn!(stamp = previous.as_deref().unwrap_or_default(), embedder = embedder.id(), "collection was built by a different embedder");
        }

        tracing::info!(sources = manifest.len(), collection = self.store.name(), "ingesting corpus");
        let pb = self.progress_bar(manifest.len());
        let mut report = IngestReport::default();
        for source in manifest.all() {
            pb.set_message(source.id.clone());
            match self.prepare(source, embedder.as_ref()) {
                Ok((chunks, vectors)) => {
                    let written = self.store.upsert(&chunks, &vectors).await?;
                    self.store.prune_source(&source.id, chunks.len()).await?;
                    tracing::debug!(source = %source.id, chunks = written, "indexed source");
                    report.chunks_indexed += written;
                    report.sources_indexed += 1;
                }
                Err(reason) => {
                    tracing::warn!(source = %source.id, %reason, "skipping source");
                    report.skipped.push(SkippedSource { id: source.id.clone(), reason });
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        // Skipped sources still hold vectors from the previous embedder, so the old stamp must stay.
        if restamping && !report.skipped.is_empty() {
            tracing::warn!(
                skipped = report.skipped.len(),
                "collection keeps its previous embedder stamp; re-ingest the skipped sources to switch embedders"
            );
        } else if report.sources_indexed > 0 {
            self.store.set_embedder(embedder.id()).await?;
        }
        tracing::info!(
            chunks = report.chunks_indexed,
            sources = report.sources_indexed,
            skipped = report.skipped.len(),
            "ingestion finished"
        );
        Ok(report)
    }

    /// Resolve, extract, chunk and embed one source. `Err` carries the skip reason.
    fn prepare(&self, source: &SourceEntry, embedder: &dyn Embedder) -> std::result::Result<(Vec<Chunk>, Vec<Vec<f32>>), String> {
        let path = resolve_source_path(&self.root, &source.path)
            .ok_or_else(|| format!("file not found: {}", source.path))?;
        let text = extract(&path);
        if text.trim().is_empty() {
            return Err(format!("no extractable text in {}", path.display()));
        }
        let chunks = chunk_source(source, &text, &self.chunking).map_err(|e| e.to_string())?;
        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embedded = embedder.embed_batch(&texts).map_err(|e| format!("embedding failed: {e:#}"))?;
            if embedded.len() != batch.len() {
                return Err(format!("embedder returned {} vectors for {} chunks", embedded.len(), batch.len()));
            }
            vectors.extend(embedded);
        }
        Ok((chunks, vectors))
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} sources {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

/// Per-source coverage report. Reads files but never touches the index.
pub fn inspect(root: &Path, manifest: &SourcesManifest) -> Vec<SourceReport> {
    manifest
        .all()
        .iter()
        .map(|source| {
            let resolved = resolve_source_path(root, &source.path);
            let (extension, text_length) = match &resolved {
                Some(p) => (extension_label(p), extract(p).chars().count()),
                None => (String::new(), 0),
            };
            SourceReport {
                id: source.id.clone(),
                path: source.path.clone(),
                exists: resolved.is_some(),
                resolved,
                extension,
                text_length,
            }
        })
        .collect()
}

/// Extractable files under `root/data` that no manifest entry resolves to.
pub fn unreferenced_files(root: &Path, manifest: &SourcesManifest) -> Vec<PathBuf> {
    let canonical = |p: &Path| std::fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
    let referenced: HashSet<PathBuf> = manifest
        .all()
        .iter()
        .filter_map(|s| resolve_source_path(root, &s.path))
        .map(|p| canonical(&p))
        .collect();

    let mut orphans: Vec<PathBuf> = walkdir::WalkDir::new(root.join("data"))
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| is_corpus_file(p))
        .filter(|p| !referenced.contains(&canonical(p)))
        .collect();
    orphans.sort();
    orphans
}

fn is_corpus_file(path: &Path) -> bool {
    match SourceFormat::from_path(path) {
        SourceFormat::Plain => matches!(extension_label(path).as_str(), ".txt" | ".md"),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_prefers_root_then_data() {
        let tmp = tempfile::tempdir().expect("tmp");
        let root = tmp.path();
        std::fs::create_dir_all(root.join("data/sources")).expect("mkdir");
        std::fs::write(root.join("data/sources/a.txt"), "a").expect("write");
        assert_eq!(resolve_source_path(root, "sources/a.txt"), Some(root.join("data/sources/a.txt")));

        std::fs::create_dir_all(root.join("sources")).expect("mkdir");
        std::fs::write(root.join("sources/a.txt"), "a").expect("write");
        assert_eq!(resolve_source_path(root, "sources/a.txt"), Some(root.join("sources/a.txt")));

        assert_eq!(resolve_source_path(root, "sources/none.txt"), None);
    }

    #[test]
    fn absolute_paths_are_used_as_is() {
        let tmp = tempfile::tempdir().expect("tmp");
        let other = tempfile::tempdir().expect("tmp");
        let file = other.path().join("regs.txt");
        std::fs::write(&file, "x").expect("write");
        let abs = file.to_string_lossy().to_string();
        assert_eq!(resolve_source_path(tmp.path(), &abs), Some(file));
    }

    #[test]
    fn corpus_file_detection() {
        assert!(is_corpus_file(Path::new("a.pdf")));
        assert!(is_corpus_file(Path::new("a.HTML")));
        assert!(is_corpus_file(Path::new("a.txt")));
        assert!(!is_corpus_file(Path::new("sources_manifest.json")));
        assert!(!is_corpus_file(Path::new("README")));
    }
}
