use crate::error::{Error, Result};
use crate::types::{Chunk, SourceEntry};

/// Window size and overlap, both in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { size: 800, overlap: 150 }
    }
}

impl ChunkingConfig {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        let cfg = Self { size, overlap };
        cfg.validate()?;
        Ok(cfg)
    }

    /// `overlap < size` guarantees every step advances.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidConfig("chunk size must be > 0".into()));
        }
        if self.overlap >= self.size {
            return Err(Error::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.size
            )));
        }
        Ok(())
    }

    fn step(&self) -> usize {
        self.size - self.overlap
    }
}

/// Split `text` into windows of `size` characters where each window starts `overlap`
/// characters before the previous one ended. The last window ends at the end of `text`.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<String>> {
    let cfg = ChunkingConfig::new(size, overlap)?;
    if text.is_empty() {
        return Ok(Vec::new());
    }

    // Byte offset of every char boundary, plus the end, so windows never split a code point.
    let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let total_chars = bounds.len() - 1;

    let mut chunks = Vec::with_capacity(total_chars / cfg.step() + 1);
    let mut start = 0usize;
    loop {
        let end = (start + cfg.size).min(total_chars);
        chunks.push(text[bounds[start]..bounds[end]].to_string());
        if end == total_chars {
            break;
        }
        start = end - cfg.overlap;
    }
    Ok(chunks)
}

/// Chunk one source's extracted text and attach the source's metadata to every window.
pub fn chunk_source(source: &SourceEntry, text: &str, cfg: &ChunkingConfig) -> Result<Vec<Chunk>> {
    let scope = source.flattened_scope();
    let chunks = chunk_text(text, cfg.size, cfg.overlap)?
        .into_iter()
        .enumerate()
        .map(|(ordinal, text)| Chunk {
            id: Chunk::make_id(&source.id, ordinal),
            text,
            source_id: source.id.clone(),
            title: source.title.clone(),
            kind: source.kind.clone(),
            citation: source.citation.clone(),
            scope: scope.clone(),
            ordinal,
        })
        .collect();
    Ok(chunks)
}
