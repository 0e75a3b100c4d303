//! Declarative catalogue of regulatory sources (`sources_manifest.json`).

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::SourceEntry;

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    sources: Vec<SourceEntry>,
}

/// Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcesManifest {
    sources: Vec<SourceEntry>,
}

impl SourcesManifest {
    pub fn new(sources: Vec<SourceEntry>) -> Self {
        Self { sources }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let manifest_err = |reason: String| Error::Manifest { path: path.to_path_buf(), reason };
        let content = std::fs::read_to_string(path).map_err(|e| manifest_err(e.to_string()))?;
        let raw: RawManifest = serde_json::from_str(&content).map_err(|e| manifest_err(e.to_string()))?;

        let mut seen = HashSet::new();
        for (i, s) in raw.sources.iter().enumerate() {
            for (field, value) in [("id", &s.id), ("title", &s.title), ("type", &s.kind), ("path", &s.path)] {
                if value.trim().is_empty() {
                    return Err(manifest_err(format!("source #{i} has an empty `{field}`")));
                }
            }
            if !seen.insert(s.id.as_str()) {
                return Err(manifest_err(format!("duplicate source id `{}`", s.id)));
            }
        }
        tracing::debug!(path = %path.display(), sources = raw.sources.len(), "loaded sources manifest");
        Ok(Self { sources: raw.sources })
    }

    pub fn find(&self, id: &str) -> Option<&SourceEntry> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn by_type(&self, kind: &str) -> Vec<&SourceEntry> {
        self.sources.iter().filter(|s| s.kind == kind).collect()
    }

    pub fn all(&self) -> &[SourceEntry] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
