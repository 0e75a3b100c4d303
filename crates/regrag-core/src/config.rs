//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml` +
//! `APP_*` env vars (`__` separates nesting, e.g. `APP_INDEX__CHUNK_SIZE`).
//! The resulting [`Settings`] value is built once and passed to every component.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(Path::new("."), &env_name)
    }

    /// Load `config.toml` and the env-specific overlay from `dir`.
    pub fn load_from(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed, validated settings.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub corpus: CorpusSettings,
    pub index: IndexSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub rerank: RerankSettings,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    pub root_dir: String,
    /// Relative to `root_dir` unless absolute.
    pub manifest: String,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self { root_dir: ".".to_string(), manifest: "data/sources_manifest.json".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub db_dir: String,
    pub collection: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            db_dir: "data/indexes/lancedb".to_string(),
            collection: "adgm_sources".to_string(),
            chunk_size: 800,
            chunk_overlap: 150,
            batch_size: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingBackend {
    BgeM3,
    /// Deterministic token-hash vectors; no model files needed.
    Hash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub model_dir: Option<String>,
    pub dim: usize,
    pub max_len: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { backend: EmbeddingBackend::BgeM3, model_dir: None, dim: 1024, max_len: 256 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub pre_k: usize,
    pub use_reranker: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 5, pre_k: 30, use_reranker: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RerankBackend {
    CrossEncoder,
    Lexical,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankSettings {
    pub backend: RerankBackend,
    pub model_dir: Option<String>,
    pub max_len: usize,
}

impl Default for RerankSettings {
    fn default() -> Self {
        Self { backend: RerankBackend::CrossEncoder, model_dir: None, max_len: 512 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LlmProvider {
    Disabled,
    Ollama,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Disabled,
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "llama3.1".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.index.chunk_size == 0 {
            return Err(Error::InvalidConfig("index.chunk_size must be > 0".into()));
        }
        if self.index.chunk_overlap >= self.index.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "index.chunk_overlap ({}) must be smaller than index.chunk_size ({})",
                self.index.chunk_overlap, self.index.chunk_size
            )));
        }
        if self.index.batch_size == 0 {
            return Err(Error::InvalidConfig("index.batch_size must be > 0".into()));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be > 0".into()));
        }
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be > 0".into()));
        }
        Ok(())
    }

    pub fn corpus_root(&self) -> PathBuf {
        expand_path(&self.corpus.root_dir)
    }

    pub fn manifest_path(&self) -> PathBuf {
        resolve_with_base(&self.corpus_root(), &self.corpus.manifest)
    }

    pub fn db_path(&self) -> PathBuf {
        resolve_with_base(&self.corpus_root(), &self.index.db_dir)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = Settings::default();
        s.validate().expect("defaults validate");
        assert_eq!(s.index.chunk_size, 800);
        assert_eq!(s.index.chunk_overlap, 150);
        assert_eq!(s.retrieval.pre_k, 30);
    }

    #[test]
    fn overlap_not_smaller_than_size_is_rejected() {
        let mut s = Settings::default();
        s.index.chunk_overlap = s.index.chunk_size;
        assert!(matches!(s.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn toml_overlay_overrides_defaults() {
        let tmp = tempfile::tempdir().expect("tmp");
        std::fs::write(
            tmp.path().join("config.toml"),
            "[index]\nchunk_size = 400\nchunk_overlap = 40\n\n[embedding]\nbackend = \"hash\"\n",
        )
        .expect("write");
        std::fs::write(tmp.path().join("config.test.toml"), "[retrieval]\ntop_k = 3\n").expect("write");

        let config = Config::load_from(tmp.path(), "test").expect("load");
        let s = config.settings().expect("settings");
        assert_eq!(s.index.chunk_size, 400);
        assert_eq!(s.index.chunk_overlap, 40);
        assert_eq!(s.embedding.backend, EmbeddingBackend::Hash);
        assert_eq!(s.retrieval.top_k, 3);
        // untouched keys keep their defaults
        assert_eq!(s.index.collection, "adgm_sources");
        let size: usize = config.get("index.chunk_size").expect("get");
        assert_eq!(size, 400);
    }

    #[test]
    fn invalid_overlay_fails_to_load() {
        let tmp = tempfile::tempdir().expect("tmp");
        std::fs::write(tmp.path().join("config.toml"), "[index]\nchunk_size = 100\nchunk_overlap = 100\n").expect("write");
        assert!(Config::load_from(tmp.path(), "dev").is_err());
    }

    #[test]
    fn resolve_relative_and_absolute() {
        let base = Path::new("/corpus");
        assert_eq!(resolve_with_base(base, "data/x.json"), PathBuf::from("/corpus/data/x.json"));
        assert_eq!(resolve_with_base(base, "/abs/x.json"), PathBuf::from("/abs/x.json"));
    }
}
