//! regrag-embed
//!
//! Embedding and re-ranking backends. Each backend is negotiated once through
//! [`load_embedder`] / [`rerank::load_reranker`] and handed out as a [`Capability`].

use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{XLMRobertaModel, Config as XLMRobertaConfig};
use tokenizers::Tokenizer;

use regrag_core::config::{EmbeddingBackend, EmbeddingSettings};
use regrag_core::traits::{Capability, Embedder};

pub mod device;
pub mod pool;
pub mod rerank;
pub mod tokenize;

pub use pool::masked_mean_l2;

/// BGE-M3 (XLM-RoBERTa) sentence embeddings with masked mean pooling.
pub struct BgeM3Embedder { model: XLMRobertaModel, tokenizer: Tokenizer, device: Device, id: String, dim: usize, max_len: usize }

impl BgeM3Embedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let device = device::select_device();
        let model_dir = resolve_model_dir(settings.model_dir.as_deref(), "bge-m3")?;
        tracing::info!(dir = %model_dir.display(), "loading BGE-M3 model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let weights_path = model_dir.join("pytorch_model.bin");
        let weights = candle_core::pickle::read_all(&weights_path)?;
        let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        tracing::info!("BGE-M3 model loaded");
        Ok(Self { model, tokenizer, device, id: format!("bge-m3:d{}", settings.dim), dim: settings.dim, max_len: settings.max_len })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize::tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden_states = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden_states, &attention_mask)?;
        let emb = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?;
        if emb.len() != self.dim {
            return Err(anyhow!("model produced {} dims, configured for {}", emb.len(), self.dim));
        }
        if start.elapsed().as_millis() > 100 { tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "slow embedding"); }
        Ok(emb)
    }
}

impl Embedder for BgeM3Embedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { texts.iter().map(|t| self.embed_text(t)).collect() }
}

/// Deterministic bag-of-tokens hashing embedder.
///
/// Texts sharing words land close together, which is enough for tests and for
/// running the pipeline without model files.
pub struct HashEmbedder { dim: usize, id: String }

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim, id: format!("hash:d{dim}") } }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        for token in tokens {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let val = 0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for HashEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_text(t)).collect()) }
}

/// Negotiate the configured embedding backend once.
pub fn load_embedder(settings: &EmbeddingSettings) -> Capability<Box<dyn Embedder>> {
    let cap: Capability<Box<dyn Embedder>> = match settings.backend {
        EmbeddingBackend::Hash => Capability::Available(Box::new(HashEmbedder::new(settings.dim))),
        EmbeddingBackend::BgeM3 => BgeM3Embedder::new(settings).map(|m| Box::new(m) as Box<dyn Embedder>).into(),
    };
    match &cap {
        Capability::Available(e) => tracing::info!(embedder = e.id(), "embedding backend available"),
        Capability::Unavailable(reason) => tracing::warn!(%reason, "embedding backend unavailable"),
    }
    cap
}

/// Locate a model directory: explicit setting first, then `models/<name>` and `../models/<name>`.
pub fn resolve_model_dir(configured: Option<&str>, name: &str) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = regrag_core::config::expand_path(dir);
        if p.exists() { return Ok(p); }
        return Err(anyhow!("Configured model directory {} does not exist", p.display()));
    }
    for candidate in [Path::new("models").join(name), Path::new("../models").join(name)] {
        if candidate.exists() { return Ok(candidate); }
    }
    Err(anyhow!("Could not locate {} model directory", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_dir_is_unavailable_not_fatal() {
        let settings = EmbeddingSettings { model_dir: Some("/definitely/not/here".into()), ..EmbeddingSettings::default() };
        let cap = load_embedder(&settings);
        assert!(!cap.is_available());
        assert!(cap.reason().is_some_and(|r| r.contains("does not exist")));
    }

    #[test]
    fn hash_backend_is_always_available() {
        let settings = EmbeddingSettings { backend: EmbeddingBackend::Hash, dim: 64, ..EmbeddingSettings::default() };
        let cap = load_embedder(&settings);
        let e = cap.get().expect("available");
        assert_eq!(e.dim(), 64);
        assert_eq!(e.id(), "hash:d64");
    }
}
