//! Pairwise relevance scorers used by the re-ranking stage.

use anyhow::{Result, anyhow};
use std::collections::HashSet;

use candle_core::{DType, Device, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use regrag_core::config::{RerankBackend, RerankSettings};
use regrag_core::traits::{Capability, Reranker};

use crate::tokenize::tokenize_pair_on_device;

/// BERT cross-encoder (e.g. ms-marco MiniLM): `[CLS] query [SEP] passage [SEP]` -> logit.
pub struct CrossEncoderReranker {
    model: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
    id: String,
}

impl CrossEncoderReranker {
    pub fn new(settings: &RerankSettings) -> Result<Self> {
        let device = crate::device::select_device();
        let model_dir = crate::resolve_model_dir(settings.model_dir.as_deref(), "ms-marco-MiniLM-L-6-v2")?;
        tracing::info!(dir = %model_dir.display(), "loading cross-encoder");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let raw_config = std::fs::read_to_string(model_dir.join("config.json"))?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let hidden_size = serde_json::from_str::<serde_json::Value>(&raw_config)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| anyhow!("config.json has no hidden_size"))? as usize;
        let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
        let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = BertModel::load(vb.pp("bert"), &config)?;
        let pooler = candle_nn::linear(hidden_size, hidden_size, vb.pp("bert.pooler.dense"))?;
        let classifier = candle_nn::linear(hidden_size, 1, vb.pp("classifier"))?;
        let id = format!("cross-encoder:{}", model_dir.file_name().and_then(|n| n.to_str()).unwrap_or("bert"));
        Ok(Self { model, pooler, classifier, tokenizer, device, max_len: settings.max_len, id })
    }

    fn score_pair(&self, query: &str, passage: &str) -> Result<f32> {
        let (input_ids, token_type_ids, attention_mask) =
            tokenize_pair_on_device(&self.tokenizer, query, passage, self.max_len, &self.device)?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?.flatten_all()?.to_vec1::<f32>()?;
        logits.first().copied().ok_or_else(|| anyhow!("classifier produced no logit"))
    }
}

impl Reranker for CrossEncoderReranker {
    fn id(&self) -> &str { &self.id }

    fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        passages.iter().map(|p| self.score_pair(query, p)).collect()
    }
}

/// Fraction of distinct query terms that occur in the passage.
pub struct LexicalReranker;

impl LexicalReranker {
    fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric()).filter(|t| t.len() > 1).map(str::to_lowercase)
    }
}

impl Reranker for LexicalReranker {
    fn id(&self) -> &str { "lexical" }

    fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        let query_terms: HashSet<String> = Self::terms(query).collect();
        if query_terms.is_empty() {
            return Ok(vec![0.0; passages.len()]);
        }
        Ok(passages
            .iter()
            .map(|p| {
                let passage_terms: HashSet<String> = Self::terms(p).collect();
                let hits = query_terms.iter().filter(|t| passage_terms.contains(*t)).count();
                hits as f32 / query_terms.len() as f32
            })
            .collect())
    }
}

/// Negotiate the configured re-ranking backend once.
pub fn load_reranker(settings: &RerankSettings) -> Capability<Box<dyn Reranker>> {
    let cap: Capability<Box<dyn Reranker>> = match settings.backend {
        RerankBackend::None => Capability::unavailable("re-ranking disabled by configuration"),
        RerankBackend::Lexical => Capability::Available(Box::new(LexicalReranker)),
        RerankBackend::CrossEncoder => CrossEncoderReranker::new(settings).map(|r| Box::new(r) as Box<dyn Reranker>).into(),
    };
    match &cap {
        Capability::Available(r) => tracing::info!(reranker = r.id(), "re-ranking backend available"),
        Capability::Unavailable(reason) => tracing::info!(%reason, "re-ranking backend unavailable"),
    }
    cap
}
