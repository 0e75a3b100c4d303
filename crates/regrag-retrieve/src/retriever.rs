use std::sync::Arc;

use regrag_core::config::{RetrievalSettings, Settings};
use regrag_core::error::{Error, Result};
use regrag_core::traits::{Capability, Embedder, Reranker, VectorStore};
use regrag_core::types::RetrievedPassage;
use regrag_vector::LanceCollection;

use crate::filter;
use crate::rerank::rerank_or_keep;

/// One query against the collection. Empty `scopes`/`source_ids` mean "no filter".
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalRequest {
    pub query: String,
    pub top_k: usize,
    pub pre_k: usize,
    pub scopes: Vec<String>,
    pub source_ids: Vec<String>,
    pub rerank: bool,
}

impl RetrievalRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self::with_defaults(query, &RetrievalSettings::default())
    }

    pub fn with_defaults(query: impl Into<String>, defaults: &RetrievalSettings) -> Self {
        Self {
            query: query.into(),
            top_k: defaults.top_k,
            pre_k: defaults.pre_k,
            scopes: Vec::new(),
            source_ids: Vec::new(),
            rerank: defaults.use_reranker,
        }
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn pre_k(mut self, pre_k: usize) -> Self {
        self.pre_k = pre_k;
        self
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn source_ids<I, S>(mut self, source_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_ids = source_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn rerank(mut self, rerank: bool) -> Self {
        self.rerank = rerank;
        self
    }

    /// Size of the broad nearest-neighbour pull.
    pub fn candidate_pool(&self) -> usize {
        self.pre_k.max(self.top_k)
    }
}

pub struct Retriever {
    embedder: Capability<Arc<dyn Embedder>>,
    store: Arc<dyn VectorStore>,
    reranker: Capability<Arc<dyn Reranker>>,
}

impl Retriever {
    pub fn new(
        embedder: Capability<Arc<dyn Embedder>>,
        store: Arc<dyn VectorStore>,
        reranker: Capability<Arc<dyn Reranker>>,
    ) -> Self {
        Self { embedder, store, reranker }
    }

    /// Negotiate every backend named in `settings` and open the persisted collection.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let embedder: Capability<Arc<dyn Embedder>> = regrag_embed::load_embedder(&settings.embedding).map(Arc::from);
        let reranker: Capability<Arc<dyn Reranker>> = if settings.retrieval.use_reranker {
            regrag_embed::rerank::load_reranker(&settings.rerank).map(Arc::from)
        } else {
            Capability::unavailable("re-ranking disabled by retrieval.use_reranker")
        };
        let store: Arc<dyn VectorStore> = Arc::new(LanceCollection::from_settings(settings).await?);
        Ok(Self::new(embedder, store, reranker))
    }

    pub fn embedder(&self) -> &Capability<Arc<dyn Embedder>> {
        &self.embedder
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn reranker(&self) -> &Capability<Arc<dyn Reranker>> {
        &self.reranker
    }

    /// Nearest neighbours, filtered and optionally re-ranked, truncated to `top_k`.
    pub async fn retrieve(&self, req: &RetrievalRequest) -> Result<Vec<RetrievedPassage>> {
        let embedder = match &self.embedder {
            Capability::Available(e) => e,
            Capability::Unavailable(reason) => {
                return Err(Error::IndexUnavailable(format!("no embedding backend: {reason}")));
            }
        };
        if !self.store.exists().await? {
            return Err(Error::IndexUnavailable(format!("collection '{}' has not been built", self.store.name())));
        }
        if let Some(stamp) = self.store.embedder().await? {
            if stamp != embedder.id() {
                return Err(Error::IndexUnavailable(format!(
                    "collection '{}' was built with {stamp}, query embedder is {}",
                    self.store.name(),
                    embedder.id()
                )));
            }
        }
        if req.top_k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = embedder
            .embed_batch(std::slice::from_ref(&req.query))
            .map_err(Error::embedding)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("embedder returned no vector for the query".into()))?;
        let candidates = self.store.nearest(&query_vec, req.candidate_pool()).await?;
        let pulled = candidates.len();
        let candidates = filter::apply(candidates, &req.scopes, &req.source_ids);
        let mut passages = if req.rerank {
            rerank_or_keep(&req.query, candidates, &self.reranker)
        } else {
            candidates
        };
        passages.truncate(req.top_k);
        tracing::debug!(pulled, returned = passages.len(), "retrieval finished");
        Ok(passages)
    }

    /// [`Self::retrieve`], with any failure logged and turned into an empty result.
    pub async fn retrieve_or_empty(&self, req: &RetrievalRequest) -> Vec<RetrievedPassage> {
        match self.retrieve(req).await {
            Ok(passages) => passages,
            Err(e) => {
                tracing::warn!(error = %e, "retrieval unavailable; continuing without passages");
                Vec::new()
            }
        }
    }
}
