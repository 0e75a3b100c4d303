use std::sync::Arc;

use regrag_core::error::{Error, Result};
use regrag_core::traits::{Capability, Reranker};
use regrag_core::types::RetrievedPassage;

/// Reorder `candidates` by descending pairwise score. Ties keep their incoming order.
///
/// Only the order changes; each passage keeps its embedding similarity as `score`.
pub fn rerank(query: &str, candidates: &[RetrievedPassage], reranker: &dyn Reranker) -> Result<Vec<RetrievedPassage>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let texts: Vec<&str> = candidates.iter().map(|p| p.text.as_str()).collect();
    let scores = reranker.score(query, &texts).map_err(|e| Error::Rerank(format!("{e:#}")))?;
    if scores.len() != candidates.len() {
        return Err(Error::Rerank(format!(
            "{} returned {} scores for {} passages",
            reranker.id(),
            scores.len(),
            candidates.len()
        )));
    }
    let mut ranked: Vec<(f32, &RetrievedPassage)> = scores
        .into_iter()
        .map(|s| if s.is_nan() { f32::NEG_INFINITY } else { s })
        .zip(candidates)
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    Ok(ranked.into_iter().map(|(_, p)| p.clone()).collect())
}

/// Best effort: any unavailability or failure leaves `candidates` as they were.
pub fn rerank_or_keep(
    query: &str,
    candidates: Vec<RetrievedPassage>,
    reranker: &Capability<Arc<dyn Reranker>>,
) -> Vec<RetrievedPassage> {
    let Capability::Available(r) = reranker else {
        return candidates;
    };
    match rerank(query, &candidates, r.as_ref()) {
        Ok(ranked) => ranked,
        Err(e) => {
            tracing::warn!(error = %e, "re-ranking skipped");
            candidates
        }
    }
}
