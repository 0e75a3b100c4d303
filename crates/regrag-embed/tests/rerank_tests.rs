use regrag_core::config::{RerankBackend, RerankSettings};
use regrag_core::traits::Reranker;
use regrag_embed::rerank::{load_reranker, LexicalReranker};

#[test]
fn lexical_scores_fraction_of_query_terms() {
    let r = LexicalReranker;
    let scores = r
        .score(
            "working hours overtime",
            &["Normal working hours are eight per day.", "Overtime and working hours rules.", "Register of members."],
        )
        .expect("score");
    assert_eq!(scores.len(), 3);
    assert!((scores[0] - 2.0 / 3.0).abs() < 1e-6);
    assert!((scores[1] - 1.0).abs() < 1e-6);
    assert_eq!(scores[2], 0.0);
}

#[test]
fn lexical_with_empty_query_scores_zero() {
    let scores = LexicalReranker.score("?", &["a passage", "another"]).expect("score");
    assert_eq!(scores, vec![0.0, 0.0]);
}

#[test]
fn backend_selection() {
    let none = load_reranker(&RerankSettings { backend: RerankBackend::None, ..RerankSettings::default() });
    assert!(!none.is_available());

    let lexical = load_reranker(&RerankSettings { backend: RerankBackend::Lexical, ..RerankSettings::default() });
    assert_eq!(lexical.get().map(|r| r.id()), Some("lexical"));

    let missing = load_reranker(&RerankSettings {
        backend: RerankBackend::CrossEncoder,
        model_dir: Some("/no/such/cross-encoder".into()),
        ..RerankSettings::default()
    });
    assert!(!missing.is_available());
}
