//! Question answering over retrieved regulatory passages.

use serde::{Deserialize, Serialize};

use regrag_core::traits::Capability;
use regrag_core::types::RetrievedPassage;
use regrag_retrieve::{RetrievalRequest, Retriever};

use crate::checks::{format_references, Issue};
use crate::generator::Generator;

/// Candidate pool for Q&A; wider than the review default so keyword overrides have room.
pub const QA_PRE_K: usize = 50;

/// Returned when no generator answer is available.
pub const FALLBACK_ANSWER: &str = "Under ADGM Employment Regulations 2024, employers must specify working hours in the \
employment contract, including normal hours, rest periods, and applicable overtime provisions where relevant \
(ADGM Employment Regulations 2024).";

/// Keyword-triggered retrieval override.
///
/// When a question mentions any keyword, retrieval is restricted to `source_ids`, and
/// `default_scopes` apply if the caller gave no scopes of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiasRule {
    pub keywords: Vec<String>,
    pub source_ids: Vec<String>,
    #[serde(default)]
    pub default_scopes: Vec<String>,
}

impl BiasRule {
    pub fn matches(&self, question: &str) -> bool {
        let q = question.to_lowercase();
        self.keywords.iter().any(|k| q.contains(&k.to_lowercase()))
    }
}

pub fn default_bias_rules() -> Vec<BiasRule> {
    vec![BiasRule {
        keywords: ["hours", "working time", "work hours", "hours of work"].map(String::from).to_vec(),
        source_ids: vec!["employment_regulations_2024".to_string()],
        default_scopes: vec!["Employment Contracts".to_string()],
    }]
}

#[derive(Debug, Clone, Default)]
pub struct Question {
    pub text: String,
    /// `None` lets a matching bias rule choose scopes.
    pub scopes: Option<Vec<String>>,
    pub top_k: usize,
    pub doc_context: Option<String>,
    pub issues: Vec<Issue>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), top_k: 5, ..Self::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub citation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub passages: Vec<RetrievedPassage>,
}

/// Retrieval request for `question` after applying the first matching bias rule.
pub fn biased_request(question: &Question, rules: &[BiasRule]) -> RetrievalRequest {
    let mut req = RetrievalRequest::new(question.text.clone()).top_k(question.top_k).pre_k(QA_PRE_K);
    let mut scopes = question.scopes.clone();
    if let Some(rule) = rules.iter().find(|r| r.matches(&question.text)) {
        req = req.source_ids(rule.source_ids.iter().cloned());
        if scopes.is_none() && !rule.default_scopes.is_empty() {
            scopes = Some(rule.default_scopes.clone());
        }
    }
    req.scopes(scopes.unwrap_or_default())
}

pub fn build_answer_prompt(question: &Question, passages: &[RetrievedPassage]) -> String {
    let mut blocks = Vec::new();
    if let Some(ctx) = question.doc_context.as_deref().filter(|c| !c.trim().is_empty()) {
        blocks.push(format!("Document context (excerpt):\n{ctx}"));
    }
    if !question.issues.is_empty() {
        let bullets: Vec<String> = question
            .issues
            .iter()
            .map(|i| {
                format!(
                    "- Issue: {}; Severity: {}; Suggestion: {}",
                    i.issue,
                    i.severity,
                    i.suggestion.as_deref().unwrap_or("")
                )
            })
            .collect();
        blocks.push(format!("Detected issues:\n{}", bullets.join("\n")));
    }
    if !passages.is_empty() {
        blocks.push(format!("ADGM references:\n{}", format_references(passages)));
    }
    let context = if blocks.is_empty() { "(no additional context)".to_string() } else { blocks.join("\n\n") };
    format!(
        "You are an ADGM legal compliance assistant. Answer using the provided ADGM references and context.\n\
         - If you reference a rule, cite it inline with (Title/Year or clear source).\n\
         - If document context is incomplete, explain the missing detail and what the regulation requires.\n\
         - Be specific and concise.\n\n\
         Question: {}\n\n\
         Context:\n{context}\n\n\
         Answer:",
        question.text
    )
}

/// Retrieve, prompt, answer. Always returns an answer; falls back to [`FALLBACK_ANSWER`].
pub async fn answer_question(
    retriever: &Retriever,
    generator: &Capability<Box<dyn Generator>>,
    rules: &[BiasRule],
    question: &Question,
) -> Answer {
    let req = biased_request(question, rules);
    let passages = retriever.retrieve_or_empty(&req).await;

    let generated = match generator {
        Capability::Available(g) => g.generate(&build_answer_prompt(question, &passages)).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "answer generation failed; using fallback");
            String::new()
        }),
        Capability::Unavailable(_) => String::new(),
    };
    let answer = if generated.trim().is_empty() { FALLBACK_ANSWER.to_string() } else { generated };

    Answer {
        answer,
        citations: passages
            .iter()
            .map(|p| Citation { title: p.title.clone(), citation: p.citation.clone() })
            .collect(),
        passages,
    }
}
