//! Retrieval-grounded compliance review of a single document.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use regrag_core::traits::Capability;
use regrag_core::types::RetrievedPassage;
use regrag_retrieve::{RetrievalRequest, Retriever};

use crate::generator::Generator;

/// Longest document excerpt placed in a prompt, in characters.
pub const MAX_EXCERPT_CHARS: usize = 12_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub document: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub issue: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default)]
    pub suggestion: Option<String>,
}

fn default_severity() -> String {
    "Info".to_string()
}

/// Retrieval query and scope tags used when reviewing one document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckPlan {
    pub query: &'static str,
    pub scopes: &'static [&'static str],
}

pub fn plan_for(doc_type: &str) -> CheckPlan {
    match doc_type {
        "Employment Contract" => CheckPlan {
            query: "ADGM Employment Regulations 2024 mandatory employment contract terms and governing law clause",
            scopes: &["Employment Contracts"],
        },
        "Articles of Association" => CheckPlan {
            query: "ADGM Companies Regulations 2020 Articles of Association must be in a single document and paragraphs numbered consecutively",
            scopes: &["AoA", "Company Incorporation"],
        },
        _ => CheckPlan {
            query: "ADGM model jurisdiction clause governed by ADGM law and ADGM Courts",
            scopes: &["Jurisdiction/Choice-of-Law"],
        },
    }
}

/// `[Source: {title}; {citation}]` header followed by the passage text.
pub fn format_reference(passage: &RetrievedPassage) -> String {
    format!("[Source: {}; {}]\n{}", passage.title, passage.citation, passage.text)
}

pub fn format_references(passages: &[RetrievedPassage]) -> String {
    passages.iter().map(format_reference).collect::<Vec<_>>().join("\n\n")
}

pub fn build_issue_prompt(document_text: &str, doc_type: &str, passages: &[RetrievedPassage]) -> String {
    let excerpt: String = document_text.chars().take(MAX_EXCERPT_CHARS).collect();
    format!(
        "You are an ADGM legal compliance checker. Using the retrieved ADGM sources, \
         identify concrete red flags in the document. Cite the exact ADGM rule in parentheses.\n\n\
         Document type: {doc_type}\n\n\
         Document (excerpt):\n{excerpt}\n\n\
         Retrieved ADGM references:\n{}\n\n\
         Respond in JSON array of objects with keys: section (optional), issue, severity (High/Medium/Low), suggestion.",
        format_references(passages)
    )
}

fn fenced_json() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\[.*?\])\s*```").ok()).as_ref()
}

/// Issues from a model reply: a JSON array, optionally inside a code fence.
///
/// Anything unparseable yields no issues; items without an `issue` text are dropped.
pub fn parse_issues(reply: &str) -> Vec<Issue> {
    let reply = reply.trim();
    let body = fenced_json()
        .and_then(|re| re.captures(reply))
        .and_then(|c| c.get(1))
        .map_or(reply, |m| m.as_str());
    match serde_json::from_str::<Vec<Issue>>(body) {
        Ok(issues) => issues.into_iter().filter(|i| !i.issue.trim().is_empty()).collect(),
        Err(e) => {
            tracing::debug!(error = %e, "model reply is not an issue list");
            Vec::new()
        }
    }
}

/// Ask the generator for issues grounded in passages retrieved for `doc_type`.
///
/// With no retrieved passages the generator is still asked, against an empty reference block.
/// Returns no issues when the generator is unavailable or fails.
pub async fn review_document(
    retriever: &Retriever,
    generator: &Capability<Box<dyn Generator>>,
    document_name: &str,
    doc_type: &str,
    document_text: &str,
) -> Vec<Issue> {
    let plan = plan_for(doc_type);
    let req = RetrievalRequest::new(plan.query).top_k(5).pre_k(30).scopes(plan.scopes.iter().copied());
    let Capability::Available(generator) = generator else {
        return Vec::new();
    };
    let passages = retriever.retrieve_or_empty(&req).await;
    if passages.is_empty() {
        tracing::info!(document = document_name, "no regulatory passages retrieved; reviewing without references");
    }
    let reply = match generator.generate(&build_issue_prompt(document_text, doc_type, &passages)) {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(document = document_name, error = %e, "issue generation failed");
            return Vec::new();
        }
    };
    parse_issues(&reply)
        .into_iter()
        .map(|issue| Issue { document: document_name.to_string(), ..issue })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage() -> RetrievedPassage {
        RetrievedPassage {
            id: "emp_3".into(),
            text: "Every contract must state normal working hours.".into(),
            title: "Employment Regulations 2024".into(),
            citation: "ADGM Employment Regulations 2024, s. 12".into(),
            source_id: "emp".into(),
            kind: "regulation".into(),
            scope: "Employment Contracts".into(),
            score: 0.9,
        }
    }

    #[test]
    fn reference_keeps_title_and_citation_verbatim() {
        assert_eq!(
            format_reference(&passage()),
            "[Source: Employment Regulations 2024; ADGM Employment Regulations 2024, s. 12]\n\
             Every contract must state normal working hours."
        );
    }

    #[test]
    fn plans_by_document_type() {
        assert_eq!(plan_for("Employment Contract").scopes, ["Employment Contracts"]);
        assert_eq!(plan_for("Articles of Association").scopes, ["AoA", "Company Incorporation"]);
        assert_eq!(plan_for("Board Resolution").scopes, ["Jurisdiction/Choice-of-Law"]);
    }

    #[test]
    fn prompt_truncates_long_documents() {
        let doc = "x".repeat(MAX_EXCERPT_CHARS + 500);
        let prompt = build_issue_prompt(&doc, "Employment Contract", &[passage()]);
        assert!(prompt.contains(&"x".repeat(MAX_EXCERPT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_EXCERPT_CHARS + 1)));
        assert!(prompt.contains("[Source: Employment Regulations 2024;"));
    }

    #[test]
    fn prompt_without_passages_has_empty_reference_block() {
        let prompt = build_issue_prompt("Clause 1.", "Employment Contract", &[]);
        assert!(prompt.contains("Retrieved ADGM references:\n\n\nRespond in JSON array"));
        assert!(prompt.contains("Document (excerpt):\nClause 1."));
    }

    #[test]
    fn parses_fenced_and_bare_arrays() {
        let fenced = "Here you go:\n```json\n[{\"issue\": \"No governing law\", \"severity\": \"High\", \"suggestion\": \"Add ADGM law\"}]\n```";
        let issues = parse_issues(fenced);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, "High");
        assert_eq!(issues[0].suggestion.as_deref(), Some("Add ADGM law"));

        let bare = r#"[{"section": "3", "issue": "Hours of work missing"}, {"issue": ""}]"#;
        let issues = parse_issues(bare);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].section.as_deref(), Some("3"));
        assert_eq!(issues[0].severity, "Info");
    }

    #[test]
    fn unparseable_replies_yield_nothing() {
        assert!(parse_issues("I could not find any problems.").is_empty());
        assert!(parse_issues("{\"issue\": \"object, not array\"}").is_empty());
    }
}
