//! Advisory narrowing of retrieval candidates.
//!
//! A stage that would leave nothing behind is discarded and its input kept.

use regrag_core::types::RetrievedPassage;

fn narrow(mut candidates: Vec<RetrievedPassage>, keep: impl Fn(&RetrievedPassage) -> bool) -> Vec<RetrievedPassage> {
    if candidates.iter().any(&keep) {
        candidates.retain(|p| keep(p));
    }
    candidates
}

/// Keep passages whose flattened scope contains any requested scope (case-insensitive).
pub fn by_scopes(candidates: Vec<RetrievedPassage>, scopes: &[String]) -> Vec<RetrievedPassage> {
    if scopes.is_empty() {
        return candidates;
    }
    let wanted: Vec<String> = scopes.iter().map(|s| s.to_lowercase()).collect();
    narrow(candidates, |p| {
        let scope = p.scope.to_lowercase();
        wanted.iter().any(|w| scope.contains(w.as_str()))
    })
}

/// Keep passages from the allowlisted sources.
pub fn by_source_ids(candidates: Vec<RetrievedPassage>, source_ids: &[String]) -> Vec<RetrievedPassage> {
    if source_ids.is_empty() {
        return candidates;
    }
    narrow(candidates, |p| source_ids.iter().any(|id| *id == p.source_id))
}

/// Scope filter, then source-id filter; each falls back independently.
pub fn apply(candidates: Vec<RetrievedPassage>, scopes: &[String], source_ids: &[String]) -> Vec<RetrievedPassage> {
    by_source_ids(by_scopes(candidates, scopes), source_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: &str, source_id: &str, scope: &str) -> RetrievedPassage {
        RetrievedPassage {
            id: id.into(),
            text: String::new(),
            title: String::new(),
            citation: String::new(),
            source_id: source_id.into(),
            kind: String::new(),
            scope: scope.into(),
            score: 0.0,
        }
    }

    fn ids(v: &[RetrievedPassage]) -> Vec<&str> {
        v.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn scope_match_is_case_insensitive_substring() {
        let c = vec![
            passage("a", "emp", "Employment Contracts;Jurisdiction/Choice-of-Law"),
            passage("b", "co", "AoA;Company Incorporation"),
        ];
        let out = by_scopes(c, &["employment contracts".into()]);
        assert_eq!(ids(&out), ["a"]);
    }

    #[test]
    fn stages_fall_back_independently() {
        let c = vec![passage("a", "emp", "Employment Contracts"), passage("b", "co", "AoA")];
        // Scope matches "b" only, source id matches nothing: scope narrowing survives.
        let out = apply(c, &["aoa".into()], &["missing".into()]);
        assert_eq!(ids(&out), ["b"]);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(apply(Vec::new(), &["x".into()], &["y".into()]).is_empty());
    }
}
