//! Required-document checklists and their evaluation.
//!
//! A [`RequirementTable`] lists, per process, the requirement labels in the order they
//! should be reported. A requirement label is either matched directly against the
//! uploaded labels or, if it appears in `composites`, resolved through a
//! [`Requirement`]:
//!
//! - `Single(label)`: satisfied when `label` was uploaded
//! - `AllOf(labels)`: satisfied only when every one of `labels` was uploaded
//!
//! Label multiplicity never matters; uploads are treated as a set.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use regrag_core::error::{Error, Result};

use crate::labels::{
    self, APPROPRIATE_POLICY_DOCUMENT, ARTICLES_OF_ASSOCIATION, BOARD_RESOLUTION, EMPLOYMENT_CONTRACT,
    INCORPORATION_APPLICATION, REGISTER_OF_DIRECTORS, REGISTER_OF_MEMBERS, REGISTER_OF_MEMBERS_AND_DIRECTORS,
    SHAREHOLDER_RESOLUTION, UBO_DECLARATION,
};
use crate::process::{infer_process, Process};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    Single(String),
    AllOf(BTreeSet<String>),
}

impl Requirement {
    pub fn is_satisfied_by(&self, uploaded: &HashSet<&str>) -> bool {
        match self {
            Requirement::Single(label) => uploaded.contains(label.as_str()),
            Requirement::AllOf(labels) => labels.iter().all(|l| uploaded.contains(l.as_str())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessChecklist {
    pub process: String,
    pub required: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementTable {
    pub processes: Vec<ProcessChecklist>,
    #[serde(default)]
    pub composites: BTreeMap<String, Requirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistReport {
    pub process: Process,
    pub required: usize,
    pub present: Vec<String>,
    pub missing: Vec<String>,
    /// Uploaded labels that are neither classifier labels nor named by this table.
    pub unrecognized: Vec<String>,
}

impl Default for RequirementTable {
    fn default() -> Self {
        let checklist = |process: Process, required: &[&str]| ProcessChecklist {
            process: process.name().to_string(),
            required: required.iter().map(|s| s.to_string()).collect(),
        };
        let processes = vec![
            checklist(
                Process::CompanyIncorporation,
                &[
                    ARTICLES_OF_ASSOCIATION,
                    BOARD_RESOLUTION,
                    INCORPORATION_APPLICATION,
                    UBO_DECLARATION,
                    REGISTER_OF_MEMBERS_AND_DIRECTORS,
                ],
            ),
            checklist(Process::EmploymentCompliance, &[EMPLOYMENT_CONTRACT]),
            checklist(Process::DataProtectionCompliance, &[APPROPRIATE_POLICY_DOCUMENT]),
            checklist(Process::AoaAmendment, &[ARTICLES_OF_ASSOCIATION, SHAREHOLDER_RESOLUTION]),
        ];
        // A Shareholder Resolution deliberately does not stand in for a Board Resolution.
        let composites = BTreeMap::from([(
            REGISTER_OF_MEMBERS_AND_DIRECTORS.to_string(),
            Requirement::AllOf(BTreeSet::from([REGISTER_OF_MEMBERS.to_string(), REGISTER_OF_DIRECTORS.to_string()])),
        )]);
        Self { processes, composites }
    }
}

impl RequirementTable {
    /// Load a table from a JSON file of the same shape as its serde representation.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let table: Self =
            serde_json::from_str(raw).map_err(|e| Error::InvalidConfig(format!("requirement table: {e}")))?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for p in &self.processes {
            if !seen.insert(p.process.as_str()) {
                return Err(Error::InvalidConfig(format!("process '{}' listed twice", p.process)));
            }
        }
        if let Some((label, _)) = self.composites.iter().find(|(_, r)| matches!(r, Requirement::AllOf(s) if s.is_empty())) {
            return Err(Error::InvalidConfig(format!("composite '{label}' has no constituent labels")));
        }
        Ok(())
    }

    pub fn list_processes(&self) -> Vec<&str> {
        self.processes.iter().map(|p| p.process.as_str()).collect()
    }

    /// Requirement labels for `process`, empty when the process has no checklist.
    pub fn required(&self, process: &str) -> &[String] {
        self.processes
            .iter()
            .find(|p| p.process == process)
            .map(|p| p.required.as_slice())
            .unwrap_or_default()
    }

    /// Split the requirement list into (present, missing), preserving its order.
    pub fn compute_missing<S: AsRef<str>>(&self, process: &str, uploaded: &[S]) -> (Vec<String>, Vec<String>) {
        let uploaded: HashSet<&str> = uploaded.iter().map(AsRef::as_ref).collect();
        self.partition(process, |req| match self.composites.get(req) {
            Some(composite) => composite.is_satisfied_by(&uploaded),
            None => uploaded.contains(req),
        })
    }

    /// Like [`Self::compute_missing`] but with direct label matches only.
    pub fn compare_uploaded_to_required<S: AsRef<str>>(&self, process: &str, uploaded: &[S]) -> (Vec<String>, Vec<String>) {
        let uploaded: HashSet<&str> = uploaded.iter().map(AsRef::as_ref).collect();
        self.partition(process, |req| uploaded.contains(req))
    }

    /// True for classifier labels and for any label the table requires, directly or inside a composite.
    pub fn recognizes(&self, label: &str) -> bool {
        labels::is_known(label)
            || self.processes.iter().any(|p| p.required.iter().any(|r| r == label))
            || self.composites.values().any(|r| match r {
                Requirement::Single(l) => l == label,
                Requirement::AllOf(ls) => ls.contains(label),
            })
    }

    /// Infer the process from `labels` and check its checklist.
    pub fn evaluate<S: AsRef<str>>(&self, labels: &[S]) -> ChecklistReport {
        let process = infer_process(labels);
        let (present, missing) = self.compute_missing(process.name(), labels);
        let mut unrecognized: Vec<String> = Vec::new();
        for label in labels.iter().map(AsRef::as_ref).filter(|l| !self.recognizes(l)) {
            if !unrecognized.iter().any(|u| u == label) {
                tracing::warn!(label, "uploaded label is not a known document type");
                unrecognized.push(label.to_string());
            }
        }
        tracing::debug!(%process, present = present.len(), missing = missing.len(), "checklist evaluated");
        ChecklistReport { process, required: present.len() + missing.len(), present, missing, unrecognized }
    }

    fn partition(&self, process: &str, satisfied: impl Fn(&str) -> bool) -> (Vec<String>, Vec<String>) {
        let (present, missing): (Vec<&String>, Vec<&String>) =
            self.required(process).iter().partition(|req| satisfied(req.as_str()));
        (present.into_iter().cloned().collect(), missing.into_iter().cloned().collect())
    }
}
