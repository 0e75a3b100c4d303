//! Checklist engine: which business process a set of documents belongs to, and
//! which required documents are still missing.

pub mod checklist;
pub mod labels;
pub mod process;

pub use checklist::{ChecklistReport, Requirement, RequirementTable};
pub use process::{infer_process, Process};
