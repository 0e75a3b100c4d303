//! regrag-core
//!
//! Configuration, error taxonomy, domain types and backend traits shared by the
//! regulatory retrieval crates, plus the source manifest, text extractor and chunker.

pub mod chunker;
pub mod config;
pub mod error;
pub mod extract;
pub mod manifest;
pub mod traits;
pub mod types;
