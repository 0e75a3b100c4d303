//! Corpus ingestion and query-time retrieval.
//!
//! Ingestion: manifest -> extract -> chunk -> embed -> upsert ([`ingest`]).
//! Query: embed -> broad nearest-neighbour pull -> [`filter`] -> [`rerank`] -> top-k ([`retriever`]).

pub mod filter;
pub mod ingest;
pub mod rerank;
pub mod retriever;

pub use ingest::{IndexBuilder, IngestReport, SkippedSource};
pub use retriever::{RetrievalRequest, Retriever};
