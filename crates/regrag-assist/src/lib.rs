//! Retrieval consumers: compliance-check prompt assembly and question answering.
//!
//! Both degrade gracefully. Missing passages or an unavailable generator produce
//! an empty issue list or a canned answer, never an error.

pub mod checks;
pub mod generator;
pub mod qa;

pub use checks::{review_document, Issue};
pub use generator::{load_generator, Generator, OllamaGenerator};
pub use qa::{answer_question, Answer, Question};
