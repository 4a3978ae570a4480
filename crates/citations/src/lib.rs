//! Citation generation: relevance scoring, deduplication, snippet
//! selection, and multi-format rendering over hybrid search results (C5).

pub mod dedup;
pub mod format;
pub mod generator;
pub mod relevance;
pub mod snippet;

pub use generator::{CitationGenerator, CitationGeneratorConfig};
