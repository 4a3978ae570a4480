//! DocumentProcessor (C2): turns a Document into an ordered sequence of
//! DocumentChunks via format detection, field-mapping rendering, cleaning,
//! and overlapping chunking.

pub mod chunker;
pub mod clean;
pub mod fields;
pub mod format;
pub mod processor;

pub use processor::{ChunkingConfig, DocumentProcessor, ProcessedDocument};
