//! Embedding engine (C1): text -> normalized vector, with caching, batching,
//! and model-family adapters.

pub mod backend;
pub mod cache;
pub mod engine;
pub mod model;
pub mod preprocess;

pub use backend::{HashInferenceBackend, InferenceBackend};
pub use cache::{CacheStats, EmbeddingCache};
pub use engine::{EmbeddingEngine, EmbeddingEngineConfig, EncodeOptions, EngineStats};
pub use model::ModelFamily;
