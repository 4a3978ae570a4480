//! Search result types and the vector index collaborator contract (C3).

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Dense,
    Sparse,
    Hybrid,
}

/// A single scored hit from dense, sparse, or hybrid search. Scores are
/// normalized within a result set to `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub content: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub source: String,
}

/// A vector to be upserted into the index, paired with the payload returned
/// alongside KNN hits.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub content: String,
    pub source: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Filters applied to a KNN query; an empty map matches everything.
pub type SearchFilters = HashMap<String, serde_json::Value>;

/// Contract for the external vector database (C3). The spec treats this as
/// a collaborator: only KNN query and scroll/delete are specified, internals
/// (index structure, persistence, sharding) are out of scope.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Upsert a batch of vectors. Idempotent by id.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()>;

    /// KNN search for the `top_k` nearest vectors, optionally filtered.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchResult>>;

    /// Delete vectors by id. Idempotent: deleting a missing id is not an
    /// error.
    async fn delete(&self, ids: &[String]) -> Result<()>;

    /// Number of vectors currently stored, used by round-trip tests.
    async fn count(&self) -> Result<usize>;

    /// Health probe with an implementation-defined short timeout.
    async fn health_check(&self) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_result_serializes() {
        let r = SearchResult {
            id: "doc-1_0".into(),
            content: "hello".into(),
            score: 0.5,
            metadata: HashMap::new(),
            source: "crm".into(),
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"score\":0.5"));
    }
}
