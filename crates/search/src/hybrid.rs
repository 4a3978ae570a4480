//! HybridSearch (C4): dense + sparse retrieval with reciprocal-rank fusion.

use std::collections::HashMap;
use std::sync::Arc;

use sa_domain::error::Result;
use sa_domain::search::{SearchFilters, SearchResult, SearchType, VectorIndex};
use sa_domain::trace::TraceEvent;
use sa_embeddings::EmbeddingEngine;
use tracing::{error, warn};

use crate::sparse::SparseIndex;

const RRF_K: f32 = 60.0;
const RRF_WEIGHT: f32 = 0.1;
const EXPANSION_FACTOR: usize = 3;
const RELAXED_THRESHOLD_FACTOR: f32 = 0.6;

#[derive(Debug, Clone)]
pub struct HybridSearchConfig {
    pub dense_weight: f32,
    pub sparse_weight: f32,
}

impl Default for HybridSearchConfig {
    fn default() -> Self {
        Self { dense_weight: 0.5, sparse_weight: 0.5 }
    }
}

pub struct HybridSearch {
    config: HybridSearchConfig,
    embeddings: Arc<EmbeddingEngine>,
    vector_index: Arc<dyn VectorIndex>,
    sparse_index: Arc<SparseIndex>,
}

struct RankedHit {
    score: f32,
    rank: usize,
}

impl HybridSearch {
    pub fn new(
        config: HybridSearchConfig,
        embeddings: Arc<EmbeddingEngine>,
        vector_index: Arc<dyn VectorIndex>,
        sparse_index: Arc<SparseIndex>,
    ) -> Self {
        Self { config, embeddings, vector_index, sparse_index }
    }

    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        search_type: SearchType,
        threshold: f32,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchResult>> {
        match search_type {
            SearchType::Dense => self.dense(query, top_k, threshold, filters).await,
            SearchType::Sparse => Ok(self.sparse_index.search(query, top_k, threshold)),
            SearchType::Hybrid => self.hybrid(query, top_k, threshold, filters).await,
        }
    }

    async fn dense(&self, query: &str, top_k: usize, threshold: f32, filters: &SearchFilters) -> Result<Vec<SearchResult>> {
        let vector = self.embeddings.encode_query(query).await?;
        let results = self.vector_index.query(&vector, top_k, filters).await?;
        Ok(results.into_iter().filter(|r| r.score >= threshold).collect())
    }

    /// Run dense and sparse concurrently at an expanded `top_k`, relaxed
    /// threshold; normalize each set by its own max; fuse by weighted-sum
    /// plus a 0.1-weighted reciprocal-rank-fusion term; filter by the
    /// original threshold; return the top_k descending.
    ///
    /// Failure policy: if either branch fails, proceed with the other; if
    /// both fail, return empty with the error logged.
    async fn hybrid(&self, query: &str, top_k: usize, threshold: f32, filters: &SearchFilters) -> Result<Vec<SearchResult>> {
        let expanded_k = top_k * EXPANSION_FACTOR;
        let relaxed_threshold = threshold * RELAXED_THRESHOLD_FACTOR;

        let (dense_res, sparse_res) = tokio::join!(
            self.dense(query, expanded_k, relaxed_threshold, filters),
            async { Ok::<_, sa_domain::error::Error>(self.sparse_index.search(query, expanded_k, relaxed_threshold)) }
        );

        let dense = match dense_res {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "dense branch failed, proceeding with sparse only");
                Vec::new()
            }
        };
        let sparse = match sparse_res {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "sparse branch failed, proceeding with dense only");
                Vec::new()
            }
        };

        if dense.is_empty() && sparse.is_empty() {
            error!("hybrid search: both dense and sparse branches returned nothing");
            return Ok(Vec::new());
        }

        let dense_ranked = normalize_and_rank(&dense);
        let sparse_ranked = normalize_and_rank(&sparse);

        let dense_by_id: HashMap<&str, &SearchResult> = dense.iter().map(|r| (r.id.as_str(), r)).collect();
        let sparse_by_id: HashMap<&str, &SearchResult> = sparse.iter().map(|r| (r.id.as_str(), r)).collect();

        let mut all_ids: Vec<String> = dense_by_id.keys().chain(sparse_by_id.keys()).map(|s| s.to_string()).collect();
        all_ids.sort();
        all_ids.dedup();

        let mut fused = Vec::new();
        for id in all_ids {
            let d = dense_ranked.get(id.as_str());
            let s = sparse_ranked.get(id.as_str());

            let dense_score = d.map(|h| h.score).unwrap_or(0.0);
            let sparse_score = s.map(|h| h.score).unwrap_or(0.0);
            let weighted = self.config.dense_weight * dense_score + self.config.sparse_weight * sparse_score;

            let rrf_dense = d.map(|h| 1.0 / (h.rank as f32 + RRF_K)).unwrap_or(0.0);
            let rrf_sparse = s.map(|h| 1.0 / (h.rank as f32 + RRF_K)).unwrap_or(0.0);
            let rrf = (rrf_dense + rrf_sparse) * RRF_WEIGHT;

            let fused_score = (weighted + rrf).min(1.0);
            if fused_score < threshold {
                continue;
            }

            let source_result = dense_by_id.get(id.as_str()).or_else(|| sparse_by_id.get(id.as_str())).unwrap();
            let mut metadata = source_result.metadata.clone();
            metadata.insert("dense_score".into(), serde_json::json!(dense_score));
            metadata.insert("dense_rank".into(), serde_json::json!(d.map(|h| h.rank)));
            metadata.insert("sparse_score".into(), serde_json::json!(sparse_score));
            metadata.insert("sparse_rank".into(), serde_json::json!(s.map(|h| h.rank)));
            metadata.insert("fusion_type".into(), serde_json::json!("dense_sparse"));

            fused.push(SearchResult {
                id,
                content: source_result.content.clone(),
                score: fused_score,
                metadata,
                source: source_result.source.clone(),
            });
        }

        fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        fused.truncate(top_k);

        TraceEvent::HybridSearchCompleted { query_chars: query.len(), dense_count: dense.len(), sparse_count: sparse.len(), fused_count: fused.len() }.emit();

        Ok(fused)
    }
}

/// Normalize a result set's scores by dividing by the max score, and record
/// each result's rank (0-indexed, by input order which callers already
/// sorted descending).
fn normalize_and_rank(results: &[SearchResult]) -> HashMap<&str, RankedHit> {
    let max_score = results.iter().map(|r| r.score).fold(0.0f32, f32::max);
    results
        .iter()
        .enumerate()
        .map(|(rank, r)| {
            let normalized = if max_score > 0.0 { r.score / max_score } else { 0.0 };
            (r.id.as_str(), RankedHit { score: normalized, rank })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_index::InMemoryVectorIndex;
    use sa_embeddings::{EmbeddingEngine, EmbeddingEngineConfig, HashInferenceBackend};
    use sa_domain::search::VectorRecord;

    async fn seeded_search() -> HybridSearch {
        let engine = Arc::new(EmbeddingEngine::new(
            EmbeddingEngineConfig { dimension: 32, ..EmbeddingEngineConfig::default() },
            Arc::new(HashInferenceBackend::new(32)),
        ));
        let vector_index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new());
        let sparse_index = Arc::new(SparseIndex::new());

        let docs = [
            ("d1", "red sneakers on sale this week"),
            ("d2", "blue running shoes for marathon training"),
            ("d3", "quarterly financial report for the board"),
            ("d4", "red sneakers restocked in all sizes"),
        ];
        for (id, content) in docs {
            let vector = engine.encode_documents(&[content.to_string()]).await.unwrap().remove(0);
            vector_index
                .upsert(vec![VectorRecord {
                    id: id.to_string(),
                    vector,
                    content: content.to_string(),
                    source: "catalog".into(),
                    metadata: HashMap::new(),
                }])
                .await
                .unwrap();
            sparse_index.upsert(id, content, "catalog", HashMap::new());
        }

        HybridSearch::new(HybridSearchConfig::default(), engine, vector_index, sparse_index)
    }

    #[tokio::test]
    async fn hybrid_fusion_metadata_carries_fusion_type() {
        let search = seeded_search().await;
        let results = search
            .search("red sneakers", 3, SearchType::Hybrid, 0.0, &HashMap::new())
            .await
            .unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].metadata.get("fusion_type").unwrap(), "dense_sparse");
    }

    #[tokio::test]
    async fn results_sorted_descending_and_in_unit_range() {
        let search = seeded_search().await;
        let results = search
            .search("red sneakers", 4, SearchType::Hybrid, 0.0, &HashMap::new())
            .await
            .unwrap();
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for r in &results {
            assert!((0.0..=1.0).contains(&r.score));
        }
    }

    #[tokio::test]
    async fn sparse_only_path_does_not_touch_vector_index() {
        let search = seeded_search().await;
        let results = search
            .search("financial report", 2, SearchType::Sparse, 0.0, &HashMap::new())
            .await
            .unwrap();
        assert_eq!(results[0].id, "d3");
    }
}
