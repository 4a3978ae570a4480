//! A simple in-memory `VectorIndex` implementation. Useful for tests and
//! small deployments; a production system plugs in a real vector database
//! behind the same trait (spec.md §1 Non-goals: "the vector database
//! internals").

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use sa_domain::error::Result;
use sa_domain::search::{SearchFilters, SearchResult, VectorIndex, VectorRecord};

struct Entry {
    vector: Vec<f32>,
    content: String,
    source: String,
    metadata: HashMap<String, serde_json::Value>,
}

pub struct InMemoryVectorIndex {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

fn matches_filters(metadata: &HashMap<String, serde_json::Value>, filters: &SearchFilters) -> bool {
    filters.iter().all(|(k, v)| metadata.get(k) == Some(v))
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()> {
        let mut entries = self.entries.write();
        for r in records {
            entries.insert(
                r.id,
                Entry { vector: r.vector, content: r.content, source: r.source, metadata: r.metadata },
            );
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize, filters: &SearchFilters) -> Result<Vec<SearchResult>> {
        let entries = self.entries.read();
        let mut scored: Vec<SearchResult> = entries
            .iter()
            .filter(|(_, e)| matches_filters(&e.metadata, filters))
            .map(|(id, e)| SearchResult {
                id: id.clone(),
                content: e.content.clone(),
                score: cosine(vector, &e.vector).max(0.0),
                metadata: e.metadata.clone(),
                source: e.source.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut entries = self.entries.write();
        for id in ids {
            entries.remove(id);
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_round_trips_count() {
        let index = InMemoryVectorIndex::new();
        assert_eq!(index.count().await.unwrap(), 0);
        index
            .upsert(vec![VectorRecord {
                id: "a".into(),
                vector: vec![1.0, 0.0],
                content: "x".into(),
                source: "s".into(),
                metadata: HashMap::new(),
            }])
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 1);
        index.delete(&["a".to_string()]).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn query_ranks_by_cosine_similarity() {
        let index = InMemoryVectorIndex::new();
        index
            .upsert(vec![
                VectorRecord { id: "a".into(), vector: vec![1.0, 0.0], content: "a".into(), source: "s".into(), metadata: HashMap::new() },
                VectorRecord { id: "b".into(), vector: vec![0.0, 1.0], content: "b".into(), source: "s".into(), metadata: HashMap::new() },
            ])
            .await
            .unwrap();
        let results = index.query(&[1.0, 0.0], 2, &HashMap::new()).await.unwrap();
        assert_eq!(results[0].id, "a");
    }
}
