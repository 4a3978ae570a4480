//! Inference backend contract. The actual model weights/runtime are out of
//! scope (spec.md §1 Non-goals: "persisting model weights; training") — the
//! engine only needs something that turns prepared text into raw vectors.

use async_trait::async_trait;
use sa_domain::error::Result;

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Embed a batch of already-preprocessed texts, returning one vector per
    /// input in the same order. Implementations run off the async I/O path
    /// (spec.md §5: "embedding inference offload").
    async fn infer(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn dimension(&self) -> usize;
}

/// Deterministic, dependency-free backend used for local testing and as a
/// fallback when no real model server is configured: a normalized bag-of-
/// character-ngram hash vector. Not a production embedding model — swap in
/// an HTTP-backed `InferenceBackend` for one.
pub struct HashInferenceBackend {
    dimension: usize,
}

impl HashInferenceBackend {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl InferenceBackend for HashInferenceBackend {
    async fn infer(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let dim = self.dimension;
        let texts = texts.to_vec();
        let out = tokio::task::spawn_blocking(move || {
            texts.iter().map(|t| hash_embed(t, dim)).collect::<Vec<_>>()
        })
        .await
        .map_err(|e| sa_domain::error::Error::Other(format!("inference task join: {e}")))?;
        Ok(out)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn hash_embed(text: &str, dim: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dim];
    for (i, window) in text.as_bytes().windows(3.min(text.len().max(1))).enumerate() {
        let mut h: u64 = 1469598103934665603;
        for &b in window {
            h ^= b as u64;
            h = h.wrapping_mul(1099511628211);
        }
        let idx = (h as usize).wrapping_add(i) % dim;
        v[idx] += 1.0;
    }
    if v.iter().all(|x| *x == 0.0) {
        v[0] = 1.0;
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_backend_produces_unit_vectors() {
        let backend = HashInferenceBackend::new(32);
        let out = backend.infer(&["red sneakers".to_string()]).await.unwrap();
        let norm: f32 = out[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn hash_backend_is_deterministic() {
        let backend = HashInferenceBackend::new(16);
        let a = backend.infer(&["same text".to_string()]).await.unwrap();
        let b = backend.infer(&["same text".to_string()]).await.unwrap();
        assert_eq!(a, b);
    }
}
