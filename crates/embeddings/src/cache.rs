//! Fixed-capacity FIFO embedding cache (spec.md §4.1).

use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

/// Cache key = `hash(text ∥ instruction? ∥ model_name)`.
pub fn cache_key(text: &str, instruction: Option<&str>, model_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    if let Some(instr) = instruction {
        hasher.update(b"\x00");
        hasher.update(instr.as_bytes());
    }
    hasher.update(b"\x00");
    hasher.update(model_name.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner {
    map: HashMap<String, Vec<f32>>,
    order: VecDeque<String>,
    capacity: usize,
    stats: CacheStats,
}

/// Fixed-capacity map with FIFO eviction; reads are lock-free with readers
/// under a shared lock, writes serialize (spec.md §5 shared-resource
/// policy: "reads allowed concurrently, writes serialize").
pub struct EmbeddingCache {
    inner: RwLock<Inner>,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
                capacity,
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<f32>> {
        let mut inner = self.inner.write();
        let hit = inner.map.get(key).cloned();
        if hit.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        hit
    }

    pub fn put(&self, key: String, vector: Vec<f32>) {
        let mut inner = self.inner.write();
        if inner.map.contains_key(&key) {
            inner.map.insert(key, vector);
            return;
        }
        if inner.capacity == 0 {
            return;
        }
        while inner.order.len() >= inner.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            } else {
                break;
            }
        }
        inner.order.push_back(key.clone());
        inner.map.insert(key, vector);
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.read().stats
    }

    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_stable_and_distinguishes_instruction() {
        let a = cache_key("hello", None, "m1");
        let b = cache_key("hello", None, "m1");
        let c = cache_key("hello", Some("instr"), "m1");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn fifo_eviction_drops_oldest() {
        let cache = EmbeddingCache::new(2);
        cache.put("a".into(), vec![1.0]);
        cache.put("b".into(), vec![2.0]);
        cache.put("c".into(), vec![3.0]);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn hit_miss_counters() {
        let cache = EmbeddingCache::new(4);
        cache.put("a".into(), vec![1.0]);
        assert!(cache.get("a").is_some());
        assert!(cache.get("missing").is_none());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn round_trip_exact_vector() {
        let cache = EmbeddingCache::new(4);
        let v = vec![0.1, -0.2, 0.3];
        cache.put("k".into(), v.clone());
        assert_eq!(cache.get("k").unwrap(), v);
    }
}
