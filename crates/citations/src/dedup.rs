//! Deduplication of near-identical citations by content hash.

use sha2::{Digest, Sha256};

/// Hash of `source ∥ snippet[:50] ∥ title`, used to collapse citations that
/// point at the same passage surfaced through multiple search paths (e.g.
/// both the dense and sparse branches of a hybrid search).
pub fn dedup_hash(source: &str, snippet: &str, title: Option<&str>) -> String {
    let snippet_prefix: String = snippet.chars().take(50).collect();
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b"\0");
    hasher.update(snippet_prefix.as_bytes());
    hasher.update(b"\0");
    hasher.update(title.unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_hash_identically() {
        let a = dedup_hash("crm", "the quick brown fox", Some("Fox Facts"));
        let b = dedup_hash("crm", "the quick brown fox", Some("Fox Facts"));
        assert_eq!(a, b);
    }

    #[test]
    fn differing_snippet_prefix_changes_hash() {
        let a = dedup_hash("crm", "the quick brown fox", None);
        let b = dedup_hash("crm", "a slow red fox", None);
        assert_ne!(a, b);
    }

    #[test]
    fn only_first_fifty_chars_of_snippet_matter() {
        let long_tail_a = format!("{}{}", "x".repeat(50), "alpha");
        let long_tail_b = format!("{}{}", "x".repeat(50), "beta");
        let a = dedup_hash("crm", &long_tail_a, None);
        let b = dedup_hash("crm", &long_tail_b, None);
        assert_eq!(a, b);
    }
}
