//! CitationGenerator (C5): turns raw search results into deduplicated,
//! scored, formatted citations.

use chrono::{DateTime, Utc};
use tracing::debug;

use sa_domain::citation::{Citation, CitationFormat, CitationMetadata, CitationStyle};
use sa_domain::search::SearchResult;

use crate::dedup::dedup_hash;
use crate::format::format_citation;
use crate::relevance::relevance_score;
use crate::snippet::select_snippet;

#[derive(Debug, Clone)]
pub struct CitationGeneratorConfig {
    pub format: CitationFormat,
    pub style: CitationStyle,
    pub max_citations: usize,
}

impl Default for CitationGeneratorConfig {
    fn default() -> Self {
        Self { format: CitationFormat::Apa, style: CitationStyle::Numbered, max_citations: 10 }
    }
}

pub struct CitationGenerator {
    config: CitationGeneratorConfig,
}

impl CitationGenerator {
    pub fn new(config: CitationGeneratorConfig) -> Self {
        Self { config }
    }

    /// Build citations from `results`, relevance-scored against
    /// `query_terms`, deduplicated by content hash, re-indexed from 1, and
    /// truncated to `max_citations`.
    pub fn generate(&self, results: &[SearchResult], query_terms: &[String]) -> Vec<Citation> {
        let now = Utc::now();
        let mut seen_hashes = std::collections::HashSet::new();
        let mut citations = Vec::new();

        for result in results {
            let metadata = extract_metadata(result);
            let snippet = select_snippet(&result.content, query_terms);
            let hash = dedup_hash(&result.source, &snippet, metadata.title.as_deref());

            if !seen_hashes.insert(hash.clone()) {
                debug!(id = %result.id, "dropping duplicate citation");
                continue;
            }

            let score = relevance_score(result.score, &snippet, query_terms, &result.source, &metadata, now);
            let confidence = result.score.clamp(0.0, 1.0);

            citations.push(Citation {
                id: result.id.clone(),
                index: 0,
                content_snippet: snippet,
                source_identifier: result.source.clone(),
                relevance_score: score,
                confidence_score: confidence,
                metadata,
                formatted_citation: String::new(),
                dedup_hash: hash,
            });
        }

        citations.sort_by(|a, b| b.relevance_score.partial_cmp(&a.relevance_score).unwrap_or(std::cmp::Ordering::Equal));
        citations.truncate(self.config.max_citations);

        for (i, citation) in citations.iter_mut().enumerate() {
            citation.index = i + 1;
            citation.formatted_citation = format_citation(
                citation.index,
                self.config.format,
                self.config.style,
                &citation.source_identifier,
                &citation.metadata,
            );
        }

        citations
    }

    pub fn bibliography(&self, citations: &[Citation]) -> String {
        citations.iter().map(|c| c.formatted_citation.clone()).collect::<Vec<_>>().join("\n")
    }
}

fn extract_metadata(result: &SearchResult) -> CitationMetadata {
    let get_str = |key: &str| result.metadata.get(key).and_then(|v| v.as_str()).map(|s| s.to_string());
    let get_date = |key: &str| {
        result
            .metadata
            .get(key)
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
    };

    CitationMetadata {
        title: get_str("title"),
        author: get_str("author"),
        date: get_date("date"),
        doc_type: get_str("doc_type"),
        url: get_str("url"),
        doi: get_str("doi"),
        isbn: get_str("isbn"),
        indexed_at: get_date("indexed_at"),
        extra: result.metadata.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn result(id: &str, content: &str, source: &str, score: f32) -> SearchResult {
        SearchResult { id: id.to_string(), content: content.to_string(), score, metadata: HashMap::new(), source: source.to_string() }
    }

    #[test]
    fn duplicate_content_collapses_to_one_citation() {
        let generator = CitationGenerator::new(CitationGeneratorConfig::default());
        let results = vec![
            result("d1", "the expense policy requires manager approval", "docs", 0.9),
            result("d2", "the expense policy requires manager approval", "docs", 0.85),
        ];
        let citations = generator.generate(&results, &[]);
        assert_eq!(citations.len(), 1);
    }

    #[test]
    fn citations_are_reindexed_from_one_after_dedup_and_truncation() {
        let generator = CitationGenerator::new(CitationGeneratorConfig { max_citations: 2, ..CitationGeneratorConfig::default() });
        let results = vec![
            result("d1", "alpha document text", "docs", 0.9),
            result("d2", "beta document text", "docs", 0.8),
            result("d3", "gamma document text", "docs", 0.7),
        ];
        let citations = generator.generate(&results, &[]);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].index, 1);
        assert_eq!(citations[1].index, 2);
    }

    #[test]
    fn formatted_citation_is_populated() {
        let generator = CitationGenerator::new(CitationGeneratorConfig::default());
        let results = vec![result("d1", "some content here", "docs", 0.9)];
        let citations = generator.generate(&results, &[]);
        assert!(!citations[0].formatted_citation.is_empty());
        assert!(citations[0].formatted_citation.starts_with("[1]"));
    }
}
