//! Relevance scoring for candidate citations (spec.md §5.1).

use chrono::{DateTime, Utc};

use sa_domain::citation::CitationMetadata;

const W_BASE: f32 = 0.4;
const W_CONTENT_QUALITY: f32 = 0.2;
const W_KEYWORD_OVERLAP: f32 = 0.2;
const W_SOURCE_CREDIBILITY: f32 = 0.1;
const W_RECENCY: f32 = 0.1;

/// Substrings treated as credible-domain markers in a citation's source
/// URL, mirroring `_calculate_source_credibility`'s hardcoded domain list.
const CREDIBLE_DOMAINS: &[&str] = &[".gov", ".edu", ".org", "wikipedia.org"];

/// Weighted blend of the search score, a content-quality heuristic,
/// query/snippet keyword overlap, source credibility, and recency.
pub fn relevance_score(
    base_score: f32,
    snippet: &str,
    query_terms: &[String],
    source: &str,
    metadata: &CitationMetadata,
    now: DateTime<Utc>,
) -> f32 {
    let content_quality = content_quality_score(snippet);
    let keyword_overlap = keyword_overlap_score(snippet, query_terms);
    let source_credibility = source_credibility_score(source, metadata);
    let recency = recency_score(metadata, now);

    let score = W_BASE * base_score
        + W_CONTENT_QUALITY * content_quality
        + W_KEYWORD_OVERLAP * keyword_overlap
        + W_SOURCE_CREDIBILITY * source_credibility
        + W_RECENCY * recency;

    score.clamp(0.0, 1.0)
}

/// Rewards snippets with reasonable length, sentence structure, initial
/// capitalization, terminal punctuation, digits, and structured
/// punctuation — mirrors `_calculate_content_quality`.
fn content_quality_score(snippet: &str) -> f32 {
    let word_count = snippet.split_whitespace().count();
    let mut score: f32 = match word_count {
        0..=4 => word_count as f32 / 5.0,
        5..=200 => 1.0,
        _ => (1.0 - (word_count as f32 - 200.0) / 400.0).max(0.3),
    };

    let sentence_count = snippet.chars().filter(|c| matches!(c, '.' | '!' | '?')).count().max(1);
    let words_per_sentence = word_count as f32 / sentence_count as f32;
    if (8.0..=30.0).contains(&words_per_sentence) {
        score += 0.1;
    }

    if snippet.trim_start().chars().next().is_some_and(|c| c.is_uppercase()) {
        score += 0.05;
    }

    if snippet.trim_end().ends_with(['.', '!', '?']) {
        score += 0.05;
    }

    if snippet.chars().any(|c| c.is_ascii_digit()) {
        score += 0.05;
    }

    if snippet.contains(|c: char| matches!(c, ':' | ';' | '-' | '(' | ')' | '[' | ']' | '{' | '}')) {
        score += 0.05;
    }

    score.min(1.0)
}

fn keyword_overlap_score(snippet: &str, query_terms: &[String]) -> f32 {
    if query_terms.is_empty() {
        return 0.5;
    }
    let snippet_lower = snippet.to_lowercase();
    let matched = query_terms
        .iter()
        .filter(|t| snippet_lower.contains(t.to_lowercase().as_str()))
        .count();
    matched as f32 / query_terms.len() as f32
}

/// Base 0.5 plus bonuses for a credible-domain URL and for carrying
/// author/date/doi/isbn metadata — mirrors `_calculate_source_credibility`.
fn source_credibility_score(source: &str, metadata: &CitationMetadata) -> f32 {
    let mut score: f32 = 0.5;

    let url_lower = metadata.url.as_deref().unwrap_or(source).to_lowercase();
    if CREDIBLE_DOMAINS.iter().any(|domain| url_lower.contains(domain)) {
        score += 0.2;
    }

    if metadata.author.is_some() {
        score += 0.1;
    }
    if metadata.date.is_some() {
        score += 0.1;
    }
    if metadata.doi.is_some() || metadata.isbn.is_some() {
        score += 0.1;
    }

    score.min(1.0)
}

/// Stepwise recency bonus by age of `indexed_at` — mirrors
/// `_calculate_recency_boost`'s exact day bands.
fn recency_score(metadata: &CitationMetadata, now: DateTime<Utc>) -> f32 {
    let Some(indexed_at) = metadata.indexed_at.or(metadata.date) else {
        return 0.5;
    };
    let age_days = (now - indexed_at).num_days().max(0);
    match age_days {
        0..=1 => 1.0,
        2..=7 => 0.8,
        8..=30 => 0.6,
        31..=365 => 0.4,
        _ => 0.2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_keyword_matches_score_higher_than_unrelated_snippet() {
        let metadata = CitationMetadata::default();
        let terms = vec!["expense".to_string(), "report".to_string()];
        let relevant = relevance_score(0.8, "The expense report policy requires manager approval.", &terms, "documentation", &metadata, Utc::now());
        let irrelevant = relevance_score(0.8, "The company picnic is scheduled for June.", &terms, "documentation", &metadata, Utc::now());
        assert!(relevant > irrelevant);
    }

    #[test]
    fn recent_document_scores_higher_than_stale_one() {
        let terms: Vec<String> = Vec::new();
        let now = Utc::now();
        let mut fresh = CitationMetadata::default();
        fresh.indexed_at = Some(now);
        let mut stale = CitationMetadata::default();
        stale.indexed_at = Some(now - chrono::Duration::days(720));

        let fresh_score = relevance_score(0.5, "some policy text here", &terms, "documentation", &fresh, now);
        let stale_score = relevance_score(0.5, "some policy text here", &terms, "documentation", &stale, now);
        assert!(fresh_score > stale_score);
    }

    #[test]
    fn score_is_clamped_to_unit_range() {
        let metadata = CitationMetadata::default();
        let score = relevance_score(10.0, "x", &[], "crm", &metadata, Utc::now());
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn recency_score_follows_spec_bands() {
        let now = Utc::now();
        let band = |days: i64| {
            let mut metadata = CitationMetadata::default();
            metadata.indexed_at = Some(now - chrono::Duration::days(days));
            recency_score(&metadata, now)
        };
        assert_eq!(band(1), 1.0);
        assert_eq!(band(7), 0.8);
        assert_eq!(band(30), 0.6);
        assert_eq!(band(365), 0.4);
        assert_eq!(band(400), 0.2);
    }

    #[test]
    fn source_credibility_rewards_domain_and_metadata() {
        let mut metadata = CitationMetadata::default();
        let bare = source_credibility_score("internal", &metadata);
        assert_eq!(bare, 0.5);

        metadata.url = Some("https://docs.example.gov/policy".to_string());
        metadata.author = Some("Jane Doe".to_string());
        metadata.date = Some(Utc::now());
        metadata.doi = Some("10.1000/xyz".to_string());
        let rich = source_credibility_score("internal", &metadata);
        assert_eq!(rich, 1.0);
    }
}
