//! Citation types produced by the citation generator (C5).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationFormat {
    Apa,
    Mla,
    Chicago,
    Ieee,
    Harvard,
    Simple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStyle {
    Numbered,
    Inline,
}

/// Bibliographic metadata used to render a citation, mirroring the optional
/// fields `document_processor`/`citation_generator` carry through from
/// source metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CitationMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    /// When the underlying document was last (re-)indexed; drives recency
    /// scoring.
    #[serde(default)]
    pub indexed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A single formatted, deduplicated reference into a search result, bounded
/// and re-indexed from 1 after dedup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub index: usize,
    pub content_snippet: String,
    pub source_identifier: String,
    pub relevance_score: f32,
    pub confidence_score: f32,
    pub metadata: CitationMetadata,
    pub formatted_citation: String,
    pub dedup_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_round_trips_through_json() {
        assert_eq!(
            serde_json::from_str::<CitationFormat>("\"apa\"").unwrap(),
            CitationFormat::Apa
        );
    }
}
