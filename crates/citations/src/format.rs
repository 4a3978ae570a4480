//! Rendering a `Citation`'s bibliographic metadata into formatted text
//! across 6 citation formats and 2 reference styles (spec.md §11 matrix).

use sa_domain::citation::{CitationFormat, CitationMetadata, CitationStyle};

fn year(metadata: &CitationMetadata) -> String {
    metadata
        .date
        .map(|d| d.format("%Y").to_string())
        .unwrap_or_else(|| "n.d.".to_string())
}

fn author_or_source(metadata: &CitationMetadata, source: &str) -> String {
    metadata.author.clone().unwrap_or_else(|| source.to_string())
}

fn title_or_untitled(metadata: &CitationMetadata) -> String {
    metadata.title.clone().unwrap_or_else(|| "Untitled".to_string())
}

/// Render the bibliographic (non-numbered) body of a citation for `format`.
fn render_body(format: CitationFormat, source: &str, metadata: &CitationMetadata) -> String {
    let author = author_or_source(metadata, source);
    let title = title_or_untitled(metadata);
    let year = year(metadata);

    match format {
        CitationFormat::Apa => {
            let mut s = format!("{} ({}). {}.", author, year, title);
            if let Some(url) = &metadata.url {
                s.push_str(&format!(" Retrieved from {}", url));
            }
            s
        }
        CitationFormat::Mla => {
            let mut s = format!("{}. \"{}.\" {}.", author, title, year);
            if let Some(url) = &metadata.url {
                s.push_str(&format!(" {}.", url));
            }
            s
        }
        CitationFormat::Chicago => {
            let mut s = format!("{}. \"{}.\" {}.", author, title, year);
            if let Some(doi) = &metadata.doi {
                s.push_str(&format!(" https://doi.org/{}.", doi));
            }
            s
        }
        CitationFormat::Ieee => {
            let mut s = format!("{}, \"{},\" {}.", author, title, year);
            if let Some(url) = &metadata.url {
                s.push_str(&format!(" [Online]. Available: {}", url));
            }
            s
        }
        CitationFormat::Harvard => {
            format!("{} {}, '{}'.", author, year, title)
        }
        CitationFormat::Simple => {
            format!("{} — {}", title, source)
        }
    }
}

/// Render a citation's full text for `(format, style)`. In `Numbered` style
/// the index-prefix (`[n]`) is prepended; `Inline` renders the bare body
/// suitable for embedding mid-sentence.
pub fn format_citation(
    index: usize,
    format: CitationFormat,
    style: CitationStyle,
    source: &str,
    metadata: &CitationMetadata,
) -> String {
    let body = render_body(format, source, metadata);
    match style {
        CitationStyle::Numbered => format!("[{}] {}", index, body),
        CitationStyle::Inline => body,
    }
}

/// Join formatted citations into a bibliography block, one per line.
pub fn format_bibliography(citations: &[String]) -> String {
    citations.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> CitationMetadata {
        CitationMetadata {
            title: Some("Expense Policy".to_string()),
            author: Some("Finance Team".to_string()),
            url: Some("https://example.com/expense-policy".to_string()),
            ..CitationMetadata::default()
        }
    }

    #[test]
    fn numbered_style_prefixes_index() {
        let rendered = format_citation(1, CitationFormat::Apa, CitationStyle::Numbered, "docs", &sample_metadata());
        assert!(rendered.starts_with("[1] "));
    }

    #[test]
    fn inline_style_has_no_index_prefix() {
        let rendered = format_citation(1, CitationFormat::Apa, CitationStyle::Inline, "docs", &sample_metadata());
        assert!(!rendered.starts_with('['));
    }

    #[test]
    fn all_six_formats_produce_distinct_nonempty_text() {
        let formats = [
            CitationFormat::Apa,
            CitationFormat::Mla,
            CitationFormat::Chicago,
            CitationFormat::Ieee,
            CitationFormat::Harvard,
            CitationFormat::Simple,
        ];
        let metadata = sample_metadata();
        let rendered: Vec<String> = formats
            .iter()
            .map(|f| format_citation(1, *f, CitationStyle::Inline, "docs", &metadata))
            .collect();
        for r in &rendered {
            assert!(!r.is_empty());
        }
        let unique: std::collections::HashSet<_> = rendered.iter().collect();
        assert_eq!(unique.len(), rendered.len());
    }

    #[test]
    fn missing_metadata_falls_back_to_source_and_untitled() {
        let rendered = format_citation(1, CitationFormat::Simple, CitationStyle::Inline, "knowledge_base", &CitationMetadata::default());
        assert!(rendered.contains("Untitled"));
        assert!(rendered.contains("knowledge_base"));
    }
}
