//! Snippet selection and truncation for citation content.

const MAX_SNIPPET_CHARS: usize = 500;
const TRUNCATION_MARKER: &str = " ...";

/// Primary path: choose up to two sentences with maximum query-keyword
/// overlap. Falls back to word-boundary truncation when `query_terms` is
/// empty or no sentence overlaps at all (spec.md §4.4).
pub fn select_snippet(content: &str, query_terms: &[String]) -> String {
    if !query_terms.is_empty() {
        if let Some(snippet) = keyword_overlap_snippet(content, query_terms) {
            return truncate_to_limit(&snippet);
        }
    }
    truncate_to_limit(content)
}

fn keyword_overlap_snippet(content: &str, query_terms: &[String]) -> Option<String> {
    let sentences = split_sentences(content);
    if sentences.is_empty() {
        return None;
    }

    let mut scored: Vec<(usize, usize)> = sentences
        .iter()
        .enumerate()
        .map(|(i, sentence)| (i, overlap_count(sentence, query_terms)))
        .filter(|(_, overlap)| *overlap > 0)
        .collect();
    if scored.is_empty() {
        return None;
    }

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    let mut top_indices: Vec<usize> = scored.into_iter().take(2).map(|(i, _)| i).collect();
    top_indices.sort_unstable();

    let joined = top_indices.into_iter().map(|i| sentences[i]).collect::<Vec<_>>().join(" ");
    Some(joined)
}

fn overlap_count(sentence: &str, query_terms: &[String]) -> usize {
    let lower = sentence.to_lowercase();
    query_terms.iter().filter(|t| lower.contains(t.to_lowercase().as_str())).count()
}

/// Split on `.`/`!`/`?` boundaries, keeping the terminator with its
/// sentence. Whitespace-only fragments are dropped.
fn split_sentences(content: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (i, c) in content.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            let end = i + c.len_utf8();
            let candidate = content[start..end].trim();
            if !candidate.is_empty() {
                sentences.push(candidate);
            }
            start = end;
        }
    }
    let rest = content[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Truncate `content` to at most `MAX_SNIPPET_CHARS`, breaking on a UTF-8
/// char boundary and preferring to cut at the nearest preceding word
/// boundary so the snippet doesn't end mid-word.
fn truncate_to_limit(content: &str) -> String {
    if content.len() <= MAX_SNIPPET_CHARS {
        return content.trim().to_string();
    }

    let boundary = floor_char_boundary(content, MAX_SNIPPET_CHARS);
    let truncated = &content[..boundary];

    let cut = truncated
        .rfind(|c: char| c == ' ' || c == '\n')
        .unwrap_or(boundary);

    let mut snippet = truncated[..cut].trim_end().to_string();
    snippet.push_str(TRUNCATION_MARKER);
    snippet
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut idx = index;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_unchanged() {
        assert_eq!(select_snippet("a short snippet", &[]), "a short snippet");
    }

    #[test]
    fn long_content_is_truncated_with_marker() {
        let content = "word ".repeat(200);
        let snippet = select_snippet(&content, &[]);
        assert!(snippet.len() <= MAX_SNIPPET_CHARS + TRUNCATION_MARKER.len());
        assert!(snippet.ends_with(&TRUNCATION_MARKER.to_string()));
    }

    #[test]
    fn truncation_respects_utf8_boundaries() {
        let content = "café ".repeat(150);
        let snippet = select_snippet(&content, &[]);
        assert!(snippet.is_char_boundary(snippet.len() - TRUNCATION_MARKER.len()));
    }

    #[test]
    fn picks_sentences_with_highest_keyword_overlap() {
        let content = "The company picnic is in June. The expense report policy requires manager approval. Parking is available on site.";
        let terms = vec!["expense".to_string(), "report".to_string(), "policy".to_string()];
        let snippet = select_snippet(content, &terms);
        assert!(snippet.contains("expense report policy"));
        assert!(!snippet.contains("picnic"));
        assert!(!snippet.contains("Parking"));
    }

    #[test]
    fn keeps_selected_sentences_in_original_order() {
        let content = "Expense reports need approval. Nothing relevant here. Submit the expense report within 30 days.";
        let terms = vec!["expense".to_string(), "report".to_string()];
        let snippet = select_snippet(content, &terms);
        let first = snippet.find("Expense reports").unwrap();
        let second = snippet.find("Submit the expense report").unwrap();
        assert!(first < second);
    }

    #[test]
    fn falls_back_to_truncation_when_no_sentence_overlaps() {
        let content = "Completely unrelated content about office furniture and chairs.";
        let terms = vec!["expense".to_string()];
        let snippet = select_snippet(content, &terms);
        assert_eq!(snippet, content);
    }
}
