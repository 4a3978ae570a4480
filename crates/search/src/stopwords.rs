//! Small stop-word list shared by sparse search tokenization and citation
//! keyword-overlap scoring.

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for",
    "of", "with", "by", "from", "is", "are", "was", "were", "be", "been",
    "being", "have", "has", "had", "do", "does", "did", "will", "would",
    "could", "should", "may", "might", "must", "can", "this", "that",
    "these", "those", "it", "its", "as", "if", "then", "than", "so",
    "about", "into", "over", "after", "before", "how", "what", "why",
    "when", "where", "who", "which",
];

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Lower-case tokenize, dropping stop words and tokens shorter than 3
/// characters (spec.md §4.3 sparse path).
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() >= 3 && !is_stop_word(w))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_stop_words_and_short_tokens() {
        let tokens = tokenize("How do I submit an expense report?");
        assert!(!tokens.contains(&"how".to_string()));
        assert!(!tokens.contains(&"do".to_string()));
        assert!(tokens.contains(&"submit".to_string()));
        assert!(tokens.contains(&"expense".to_string()));
        assert!(tokens.contains(&"report".to_string()));
    }
}
