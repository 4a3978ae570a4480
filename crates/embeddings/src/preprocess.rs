//! Text preprocessing ahead of model inference (spec.md §4.1).

/// Strip control characters and collapse whitespace.
pub fn clean(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == ' ')
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to the model's context, word-wise. "Intelligent truncation":
/// if the word count exceeds `2 * max_words`, keep the first half, an
/// ellipsis token, and the last half (so the tail of a long record is not
/// silently dropped); otherwise a simple head truncation to `max_words`.
pub fn truncate(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }
    if words.len() > 2 * max_words {
        let half = max_words / 2;
        let head = &words[..half];
        let tail = &words[words.len() - half..];
        let mut out = head.join(" ");
        out.push_str(" ... ");
        out.push_str(&tail.join(" "));
        out
    } else {
        words[..max_words].join(" ")
    }
}

pub fn prepare(text: &str, max_words: usize) -> String {
    truncate(&clean(text), max_words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_control_chars_and_collapses_whitespace() {
        let dirty = "hello\u{0007}   world\t\tfoo";
        assert_eq!(clean(dirty), "hello world foo");
    }

    #[test]
    fn short_text_is_untouched() {
        let text = "one two three";
        assert_eq!(truncate(text, 10), text);
    }

    #[test]
    fn simple_head_truncation_under_double_max() {
        let text = (1..=15).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let out = truncate(&text, 10);
        assert_eq!(out, "1 2 3 4 5 6 7 8 9 10");
    }

    #[test]
    fn intelligent_truncation_keeps_head_and_tail_over_double_max() {
        let text = (1..=30).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let out = truncate(&text, 10);
        assert!(out.starts_with("1 2 3 4 5"));
        assert!(out.contains("..."));
        assert!(out.ends_with("26 27 28 29 30"));
    }
}
