//! Cleaning pass applied after rendering (spec.md §4.2): collapse
//! whitespace; strip characters outside word/space/basic punctuation.

use regex::Regex;
use std::sync::OnceLock;

fn allowed_chars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s.,!?;:'\-/@]").unwrap())
}

pub fn clean(text: &str) -> String {
    let stripped = allowed_chars_re().replace_all(text, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean("hello   \n\n world"), "hello world");
    }

    #[test]
    fn strips_disallowed_characters() {
        assert_eq!(clean("price: $100 <<urgent>>"), "price: 100 urgent");
    }

    #[test]
    fn keeps_basic_punctuation() {
        assert_eq!(clean("Jane Smith, jane@acme.com; re: order #1."), "Jane Smith, jane@acme.com; re: order 1.");
    }
}
