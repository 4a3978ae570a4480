//! Overlapping fixed-size chunking (spec.md §4.2).

use sa_domain::document::DocumentChunk;

pub fn chunk(document_id: &str, text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<DocumentChunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    let chunk_size = chunk_size.max(1);
    let overlap = chunk_overlap.min(chunk_size.saturating_sub(1));
    let stride = chunk_size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;
    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        let slice = &words[start..end];
        chunks.push(DocumentChunk {
            document_id: document_id.to_string(),
            chunk_index: index,
            content: slice.join(" "),
            word_count: slice.len(),
            start_word_index: start,
            end_word_index: end,
        });
        index += 1;
        if end == words.len() {
            break;
        }
        start += stride;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk_when_shorter_than_size() {
        let chunks = chunk("d1", "one two three", 10, 2);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].word_count, 3);
    }

    #[test]
    fn overlap_between_consecutive_chunks() {
        let text = (1..=10).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let chunks = chunk("d1", &text, 4, 2);
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].start_word_index, 0);
        assert_eq!(chunks[0].end_word_index, 4);
        // second chunk starts 2 words (stride) into the first
        assert_eq!(chunks[1].start_word_index, 2);
    }

    #[test]
    fn last_chunk_may_be_shorter() {
        let text = (1..=9).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let chunks = chunk("d1", &text, 4, 0);
        let last = chunks.last().unwrap();
        assert!(last.word_count <= 4);
        assert_eq!(last.end_word_index, 9);
    }

    #[test]
    fn chunk_indices_are_sequential() {
        let text = (1..=20).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let chunks = chunk("d1", &text, 5, 1);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i);
        }
    }
}
