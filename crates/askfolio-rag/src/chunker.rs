//! Paragraph-boundary chunker.
//!
//! Splits the corpus on blank-line boundaries (two or more consecutive
//! newlines) and greedily packs paragraphs into chunks of at most
//! `max_len` characters. A lone paragraph longer than the limit becomes
//! its own oversized chunk; semantic boundaries win over strict length.

/// A bounded-size contiguous passage of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Byte offset of the chunk's first paragraph in the original corpus.
    pub source_offset: usize,
}

/// Joiner between paragraphs packed into the same chunk.
const PARAGRAPH_JOINER: &str = "\n\n";

/// Split `text` into chunks of at most `max_len` bytes on paragraph
/// boundaries. Deterministic; never produces an empty chunk.
pub fn chunk(text: &str, max_len: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_offset = 0usize;

    for (offset, paragraph) in paragraphs(text) {
        if !buffer.is_empty()
            && buffer.len() + PARAGRAPH_JOINER.len() + paragraph.len() > max_len
        {
            chunks.push(Chunk { text: std::mem::take(&mut buffer), source_offset: buffer_offset });
        }
        if buffer.is_empty() {
            buffer_offset = offset;
            buffer.push_str(paragraph);
        } else {
            buffer.push_str(PARAGRAPH_JOINER);
            buffer.push_str(paragraph);
        }
    }

    if !buffer.is_empty() {
        chunks.push(Chunk { text: buffer, source_offset: buffer_offset });
    }
    chunks
}

/// Trimmed, non-empty paragraphs with their byte offsets. Boundaries are
/// runs of 2+ newlines, matching the corpus authoring convention.
fn paragraphs(text: &str) -> Vec<(usize, &str)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'\n' {
            let run_start = i;
            while i < bytes.len() && bytes[i] == b'\n' {
                i += 1;
            }
            if i - run_start >= 2 {
                spans.push((start, run_start));
                start = i;
            }
        } else {
            i += 1;
        }
    }
    spans.push((start, bytes.len()));

    spans
        .into_iter()
        .filter_map(|(lo, hi)| {
            let raw = &text[lo..hi];
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            let offset = lo + (trimmed.as_ptr() as usize - raw.as_ptr() as usize);
            Some((offset, trimmed))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: &str = "First paragraph here.\n\nSecond paragraph here.\n\n\nThird one.";

    #[test]
    fn splits_on_blank_lines() {
        let chunks = chunk(CORPUS, 1200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].text,
            "First paragraph here.\n\nSecond paragraph here.\n\nThird one."
        );
        assert_eq!(chunks[0].source_offset, 0);
    }

    #[test]
    fn respects_max_len() {
        let chunks = chunk(CORPUS, 30);
        assert_eq!(chunks.len(), 3);
        for c in &chunks {
            assert!(c.text.len() <= 30, "chunk too long: {:?}", c.text);
            assert!(!c.text.is_empty());
        }
        assert_eq!(chunks[1].text, "Second paragraph here.");
        assert_eq!(&CORPUS[chunks[1].source_offset..][..6], "Second");
    }

    #[test]
    fn oversized_paragraph_passes_through_whole() {
        let long = "x".repeat(100);
        let text = format!("short one\n\n{long}\n\nanother short");
        let chunks = chunk(&text, 40);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text, long);
        assert!(chunks[1].text.len() > 40);
        assert!(chunks[0].text.len() <= 40);
        assert!(chunks[2].text.len() <= 40);
    }

    #[test]
    fn rechunking_joined_output_is_stable() {
        let text = "alpha alpha alpha\n\nbeta beta\n\ngamma gamma gamma gamma\n\ndelta";
        let first = chunk(text, 25);
        let rejoined: Vec<String> = first.iter().map(|c| c.text.clone()).collect();
        let second = chunk(&rejoined.join("\n\n"), 25);
        let first_texts: Vec<&str> = first.iter().map(|c| c.text.as_str()).collect();
        let second_texts: Vec<&str> = second.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(first_texts, second_texts);
    }

    #[test]
    fn whitespace_only_input_yields_nothing() {
        assert!(chunk("", 100).is_empty());
        assert!(chunk("  \n\n   \n\n ", 100).is_empty());
    }

    #[test]
    fn offsets_point_into_source() {
        let text = "  padded start\n\n\nnext paragraph";
        let chunks = chunk(text, 10);
        for c in &chunks {
            let first_line = c.text.split('\n').next().unwrap();
            assert!(text[c.source_offset..].starts_with(first_line));
        }
    }
}
