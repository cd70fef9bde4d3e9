//! Recursive, overlapping text chunking
//!
//! Text is first cut into pieces along the coarsest separator that works
//! (paragraph, line, sentence, word, character), then the pieces are packed
//! into segments of at most `chunk_size` characters. Consecutive segments
//! share up to `chunk_overlap` characters of context.
//!
//! Separators stay attached to the end of the piece they close, so pieces
//! tile the input exactly and every segment is a verbatim substring.

use docmint_domain::{Document, Segment};
use once_cell::sync::Lazy;
use regex::Regex;

/// Separator hierarchy, coarsest first; character splitting follows the last
pub const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];

/// Whitespace-free runs matching this are never split at character level
static ATOMIC_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://\S+$").expect("atomic token pattern"));

/// A contiguous byte range of the input and its length in characters
#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
}

/// Splits documents into bounded, overlapping segments
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a new text chunker
    ///
    /// `chunk_size` is raised to at least 1 and `overlap` is capped below it.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Maximum segment size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Maximum shared window in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk a document, labelling every segment with its source
    pub fn chunk_document(&self, document: &Document) -> Vec<Segment> {
        self.chunk(&document.text, &document.source_label)
    }

    /// Chunk raw text
    pub fn chunk(&self, text: &str, source_label: &str) -> Vec<Segment> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut pieces = Vec::new();
        self.split_range(text, 0, text.len(), 0, &mut pieces);
        self.merge(text, &pieces, source_label)
    }

    /// Cut `text[start..end]` into pieces no longer than the chunk size
    fn split_range(&self, text: &str, start: usize, end: usize, level: usize, out: &mut Vec<Piece>) {
        let slice = &text[start..end];
        let chars = slice.chars().count();

        if chars <= self.chunk_size {
            out.push(Piece { start, end, chars });
            return;
        }

        let Some(separator) = SEPARATORS.get(level) else {
            if ATOMIC_TOKEN.is_match(slice.trim_end()) {
                out.push(Piece { start, end, chars });
            } else {
                out.extend(slice.char_indices().map(|(idx, c)| Piece {
                    start: start + idx,
                    end: start + idx + c.len_utf8(),
                    chars: 1,
                }));
            }
            return;
        };

        let mut piece_start = start;
        for (idx, _) in slice.match_indices(separator) {
            let piece_end = start + idx + separator.len();
            self.split_range(text, piece_start, piece_end, level + 1, out);
            piece_start = piece_end;
        }
        if piece_start < end {
            self.split_range(text, piece_start, end, level + 1, out);
        }
    }

    /// Pack pieces into overlapping segments
    fn merge(&self, text: &str, pieces: &[Piece], source_label: &str) -> Vec<Segment> {
        let mut prefix = Vec::with_capacity(pieces.len() + 1);
        prefix.push(0usize);
        for piece in pieces {
            prefix.push(prefix[prefix.len() - 1] + piece.chars);
        }
        // characters covered by pieces first..=last
        let span = |first: usize, last: usize| prefix[last + 1] - prefix[first];

        let mut segments = Vec::new();
        let mut first = 0;
        let mut previous_last: Option<usize> = None;

        while first < pieces.len() {
            let mut last = first;
            while last + 1 < pieces.len() && span(first, last + 1) <= self.chunk_size {
                last += 1;
            }

            let overlap = match previous_last {
                Some(prev) if prev >= first => span(first, prev),
                _ => 0,
            };

            segments.push(Segment {
                text: text[pieces[first].start..pieces[last].end].to_string(),
                source_label: source_label.to_string(),
                offset: prefix[first],
                overlap,
            });

            if last + 1 >= pieces.len() {
                break;
            }

            // Earliest start whose shared window fits the overlap and still
            // leaves room for the next unseen piece.
            let next_chars = pieces[last + 1].chars;
            let mut next_first = first + 1;
            while next_first <= last
                && (span(next_first, last) > self.overlap
                    || span(next_first, last) + next_chars > self.chunk_size)
            {
                next_first += 1;
            }

            previous_last = Some(last);
            first = next_first;
        }

        segments
    }
}

/// Rebuild the original text from consecutive segments of one document
pub fn reassemble(segments: &[Segment]) -> String {
    segments.iter().map(Segment::fresh_text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmint_domain::DocumentFormat;
    use proptest::prelude::*;

    #[test]
    fn test_no_chunking_needed_for_small_text() {
        let chunker = TextChunker::new(100, 10);
        let segments = chunker.chunk("Short text here.", "yosys_hq");

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Short text here.");
        assert_eq!(segments[0].source_label, "yosys_hq");
        assert_eq!(segments[0].overlap, 0);
    }

    #[test]
    fn test_empty_text_has_no_segments() {
        let chunker = TextChunker::new(100, 10);
        assert!(chunker.chunk("", "qflow").is_empty());
    }

    #[test]
    fn test_character_fallback_without_separators() {
        let chunker = TextChunker::new(4096, 512);
        let text = "a".repeat(10_000);
        let segments = chunker.chunk(&text, "");

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].char_len(), 4096);
        assert_eq!(segments[1].offset, 3584);
        assert_eq!(segments[1].overlap, 512);
        assert_eq!(segments[2].offset, 7168);
        assert_eq!(segments[2].char_len(), 10_000 - 7168);
        assert_eq!(reassemble(&segments), text);
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let chunker = TextChunker::new(40, 0);
        let text = "First paragraph here.\n\nSecond paragraph here.\n\nThird one.";
        let segments = chunker.chunk(text, "klayout");

        assert_eq!(segments[0].text, "First paragraph here.\n\n");
        assert_eq!(segments[1].text, "Second paragraph here.\n\nThird one.");
        assert_eq!(reassemble(&segments), text);
    }

    #[test]
    fn test_overlap_repeats_previous_suffix() {
        let chunker = TextChunker::new(20, 8);
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let segments = chunker.chunk(text, "OpenSTA");

        assert!(segments.len() > 1);
        for pair in segments.windows(2) {
            let shared: String = pair[1].text.chars().take(pair[1].overlap).collect();
            assert!(pair[0].text.ends_with(&shared));
            assert!(pair[1].overlap <= 8);
        }
        assert_eq!(reassemble(&segments), text);
    }

    #[test]
    fn test_url_is_kept_whole() {
        let url = format!("https://example.com/{}", "x".repeat(120));
        let text = format!("see {} for details", url);
        let chunker = TextChunker::new(50, 10);
        let segments = chunker.chunk(&text, "verilator");

        let holder = segments
            .iter()
            .find(|s| s.text.contains(&url))
            .expect("URL should survive in one segment");
        assert!(holder.char_len() > 50);
        assert_eq!(reassemble(&segments), text);
    }

    #[test]
    fn test_multibyte_text_is_split_on_char_boundaries() {
        let chunker = TextChunker::new(7, 2);
        let text = "ééééééééééééééééééé";
        let segments = chunker.chunk(text, "");

        for segment in &segments {
            assert!(segment.char_len() <= 7);
        }
        assert_eq!(reassemble(&segments), text);
    }

    #[test]
    fn test_chunk_document_keeps_label() {
        let document = Document::new(
            "one two three four five six seven".to_string(),
            "amaranth",
            DocumentFormat::LightweightMarkup,
            "data/amaranth/readme.md",
        );
        let segments = TextChunker::new(10, 3).chunk_document(&document);

        assert!(segments.len() > 1);
        assert!(segments.iter().all(|s| s.source_label == "amaranth"));
    }

    #[test]
    fn test_overlap_is_capped_below_chunk_size() {
        let chunker = TextChunker::new(10, 50);
        assert_eq!(chunker.overlap(), 9);
    }

    proptest! {
        /// Property: segments respect the size bound and rebuild the text exactly
        #[test]
        fn test_bounds_and_round_trip(
            text in "[ab .\n]{0,400}",
            chunk_size in 1usize..60,
            overlap_seed in 0usize..60,
        ) {
            let overlap = overlap_seed % chunk_size;
            let chunker = TextChunker::new(chunk_size, overlap);
            let segments = chunker.chunk(&text, "label");

            for segment in &segments {
                prop_assert!(segment.char_len() <= chunk_size);
                prop_assert!(segment.overlap <= overlap);
                prop_assert_eq!(segment.source_label.as_str(), "label");
            }
            prop_assert_eq!(reassemble(&segments), text);
        }

        /// Property: chunking is a pure function of text and settings
        #[test]
        fn test_deterministic(text in "[a-c \n]{0,200}", chunk_size in 2usize..40) {
            let chunker = TextChunker::new(chunk_size, chunk_size / 3);
            prop_assert_eq!(chunker.chunk(&text, ""), chunker.chunk(&text, ""));
        }
    }
}
