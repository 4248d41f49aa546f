use serde::{Deserialize, Serialize};

use crate::config::ChunkingConfig;
use crate::error::{SatPrepError, SatPrepResult};
use crate::log_chunk_created;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Break points tried in order before falling back to a hard cut
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// A window of the source text. Offsets are in chars, end-exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl TextChunk {
    pub fn char_count(&self) -> usize {
        self.end - self.start
    }
}

/// Splits long text into overlapping, size-bounded chunks.
///
/// Every chunk is at most `chunk_size` chars, consecutive chunks share exactly
/// `chunk_overlap` chars, and together they cover the whole input. Cuts land
/// on paragraph, line, sentence or word boundaries when one sits in the back
/// half of the window.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> SatPrepResult<Self> {
        if chunk_size == 0 {
            return Err(SatPrepError::invalid_chunk_config(
                chunk_size,
                chunk_overlap,
                "chunk size must be greater than zero",
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(SatPrepError::invalid_chunk_config(
                chunk_size,
                chunk_overlap,
                "overlap must be smaller than chunk size",
            ));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> SatPrepResult<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Lazily walk the chunks of `text`. Calling again restarts from the top.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let char_len = offsets.len();
        offsets.push(text.len());

        Chunks {
            text,
            offsets,
            char_len,
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            next_start: Some(0),
            index: 0,
        }
    }

    pub fn split(&self, text: &str) -> Vec<TextChunk> {
        let chunks: Vec<TextChunk> = self.chunks(text).collect();
        tracing::debug!(
            "Split {} chars into {} chunks (size={}, overlap={})",
            text.chars().count(),
            chunks.len(),
            self.chunk_size,
            self.chunk_overlap
        );
        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Iterator returned by [`TextChunker::chunks`]
pub struct Chunks<'a> {
    text: &'a str,
    /// Byte offset of every char, plus `text.len()` as a sentinel
    offsets: Vec<usize>,
    char_len: usize,
    chunk_size: usize,
    chunk_overlap: usize,
    next_start: Option<usize>,
    index: usize,
}

impl<'a> Chunks<'a> {
    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.offsets[start]..self.offsets[end]]
    }

    fn char_index_of_byte(&self, byte: usize) -> usize {
        // Separators are ASCII, so every match boundary is a char boundary
        self.offsets.partition_point(|&offset| offset < byte)
    }

    /// Pick the chunk end for a window starting at `start`.
    /// The result is always in `(start + overlap, start + size]`, which
    /// guarantees forward progress once the overlap is stepped back.
    fn find_end(&self, start: usize) -> usize {
        let hard_end = start + self.chunk_size;
        let min_end = (start + self.chunk_overlap + 1).max(start + self.chunk_size / 2);
        let window = self.slice(start, hard_end);
        let window_base = self.offsets[start];

        for separator in SEPARATORS {
            if let Some(found) = window.rfind(separator) {
                let end = self.char_index_of_byte(window_base + found + separator.len());
                if end >= min_end && end <= hard_end {
                    return end;
                }
            }
        }

        hard_end
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = TextChunk;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start.take()?;

        let end = if self.char_len - start <= self.chunk_size {
            self.char_len
        } else {
            let end = self.find_end(start);
            self.next_start = Some(end - self.chunk_overlap);
            end
        };

        let chunk = TextChunk {
            index: self.index,
            start,
            end,
            text: self.slice(start, end).to_string(),
        };
        log_chunk_created!(chunk.index, chunk.char_count(), chunk.start);
        self.index += 1;

        Some(chunk)
    }
}

/// Split `text` into overlapping chunks and return just their text
pub fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> SatPrepResult<Vec<String>> {
    let chunker = TextChunker::new(chunk_size, chunk_overlap)?;
    Ok(chunker.chunks(text).map(|chunk| chunk.text).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_chunk_contract(text: &str, size: usize, overlap: usize) {
        let chunker = TextChunker::new(size, overlap).unwrap();
        let chunks = chunker.split(text);
        let chars: Vec<char> = text.chars().collect();

        assert!(!chunks.is_empty());
        assert_eq!(chunks.first().unwrap().start, 0);
        assert_eq!(chunks.last().unwrap().end, chars.len());

        for chunk in &chunks {
            assert!(chunk.char_count() <= size, "chunk {} too long", chunk.index);
            let expected: String = chars[chunk.start..chunk.end].iter().collect();
            assert_eq!(chunk.text, expected);
        }
        for pair in chunks.windows(2) {
            // Coverage plus exact overlap: the next chunk starts `overlap` chars before the previous end
            assert_eq!(pair[1].start + overlap, pair[0].end);
            assert!(pair[1].end > pair[0].end);
        }
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("short text", 1000, 100).unwrap();
        assert_eq!(chunks, vec!["short text".to_string()]);
    }

    #[test]
    fn test_text_of_exactly_chunk_size_is_single_chunk() {
        let chunks = chunk_text("abcd", 4, 1).unwrap();
        assert_eq!(chunks, vec!["abcd".to_string()]);
    }

    #[test]
    fn test_empty_text_is_single_empty_chunk() {
        let chunks = chunk_text("", 10, 2).unwrap();
        assert_eq!(chunks, vec![String::new()]);
    }

    #[test]
    fn test_hard_split_shares_one_char() {
        let chunks = chunk_text("abcdefghij", 4, 1).unwrap();
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
        assert_chunk_contract("abcdefghij", 4, 1);
    }

    #[test]
    fn test_zero_overlap_partitions_text() {
        let chunks = chunk_text("abcdefghij", 3, 0).unwrap();
        assert_eq!(chunks.concat(), "abcdefghij");
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let text = format!("{}\n\n{}", "a".repeat(60), "b".repeat(60));
        let chunks = TextChunker::new(100, 10).unwrap().split(&text);

        assert_eq!(chunks[0].text, format!("{}\n\n", "a".repeat(60)));
        assert_chunk_contract(&text, 100, 10);
    }

    #[test]
    fn test_prefers_word_boundaries_over_hard_cuts() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(20);
        let chunks = TextChunker::new(50, 5).unwrap().split(&text);

        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.text.ends_with(' '), "chunk {:?} should end on a space", chunk.text);
        }
        assert_chunk_contract(&text, 50, 5);
    }

    #[test]
    fn test_multibyte_text_is_counted_in_chars() {
        let text = "é".repeat(25) + &"日本語".repeat(10);
        assert_chunk_contract(&text, 7, 2);
    }

    #[test]
    fn test_contract_holds_for_mixed_text() {
        let text = "Section 1. Algebra covers linear equations.\nIt also covers systems.\n\n\
                    Section 2. Geometry covers circles, triangles and angles. Some proofs.\n"
            .repeat(15);
        for (size, overlap) in [(1000, 100), (64, 8), (17, 16), (5, 0)] {
            assert_chunk_contract(&text, size, overlap);
        }
    }

    #[test]
    fn test_chunking_is_restartable() {
        let chunker = TextChunker::new(8, 2).unwrap();
        let text = "restartable iteration over the same input";
        let first: Vec<_> = chunker.chunks(text).collect();
        let second: Vec<_> = chunker.chunks(text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        assert!(matches!(
            TextChunker::new(0, 0),
            Err(SatPrepError::InvalidChunkConfig { .. })
        ));
        assert!(matches!(
            TextChunker::new(10, 10),
            Err(SatPrepError::InvalidChunkConfig { .. })
        ));
        assert!(matches!(
            chunk_text("anything", 4, 9),
            Err(SatPrepError::InvalidChunkConfig { .. })
        ));
    }
}
