//! Word-window passage splitter
//!
//! Documents are split on whitespace into overlapping windows of `chunk_size`
//! words. Consecutive windows share `overlap` words. Splitting stops at the
//! first window that reaches the end of the document, so the final passage may
//! be shorter than `chunk_size` but is never fully contained in its predecessor.

use crate::error::{RagError, Result};
use serde::{Deserialize, Serialize};

/// Chunking configuration (words, not tokens)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Number of words per passage
    pub chunk_size: usize,
    /// Number of words shared by consecutive passages
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

/// Splits text into overlapping word-window passages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassageSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl PassageSplitter {
    /// Create a splitter, rejecting windows that would never advance
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::InvalidConfiguration {
                parameter: "chunking.chunk_size",
                message: "chunk_size must be greater than 0".to_string(),
            });
        }

        if overlap >= chunk_size {
            return Err(RagError::InvalidConfiguration {
                parameter: "chunking.overlap",
                message: format!(
                    "overlap ({}) must be smaller than chunk_size ({})",
                    overlap, chunk_size
                ),
            });
        }

        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Number of words the window advances per passage
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Split `text` into ordered passages
    pub fn split(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut passages = Vec::new();

        let mut start = 0;
        while start < words.len() {
            let end = (start + self.chunk_size).min(words.len());
            passages.push(words[start..end].join(" "));

            if end == words.len() {
                break;
            }
            start += self.step();
        }

        passages
    }

    /// Number of passages `split` produces for a text of `word_count` words
    pub fn passage_count(&self, word_count: usize) -> usize {
        if word_count == 0 {
            0
        } else if word_count <= self.chunk_size {
            1
        } else {
            (word_count - self.overlap).div_ceil(self.step())
        }
    }
}

/// Split `text` into passages of `chunk_size` words overlapping by `overlap` words
pub fn split_into_passages(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    Ok(PassageSplitter::new(chunk_size, overlap)?.split(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(n: usize) -> String {
        (0..n)
            .map(|i| format!("w{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_basic_windows() {
        let passages = split_into_passages("a b c d e f g", 3, 1).unwrap();
        assert_eq!(passages, vec!["a b c", "c d e", "e f g"]);
    }

    #[test]
    fn test_no_overlap() {
        let passages = split_into_passages("the cat sat on the mat", 3, 0).unwrap();
        assert_eq!(passages, vec!["the cat sat", "on the mat"]);
    }

    #[test]
    fn test_short_final_window() {
        let passages = split_into_passages("a b c d e", 3, 0).unwrap();
        assert_eq!(passages, vec!["a b c", "d e"]);
    }

    #[test]
    fn test_text_shorter_than_chunk() {
        let passages = split_into_passages("dogs are loyal animals", 10, 2).unwrap();
        assert_eq!(passages, vec!["dogs are loyal animals"]);
    }

    #[test]
    fn test_text_that_fits_one_window_yields_one_passage() {
        // No trailing window made only of overlap words
        let passages = split_into_passages("a b c d e", 5, 2).unwrap();
        assert_eq!(passages, vec!["a b c d e"]);

        let passages = split_into_passages("a b c", 5, 4).unwrap();
        assert_eq!(passages, vec!["a b c"]);
    }

    #[test]
    fn test_empty_and_blank_text() {
        assert!(split_into_passages("", 5, 1).unwrap().is_empty());
        assert!(split_into_passages("   \n\t ", 5, 1).unwrap().is_empty());
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let passages = split_into_passages("one\n\ntwo\tthree   four", 2, 0).unwrap();
        assert_eq!(passages, vec!["one two", "three four"]);
    }

    #[test]
    fn test_punctuation_is_kept_with_words() {
        let passages = split_into_passages("Hello, world! How are you?", 2, 0).unwrap();
        assert_eq!(passages, vec!["Hello, world!", "How are", "you?"]);
    }

    #[test]
    fn test_overlap_equal_to_chunk_is_rejected() {
        let result = PassageSplitter::new(5, 5);
        assert!(matches!(
            result,
            Err(RagError::InvalidConfiguration {
                parameter: "chunking.overlap",
                ..
            })
        ));
    }

    #[test]
    fn test_overlap_larger_than_chunk_is_rejected() {
        assert!(split_into_passages("a b c", 2, 7).is_err());
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let result = PassageSplitter::new(0, 0);
        assert!(matches!(
            result,
            Err(RagError::InvalidConfiguration {
                parameter: "chunking.chunk_size",
                ..
            })
        ));
    }

    #[test]
    fn test_passage_count_formula() {
        for (c, o) in [(1, 0), (3, 0), (3, 1), (5, 2), (7, 6), (10, 3)] {
            let splitter = PassageSplitter::new(c, o).unwrap();
            for n in 0..40 {
                let passages = splitter.split(&numbered_words(n));
                assert_eq!(
                    passages.len(),
                    splitter.passage_count(n),
                    "n={} chunk_size={} overlap={}",
                    n,
                    c,
                    o
                );
            }
        }
    }

    #[test]
    fn test_reconstruction_with_overlap_removed() {
        for (c, o) in [(3, 0), (3, 1), (4, 3), (6, 2)] {
            let splitter = PassageSplitter::new(c, o).unwrap();
            for n in 1..30 {
                let text = numbered_words(n);
                let passages = splitter.split(&text);

                // Only the last window can be short, so every later window
                // repeats exactly `overlap` words of its predecessor
                let mut rebuilt: Vec<String> = Vec::new();
                for (i, passage) in passages.iter().enumerate() {
                    let skip = if i == 0 { 0 } else { o };
                    rebuilt.extend(passage.split(' ').skip(skip).map(str::to_string));
                }

                let original: Vec<String> = text.split(' ').map(str::to_string).collect();
                assert_eq!(rebuilt, original, "n={} chunk_size={} overlap={}", n, c, o);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let splitter = PassageSplitter::new(4, 1).unwrap();
        let text = numbered_words(23);
        assert_eq!(splitter.split(&text), splitter.split(&text));
    }
}
