//! Recursive character splitter with overlap.
//!
//! Four-tier splitting strategy, coarsest boundary first:
//! 1. Split at blank lines (paragraphs)
//! 2. Split at single newlines
//! 3. Split at spaces
//! 4. Last resort: split between individual characters
//!
//! Pieces are merged back up to the chunk size, and each new chunk starts
//! with up to `chunk_overlap` characters carried over from the previous one.
//! Lengths are counted in characters, not bytes.

use std::collections::VecDeque;

use crate::config::ChunkingConfig;

const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split `text` into chunks of at most `chunk_size` characters.
    ///
    /// Text that already fits is returned untouched as a single chunk.
    /// Blank text yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }
        self.split_recursive(text, SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // First separator present in the text. The empty separator always matches.
        let (idx, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
            .map(|(i, sep)| (i, *sep))
            .unwrap_or((separators.len(), ""));
        let finer = separators.get(idx + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }

            if finer.is_empty() {
                push_trimmed(&mut chunks, piece);
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }

        chunks
    }

    /// Greedily join `pieces` with `separator` into chunks, keeping a tail of
    /// at most `chunk_overlap` characters as the head of the next chunk.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joiner = if window.is_empty() { 0 } else { sep_len };

            if total + len + joiner > self.chunk_size && !window.is_empty() {
                push_joined(&mut chunks, &window, separator);

                loop {
                    let joiner = if window.is_empty() { 0 } else { sep_len };
                    let overflows = total + len + joiner > self.chunk_size;
                    if total <= self.chunk_overlap && !(total > 0 && overflows) {
                        break;
                    }
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + if window.is_empty() { 0 } else { sep_len };
                }
            }

            total += len + if window.is_empty() { 0 } else { sep_len };
            window.push_back(piece);
        }

        push_joined(&mut chunks, &window, separator);
        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    if window.is_empty() {
        return;
    }
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    push_trimmed(chunks, &joined);
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_empty() {
        let splitter = TextSplitter::default();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("  \n\n  ").is_empty());
    }

    #[test]
    fn test_short_text_is_single_identical_chunk() {
        let splitter = TextSplitter::default();
        let text = "Hello world, this is a test repository.\n";
        assert_eq!(splitter.split(text), vec![text.to_string()]);
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let splitter = TextSplitter::new(100, 10);
        let p1 = "a".repeat(60);
        let p2 = "b".repeat(60);
        let chunks = splitter.split(&format!("{p1}\n\n{p2}"));
        assert_eq!(chunks, vec![p1, p2]);
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let splitter = TextSplitter::new(50, 12);
        let text = (0..40)
            .map(|i| format!("w{i:03}"))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = splitter.split(&text);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let last_word = pair[0].split(' ').last().unwrap();
            assert!(
                pair[1].contains(last_word),
                "expected {last_word} carried into {:?}",
                pair[1]
            );
        }
    }

    #[test]
    fn test_hard_character_cut_without_separators() {
        let splitter = TextSplitter::default();
        let chunks = splitter.split(&"x".repeat(7000));
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 3000);
        assert_eq!(chunks[1].chars().count(), 3000);
        assert_eq!(chunks[2].chars().count(), 1400);
    }

    #[test]
    fn test_chunks_never_exceed_size() {
        let splitter = TextSplitter::new(120, 20);
        let text = (0..200)
            .map(|i| {
                if i % 7 == 0 {
                    format!("line {i} with a longer tail of words\n\n")
                } else {
                    format!("stmt_{i}();\n")
                }
            })
            .collect::<String>();
        for chunk in splitter.split(&text) {
            assert!(chunk.chars().count() <= 120, "chunk too long: {chunk:?}");
            assert!(!chunk.trim().is_empty());
        }
    }

    #[test]
    fn test_multibyte_text_splits_on_char_boundaries() {
        let splitter = TextSplitter::new(10, 2);
        let chunks = splitter.split(&"é".repeat(25));
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }
}
