//! Character-level text chunking with bounded overlap.
//!
//! The chunker is a pure function of its input and configuration: no
//! randomness, no I/O. Adjacent chunks share exactly `overlap` characters,
//! except the final chunk which may be shorter than `chunk_size`. This is
//! what makes re-ingestion reproducible and the coverage property testable.

use crate::error::{Error, Result};

/// Splits text into overlapping fixed-size character windows.
#[derive(Debug, Clone)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a new chunker.
    ///
    /// Fails with `InvalidConfig` if `size == 0` or `overlap >= size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be > 0".to_string()));
        }
        if overlap >= size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({overlap}) must be < chunk_size ({size})"
            )));
        }
        Ok(Self { size, overlap })
    }

    /// Chunk size in characters.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Overlap between adjacent chunks in characters.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Lazy iterator over chunk slices of `text`.
    ///
    /// The iterator is restartable: calling `chunks` again yields the same
    /// sequence. Empty input yields an empty sequence.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        // Byte offset of every char boundary, plus the end sentinel, so
        // windows never split a multi-byte character.
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());

        Chunks {
            text,
            boundaries,
            pos: 0,
            size: self.size,
            step: self.size - self.overlap,
        }
    }

    /// Eager convenience over [`Chunker::chunks`].
    pub fn split(&self, text: &str) -> Vec<String> {
        self.chunks(text).map(str::to_string).collect()
    }
}

/// Iterator produced by [`Chunker::chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    boundaries: Vec<usize>,
    pos: usize,
    size: usize,
    step: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        // boundaries.len() - 1 == number of chars in the text
        let char_count = self.boundaries.len() - 1;
        if self.pos >= char_count {
            return None;
        }

        let start = self.boundaries[self.pos];
        let end_idx = (self.pos + self.size).min(char_count);
        let end = self.boundaries[end_idx];

        let chunk = &self.text[start..end];

        if end_idx == char_count {
            self.pos = char_count;
        } else {
            self.pos += self.step;
        }

        Some(chunk)
    }
}
