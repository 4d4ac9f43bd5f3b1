//! Fixed-window text segmentation.
//!
//! Documents are split into overlapping character windows: each window is at most
//! `chunk_size` characters and starts `chunk_size - overlap` characters after the
//! previous one, so the windows cover the whole text and adjacent windows share
//! `overlap` characters. Windows count characters, not bytes, so multibyte text never
//! splits a code point.

use thiserror::Error;

/// Errors produced while turning extracted text into windows.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// Segmentation configured an impossible window.
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge {
        /// Configured window length.
        chunk_size: usize,
        /// Configured window overlap.
        overlap: usize,
    },
    /// Segmentation configured a zero-length window.
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
}

/// Split `text` into overlapping character windows.
///
/// Pure function of its inputs: empty text yields no windows, text shorter than
/// `chunk_size` yields exactly one window equal to the full text, and the final window
/// may be shorter than `chunk_size`. Window indices are implied by position: the window
/// at position `i` starts at character `i * (chunk_size - overlap)`.
pub fn segment(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, SegmentError> {
    if chunk_size == 0 {
        return Err(SegmentError::ZeroChunkSize);
    }
    if overlap >= chunk_size {
        return Err(SegmentError::OverlapTooLarge {
            chunk_size,
            overlap,
        });
    }

    let characters: Vec<char> = text.chars().collect();
    let stride = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < characters.len() {
        let end = (start + chunk_size).min(characters.len());
        chunks.push(characters[start..end].iter().collect());
        start += stride;
    }

    Ok(chunks)
}
