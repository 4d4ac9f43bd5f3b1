//! Shared types used by the vector index client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned while interacting with the vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid vector index URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The index responded with an unexpected status code.
    #[error("Unexpected vector index response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from the index.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Embedding record ready for indexing.
///
/// The record is identified by `chunk_id` (`"{document_id}-{sequence_index}"`); the
/// document identifier and chunk text travel alongside the vector as payload so that a
/// whole document can later be removed with a single filter.
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    /// Chunk identity, unique per `(document_id, sequence_index)`.
    pub chunk_id: String,
    /// Identifier of the owning document.
    pub document_id: String,
    /// Raw chunk text.
    pub text: String,
    /// Embedding vector produced for the chunk.
    pub vector: Vec<f32>,
}
