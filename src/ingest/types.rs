//! Core data types and error definitions for the ingestion pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::embedding::EmbeddingClientError;
use crate::extract::ExtractError;
use crate::index::IndexError;
use crate::ingest::segment::SegmentError;
use crate::store::StoreError;

/// Default number of documents returned by a listing query.
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Errors emitted by the ingestion, deletion, update, and listing coordinators.
///
/// Steps that fail mid-pipeline surface here without undoing the side effects of the
/// steps that already succeeded.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Text extraction from the source document failed.
    #[error("Failed to extract document text: {0}")]
    Extract(#[from] ExtractError),
    /// Segmentation of the extracted text failed.
    #[error("Failed to segment document: {0}")]
    Segment(#[from] SegmentError),
    /// Embedding generation failed for one or more chunks.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// The vector index rejected or failed an operation.
    #[error("Vector index request failed: {0}")]
    Index(#[from] IndexError),
    /// The metadata store rejected or failed an operation.
    #[error("Metadata store request failed: {0}")]
    Store(#[from] StoreError),
}

/// Parameters describing a document to ingest.
///
/// The document bytes are expected on durable storage already; transport concerns
/// (multipart parsing, upload limits) live outside the pipeline.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// Path of the document on disk.
    pub path: PathBuf,
    /// Original filename; derived from the path when absent.
    pub filename: Option<String>,
    /// Free-form board attribute; decides the category-pointer partition.
    pub board: String,
    /// Optional class attribute.
    pub class: Option<String>,
    /// Optional subject attribute.
    pub subject: Option<String>,
    /// Optional group attribute.
    pub group: Option<String>,
}

/// Summary of a completed ingestion.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Identifier assigned to the ingested document.
    pub document_id: String,
    /// Number of chunks embedded and indexed for the document.
    pub chunk_count: usize,
}

/// Parameters for a listing query.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Optional board scope; present values route the query through a pointer partition.
    pub board: Option<String>,
    /// Optional class equality filter.
    pub class: Option<String>,
    /// Optional subject equality filter.
    pub subject: Option<String>,
    /// Optional group equality filter.
    pub group: Option<String>,
    /// Maximum number of documents to return; defaults to [`DEFAULT_LIST_LIMIT`].
    pub limit: Option<usize>,
}
