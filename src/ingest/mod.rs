//! Ingestion pipeline: extraction, segmentation, embedding, and cross-store coordination.

pub mod segment;
mod service;
pub mod types;

pub use segment::{SegmentError, segment};
pub use service::{IngestApi, IngestService};
pub use types::{IngestError, IngestOutcome, IngestRequest, ListQuery};
