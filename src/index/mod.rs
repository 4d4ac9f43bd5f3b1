//! Vector index integration.

pub mod client;
pub mod types;

pub use client::VectorIndexService;
pub use types::{EmbeddingRecord, IndexError};
