//! Document and category-pointer metadata store.

pub mod client;
pub mod types;

pub use client::MetadataStore;
pub use types::{
    CategoryFilter, CategoryPointer, DocumentPatch, DocumentRecord, Partition, StoreError,
};
