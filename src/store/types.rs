//! Shared types used by the metadata store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Board value that routes a document to the stateboard partition; every other value
/// routes to the curriculum partition.
pub const STATE_BOARD_SENTINEL: &str = "stateboard";

/// Errors returned while interacting with the metadata store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database rejected or failed the operation.
    #[error("Database request failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Category-pointer partition a document is filed under.
///
/// Resolved exactly once, at ingestion, from the board attribute; coordinators never
/// re-derive it from raw strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Partition {
    /// Documents ingested with the stateboard sentinel board value.
    StateBoard,
    /// Documents ingested with any other board value.
    Curriculum,
}

impl Partition {
    /// Resolve the partition for a board attribute.
    pub fn for_board(board: &str) -> Self {
        if board == STATE_BOARD_SENTINEL {
            Self::StateBoard
        } else {
            Self::Curriculum
        }
    }

    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::StateBoard => "stateboard_pointers",
            Self::Curriculum => "curriculum_pointers",
        }
    }
}

/// Canonical record describing an ingested document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentRecord {
    /// Opaque unique identifier, assigned at ingestion and never reused.
    pub document_id: String,
    /// Original filename of the uploaded document.
    pub filename: String,
    /// Free-form board attribute as supplied at ingestion.
    pub board: String,
    /// Optional class the document belongs to.
    pub class: Option<String>,
    /// Optional subject the document belongs to.
    pub subject: Option<String>,
    /// Optional group the document belongs to.
    #[sqlx(rename = "group_name")]
    #[serde(rename = "group")]
    pub group: Option<String>,
    /// RFC3339 ingestion timestamp.
    pub uploaded_at: String,
}

/// Lightweight pointer filed in a category partition at ingestion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryPointer {
    /// Optional class taken from the ingestion request.
    pub class: Option<String>,
    /// Optional subject taken from the ingestion request.
    pub subject: Option<String>,
    /// Optional group taken from the ingestion request.
    #[sqlx(rename = "group_name")]
    #[serde(rename = "group")]
    pub group: Option<String>,
    /// Identifier of the document the pointer refers to.
    pub document_id: String,
}

/// Partial update applied to a canonical record; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPatch {
    /// Replacement filename.
    #[serde(default)]
    pub filename: Option<String>,
    /// Replacement board attribute.
    #[serde(default)]
    pub board: Option<String>,
    /// Replacement class.
    #[serde(default)]
    pub class: Option<String>,
    /// Replacement subject.
    #[serde(default)]
    pub subject: Option<String>,
    /// Replacement group.
    #[serde(default, rename = "group")]
    pub group: Option<String>,
}

impl DocumentPatch {
    /// Whether the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.filename.is_none()
            && self.board.is_none()
            && self.class.is_none()
            && self.subject.is_none()
            && self.group.is_none()
    }
}

/// Optional equality filters applied to listing queries, AND-combined.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    /// Match documents with exactly this class.
    pub class: Option<String>,
    /// Match documents with exactly this subject.
    pub subject: Option<String>,
    /// Match documents with exactly this group.
    pub group: Option<String>,
}
