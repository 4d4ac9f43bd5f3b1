//! Coordination of ingestion, deletion, update, and listing across the embedding
//! client, the vector index, and the metadata store.

use crate::{
    config::get_config,
    embedding::{EmbeddingClient, get_embedding_client},
    extract,
    index::{EmbeddingRecord, VectorIndexService},
    ingest::{
        segment::segment,
        types::{DEFAULT_LIST_LIMIT, IngestError, IngestOutcome, IngestRequest, ListQuery},
    },
    metrics::{IngestMetrics, MetricsSnapshot},
    store::{
        CategoryFilter, CategoryPointer, DocumentPatch, DocumentRecord, MetadataStore, Partition,
    },
};
use async_trait::async_trait;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// Coordinates the full document lifecycle: extraction, segmentation, embedding,
/// vector-index writes, and metadata-store writes.
///
/// The service owns long-lived handles to the embedding client, the vector index
/// transport, the store pool, and the metrics registry. Construct it once near process
/// start and share it through an `Arc`; no step below holds cross-request state.
pub struct IngestService {
    embedding_client: Box<dyn EmbeddingClient + Send + Sync>,
    index: VectorIndexService,
    store: MetadataStore,
    metrics: Arc<IngestMetrics>,
}

/// Abstraction over the pipeline used by external surfaces (HTTP handlers, tests).
#[async_trait]
pub trait IngestApi: Send + Sync {
    /// Extract, segment, embed, and register a document; returns its new identifier.
    async fn ingest(&self, request: IngestRequest) -> Result<IngestOutcome, IngestError>;

    /// Remove a document's footprint from every store; unknown ids are a no-op.
    async fn delete(&self, document_id: &str) -> Result<(), IngestError>;

    /// Merge a partial patch into the canonical record.
    async fn update(&self, document_id: &str, patch: DocumentPatch) -> Result<(), IngestError>;

    /// List documents matching the optional category filters.
    async fn list(&self, query: ListQuery) -> Result<Vec<DocumentRecord>, IngestError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl IngestService {
    /// Build a new ingest service, provisioning backing services as needed.
    pub async fn new() -> Self {
        let config = get_config();
        tracing::info!("Initializing embedding client");
        let embedding_client = get_embedding_client();

        let index = VectorIndexService::new().expect("Failed to construct vector index client");
        let vector_size = config.embedding_dimension as u64;
        tracing::debug!(
            collection = %config.vector_index_name,
            vector_size,
            "Ensuring vector index collection"
        );
        index
            .ensure_collection(&config.vector_index_name, vector_size)
            .await
            .expect("Failed to ensure vector index collection exists");
        index
            .ensure_payload_indexes(&config.vector_index_name)
            .await
            .expect("Failed to ensure vector index payload indexes");

        let store = MetadataStore::connect(&config.database_url)
            .await
            .expect("Failed to connect to metadata store");

        Self {
            embedding_client,
            index,
            store,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Ingest one document end to end.
    ///
    /// Steps run in order with no rollback: a failure surfaces to the caller while the
    /// side effects of earlier steps stay in place.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestOutcome, IngestError> {
        let config = get_config();
        tracing::info!(path = %request.path.display(), board = %request.board, "Ingesting document");

        let text = extract::extract_text(&request.path)?;
        let chunks = segment(&text, config.chunk_size(), config.chunk_overlap())?;
        let chunk_count = chunks.len();

        let document_id = Uuid::new_v4().to_string();

        let records = if chunks.is_empty() {
            Vec::new()
        } else {
            let embeddings = self
                .embedding_client
                .generate_embeddings(chunks.clone())
                .await?;
            debug_assert_eq!(chunks.len(), embeddings.len());
            embedding_records(&document_id, chunks, embeddings)
        };
        self.index
            .upsert_chunks(&config.vector_index_name, records)
            .await?;

        let filename = request.filename.clone().unwrap_or_else(|| {
            request
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let record = DocumentRecord {
            document_id: document_id.clone(),
            filename,
            board: request.board.clone(),
            class: request.class.clone(),
            subject: request.subject.clone(),
            group: request.group.clone(),
            uploaded_at: current_timestamp_rfc3339(),
        };
        self.store.insert_document(&record).await?;

        let partition = Partition::for_board(&request.board);
        self.store
            .insert_pointer(
                partition,
                &CategoryPointer {
                    class: request.class,
                    subject: request.subject,
                    group: request.group,
                    document_id: document_id.clone(),
                },
            )
            .await?;

        self.metrics.record_document(chunk_count as u64);
        tracing::info!(
            %document_id,
            chunks = chunk_count,
            partition = ?partition,
            "Document ingested"
        );

        Ok(IngestOutcome {
            document_id,
            chunk_count,
        })
    }

    /// Remove a document's footprint from the canonical store, both pointer
    /// partitions, and the vector index.
    ///
    /// The ingest-time partition is not re-derivable once the canonical record is gone,
    /// so both partitions are always swept. No step depends on another's outcome, and
    /// matching nothing anywhere still reports success.
    pub async fn delete(&self, document_id: &str) -> Result<(), IngestError> {
        let config = get_config();

        self.store.delete_document(document_id).await?;
        let removed_pointers = self
            .store
            .delete_pointers(Partition::StateBoard, document_id)
            .await?
            + self
                .store
                .delete_pointers(Partition::Curriculum, document_id)
                .await?;
        self.index
            .delete_by_document(&config.vector_index_name, document_id)
            .await?;

        self.metrics.record_deletion();
        tracing::info!(document_id, removed_pointers, "Document deleted");
        Ok(())
    }

    /// Merge a partial patch into the canonical record.
    ///
    /// Pointers and embeddings keep their ingest-time values; matching zero documents
    /// reports success.
    pub async fn update(&self, document_id: &str, patch: DocumentPatch) -> Result<(), IngestError> {
        self.store.update_document(document_id, &patch).await?;
        tracing::info!(document_id, "Document updated");
        Ok(())
    }

    /// List documents matching the query.
    ///
    /// Without a board the canonical store answers directly; with one, the matching
    /// pointer partition is consulted first and its document ids joined back to
    /// canonical records.
    pub async fn list(&self, query: ListQuery) -> Result<Vec<DocumentRecord>, IngestError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT) as i64;
        let filter = CategoryFilter {
            class: query.class,
            subject: query.subject,
            group: query.group,
        };

        let documents = match query.board {
            Some(board) => {
                let partition = Partition::for_board(&board);
                let pointers = self.store.find_pointers(partition, &filter, limit).await?;
                let ids: Vec<String> = pointers
                    .into_iter()
                    .map(|pointer| pointer.document_id)
                    .collect();
                self.store.find_documents_by_ids(&ids).await?
            }
            None => self.store.find_documents(&filter, limit).await?,
        };

        Ok(documents)
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl IngestApi for IngestService {
    async fn ingest(&self, request: IngestRequest) -> Result<IngestOutcome, IngestError> {
        IngestService::ingest(self, request).await
    }

    async fn delete(&self, document_id: &str) -> Result<(), IngestError> {
        IngestService::delete(self, document_id).await
    }

    async fn update(&self, document_id: &str, patch: DocumentPatch) -> Result<(), IngestError> {
        IngestService::update(self, document_id, patch).await
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<DocumentRecord>, IngestError> {
        IngestService::list(self, query).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        IngestService::metrics_snapshot(self)
    }
}

/// Pair each chunk with its vector and tag it with the document identity.
fn embedding_records(
    document_id: &str,
    chunks: Vec<String>,
    vectors: Vec<Vec<f32>>,
) -> Vec<EmbeddingRecord> {
    chunks
        .into_iter()
        .zip(vectors)
        .enumerate()
        .map(|(index, (text, vector))| EmbeddingRecord {
            chunk_id: format!("{document_id}-{index}"),
            document_id: document_id.to_string(),
            text,
            vector,
        })
        .collect()
}

/// Current timestamp formatted for canonical records.
fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_records_are_tagged_with_sequence_indices() {
        let records = embedding_records(
            "doc-42",
            vec!["first".into(), "second".into(), "third".into()],
            vec![vec![0.1], vec![0.2], vec![0.3]],
        );

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].chunk_id, "doc-42-0");
        assert_eq!(records[1].chunk_id, "doc-42-1");
        assert_eq!(records[2].chunk_id, "doc-42-2");
        assert!(records.iter().all(|record| record.document_id == "doc-42"));
        assert_eq!(records[1].text, "second");
        assert_eq!(records[2].vector, vec![0.3]);
    }

    #[test]
    fn timestamp_is_rfc3339_like() {
        let ts = current_timestamp_rfc3339();
        assert!(ts.contains('T') && ts.ends_with('Z'));
    }
}
