//! HTTP surface for Eduvault.
//!
//! This module exposes a compact Axum router over the ingestion pipeline:
//!
//! - `POST /documents` – Ingest a document already present on durable storage; extraction,
//!   segmentation, embedding, and store writes happen synchronously within the request.
//! - `GET /documents` – List documents with optional `board`/`class`/`subject`/`group`
//!   filters and a result limit.
//! - `PUT /documents/:document_id` – Merge a partial patch into the canonical record.
//! - `DELETE /documents/:document_id` – Remove a document everywhere; idempotent.
//! - `GET /metrics` – Observe ingestion counters.
//!
//! Handlers hold no business logic; everything flows through the [`IngestApi`] trait so
//! tests can substitute a stub pipeline.

use crate::ingest::{IngestApi, IngestError, IngestRequest, ListQuery};
use crate::metrics::MetricsSnapshot;
use crate::store::{DocumentPatch, DocumentRecord};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Build the HTTP router exposing the ingestion API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: IngestApi + 'static,
{
    Router::new()
        .route(
            "/documents",
            get(list_documents::<S>).post(ingest_document::<S>),
        )
        .route(
            "/documents/:document_id",
            axum::routing::put(update_document::<S>).delete(delete_document::<S>),
        )
        .route("/metrics", get(get_metrics::<S>))
        .with_state(service)
}

/// Request body for the `POST /documents` endpoint.
#[derive(Deserialize)]
struct UploadRequest {
    /// Path of the document on durable storage.
    path: PathBuf,
    /// Optional original filename; derived from the path when absent.
    #[serde(default)]
    filename: Option<String>,
    /// Board attribute deciding the category partition.
    board: String,
    /// Optional class attribute.
    #[serde(default)]
    class: Option<String>,
    /// Optional subject attribute.
    #[serde(default)]
    subject: Option<String>,
    /// Optional group attribute.
    #[serde(default)]
    group: Option<String>,
}

/// Success response for the `POST /documents` endpoint.
#[derive(Serialize)]
struct UploadResponse {
    /// Identifier assigned to the ingested document.
    document_id: String,
    /// Number of chunks embedded and indexed.
    chunks_indexed: usize,
}

/// Ingest a document into the pipeline.
async fn ingest_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, AppError>
where
    S: IngestApi,
{
    let UploadRequest {
        path,
        filename,
        board,
        class,
        subject,
        group,
    } = request;
    let outcome = service
        .ingest(IngestRequest {
            path,
            filename,
            board,
            class,
            subject,
            group,
        })
        .await?;
    tracing::info!(
        document_id = %outcome.document_id,
        chunks = outcome.chunk_count,
        "Upload request completed"
    );
    Ok(Json(UploadResponse {
        document_id: outcome.document_id,
        chunks_indexed: outcome.chunk_count,
    }))
}

/// Query parameters accepted by `GET /documents`.
#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    board: Option<String>,
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

/// Response body for `GET /documents`.
#[derive(Serialize)]
struct DocumentsResponse {
    documents: Vec<DocumentRecord>,
}

/// List documents matching the optional category filters.
async fn list_documents<S>(
    State(service): State<Arc<S>>,
    Query(params): Query<ListParams>,
) -> Result<Json<DocumentsResponse>, AppError>
where
    S: IngestApi,
{
    let documents = service
        .list(ListQuery {
            board: params.board,
            class: params.class,
            subject: params.subject,
            group: params.group,
            limit: params.limit,
        })
        .await?;
    Ok(Json(DocumentsResponse { documents }))
}

/// Merge a partial patch into the canonical record.
async fn update_document<S>(
    State(service): State<Arc<S>>,
    Path(document_id): Path<String>,
    Json(patch): Json<DocumentPatch>,
) -> Result<(), AppError>
where
    S: IngestApi,
{
    service.update(&document_id, patch).await?;
    Ok(())
}

/// Remove a document from every store; unknown ids succeed.
async fn delete_document<S>(
    State(service): State<Arc<S>>,
    Path(document_id): Path<String>,
) -> Result<(), AppError>
where
    S: IngestApi,
{
    service.delete(&document_id).await?;
    Ok(())
}

/// Return a concise metrics snapshot with ingestion counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: IngestApi,
{
    Json(service.metrics_snapshot())
}

struct AppError(IngestError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(inner: IngestError) -> Self {
        Self(inner)
    }
}
