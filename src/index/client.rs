//! HTTP client wrapper for the vector index.

use crate::config::get_config;
use crate::index::types::{EmbeddingRecord, IndexError};
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Lightweight HTTP client for vector index operations.
pub struct VectorIndexService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
}

impl VectorIndexService {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, IndexError> {
        let config = get_config();
        let client = Client::builder().user_agent("eduvault/0.1").build()?;

        let base_url =
            normalize_base_url(&config.vector_index_url).map_err(IndexError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            has_api_key = %config
                .vector_index_api_key
                .as_deref()
                .map(|value| !value.is_empty())
                .unwrap_or(false),
            "Initialized vector index HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.vector_index_api_key.clone(),
        })
    }

    /// Create the collection only when it is missing from the index.
    ///
    /// Provisioning is a startup-time concern; the collection is created with cosine
    /// distance and the configured embedding dimension.
    pub async fn ensure_collection(
        &self,
        collection_name: &str,
        vector_size: u64,
    ) -> Result<(), IndexError> {
        if self.collection_exists(collection_name).await? {
            return Ok(());
        }

        tracing::debug!(
            collection = collection_name,
            vector_size,
            "Creating collection"
        );

        let body = json!({
            "vectors": {
                "size": vector_size,
                "distance": "Cosine"
            }
        });

        let response = self
            .request(Method::PUT, &format!("collections/{collection_name}"))?
            .json(&body)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(collection = collection_name, "Collection created");
        })
        .await
    }

    /// Ensure keyword payload indexes exist for the fields deletion filters on.
    pub async fn ensure_payload_indexes(&self, collection_name: &str) -> Result<(), IndexError> {
        for field in ["document_id", "chunk_id"] {
            let body = json!({
                "field_name": field,
                "field_schema": "keyword",
            });

            let response = self
                .request(Method::PUT, &format!("collections/{collection_name}/index"))?
                .json(&body)
                .send()
                .await?;

            if response.status().is_success() {
                tracing::debug!(collection = collection_name, field, "Payload index ensured");
            } else if response.status() == StatusCode::CONFLICT {
                tracing::debug!(
                    collection = collection_name,
                    field,
                    "Payload index already exists"
                );
            } else {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let error = IndexError::UnexpectedStatus { status, body };
                tracing::warn!(collection = collection_name, field, error = %error, "Failed to ensure payload index");
            }
        }

        Ok(())
    }

    /// Upsert embedding records into the given collection.
    ///
    /// Point ids are derived deterministically from each record's chunk identity, so
    /// re-upserting the same `(document_id, sequence_index)` overwrites in place.
    pub async fn upsert_chunks(
        &self,
        collection_name: &str,
        records: Vec<EmbeddingRecord>,
    ) -> Result<usize, IndexError> {
        if records.is_empty() {
            return Ok(0);
        }

        let serialized: Vec<_> = records
            .into_iter()
            .map(|record| {
                json!({
                    "id": point_id_for(&record.chunk_id),
                    "vector": record.vector,
                    "payload": {
                        "chunk_id": record.chunk_id,
                        "document_id": record.document_id,
                        "text": record.text,
                    },
                })
            })
            .collect();

        let point_count = serialized.len();
        let response = self
            .request(
                Method::PUT,
                &format!("collections/{collection_name}/points"),
            )?
            .query(&[("wait", true)])
            .json(&json!({ "points": serialized }))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(
                collection = collection_name,
                points = point_count,
                "Points indexed"
            );
        })
        .await?;

        Ok(point_count)
    }

    /// Remove every embedding record belonging to a document in one call.
    pub async fn delete_by_document(
        &self,
        collection_name: &str,
        document_id: &str,
    ) -> Result<(), IndexError> {
        let body = json!({ "filter": document_filter(document_id) });

        let response = self
            .request(
                Method::POST,
                &format!("collections/{collection_name}/points/delete"),
            )?
            .query(&[("wait", true)])
            .json(&body)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(
                collection = collection_name,
                document_id,
                "Document embeddings deleted"
            );
        })
        .await
    }

    async fn collection_exists(&self, collection_name: &str) -> Result<bool, IndexError> {
        let response = self
            .request(Method::GET, &format!("collections/{collection_name}"))?
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = IndexError::UnexpectedStatus { status, body };
                tracing::error!(collection = collection_name, error = %error, "Collection existence check failed");
                Err(error)
            }
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, IndexError> {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("api-key", api_key);
        }
        Ok(req)
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), IndexError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = IndexError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Vector index request failed");
            Err(error)
        }
    }
}

/// Derive the index point id for a chunk identity.
///
/// The index only accepts UUID or integer point ids, so the chunk identity is hashed
/// into a UUIDv5; determinism is what makes retried upserts idempotent.
pub(crate) fn point_id_for(chunk_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
}

/// Filter matching every point whose payload carries the given document id.
pub(crate) fn document_filter(document_id: &str) -> Value {
    json!({
        "must": [
            {
                "key": "document_id",
                "match": { "value": document_id }
            }
        ]
    })
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
