//! End-to-end pipeline tests against a mock vector index and a temp-file store.

use std::path::PathBuf;

use eduvault::config;
use eduvault::ingest::{IngestRequest, IngestService, ListQuery};
use eduvault::store::DocumentPatch;
use httpmock::{Method::GET, Method::POST, Method::PUT, MockServer};
use serde_json::json;
use tokio::sync::OnceCell;

static INIT: OnceCell<()> = OnceCell::const_new();
static UPLOAD_DIR: OnceCell<PathBuf> = OnceCell::const_new();

const INDEX_NAME: &str = "edu-documents";

fn set_env(key: &str, value: &str) {
    // SAFETY: Tests establish deterministic configuration once, before the config is read.
    unsafe { std::env::set_var(key, value) }
}

fn ok_body() -> serde_json::Value {
    json!({ "status": "ok", "time": 0.0, "result": { "status": "completed" } })
}

/// Shared environment: one mock vector index, one temp directory, one config.
/// Each test builds its own service on top so clients live on the test's runtime.
async fn init_environment() {
    INIT.get_or_init(|| async {
        let server = Box::leak(Box::new(MockServer::start_async().await));

        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/collections/{INDEX_NAME}"));
                then.status(200).json_body(ok_body());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path(format!("/collections/{INDEX_NAME}/index"));
                then.status(200).json_body(ok_body());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path(format!("/collections/{INDEX_NAME}/points"));
                then.status(200).json_body(ok_body());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("/collections/{INDEX_NAME}/points/delete"));
                then.status(200).json_body(ok_body());
            })
            .await;

        let dir = Box::leak(Box::new(tempfile::tempdir().expect("tempdir")));
        UPLOAD_DIR.set(dir.path().to_path_buf()).ok();

        set_env(
            "DATABASE_URL",
            &format!("sqlite://{}/metadata.db", dir.path().display()),
        );
        set_env("VECTOR_INDEX_URL", &server.base_url());
        set_env("VECTOR_INDEX_NAME", INDEX_NAME);
        set_env("EMBEDDING_MODEL", "all-minilm-l6-v2");
        set_env("EMBEDDING_DIMENSION", "384");
        config::init_config();
    })
    .await;
}

async fn service() -> IngestService {
    init_environment().await;
    IngestService::new().await
}

fn write_upload(name: &str, contents: &str) -> PathBuf {
    let path = UPLOAD_DIR.get().expect("upload dir").join(name);
    std::fs::write(&path, contents).expect("write upload");
    path
}

fn request(path: PathBuf, board: &str, class: &str, subject: &str) -> IngestRequest {
    IngestRequest {
        path,
        filename: None,
        board: board.to_string(),
        class: Some(class.to_string()),
        subject: Some(subject.to_string()),
        group: None,
    }
}

#[tokio::test]
async fn ingest_segments_document_and_routes_to_stateboard() {
    let service = service().await;
    let text: String = "abcdefghij".chars().cycle().take(1200).collect();
    let path = write_upload("algebra.txt", &text);

    let outcome = service
        .ingest(request(path, "stateboard", "10", "Math"))
        .await
        .expect("ingest");
    // 1200 characters with windows of 500 and stride 400: [0,500), [400,900), [800,1200)
    assert_eq!(outcome.chunk_count, 3);

    let listed = service
        .list(ListQuery {
            board: Some("stateboard".into()),
            class: Some("10".into()),
            subject: Some("Math".into()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].document_id, outcome.document_id);
    assert_eq!(listed[0].filename, "algebra.txt");
    assert_eq!(listed[0].board, "stateboard");

    // nothing with class 10 was filed under the curriculum partition
    let other_partition = service
        .list(ListQuery {
            board: Some("cbse".into()),
            class: Some("10".into()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert!(other_partition.is_empty());
}

#[tokio::test]
async fn deletion_removes_every_footprint_and_is_idempotent() {
    let service = service().await;
    let path = write_upload("freedom-movement.txt", "a short account of the freedom movement");

    let outcome = service
        .ingest(request(path, "cbse", "9", "History"))
        .await
        .expect("ingest");

    let before = service
        .list(ListQuery {
            board: Some("cbse".into()),
            class: Some("9".into()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert!(
        before
            .iter()
            .any(|doc| doc.document_id == outcome.document_id)
    );

    service.delete(&outcome.document_id).await.expect("delete");

    let unfiltered = service.list(ListQuery::default()).await.expect("list");
    assert!(
        unfiltered
            .iter()
            .all(|doc| doc.document_id != outcome.document_id)
    );

    let board_scoped = service
        .list(ListQuery {
            board: Some("cbse".into()),
            class: Some("9".into()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert!(board_scoped.is_empty());

    // deleting again, or deleting an id that never existed, still succeeds
    service
        .delete(&outcome.document_id)
        .await
        .expect("second delete");
    service
        .delete("no-such-document")
        .await
        .expect("unknown delete");
}

#[tokio::test]
async fn unsupported_extension_ingests_with_zero_chunks() {
    let service = service().await;
    let path = write_upload("syllabus.pptx", "slides the pipeline cannot read");

    let outcome = service
        .ingest(request(path, "stateboard", "11", "Geography"))
        .await
        .expect("ingest");
    assert_eq!(outcome.chunk_count, 0);

    // the document is still registered and listable
    let listed = service
        .list(ListQuery {
            board: Some("stateboard".into()),
            class: Some("11".into()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].document_id, outcome.document_id);
}

#[tokio::test]
async fn update_merges_into_the_canonical_record_only() {
    let service = service().await;
    let path = write_upload("periodic-table.txt", "hydrogen helium lithium beryllium");

    let outcome = service
        .ingest(request(path, "icse", "12", "Chem"))
        .await
        .expect("ingest");

    service
        .update(
            &outcome.document_id,
            DocumentPatch {
                subject: Some("Chemistry".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    // the canonical record reflects the patch
    let canonical = service
        .list(ListQuery {
            class: Some("12".into()),
            subject: Some("Chemistry".into()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(canonical.len(), 1);
    assert_eq!(canonical[0].document_id, outcome.document_id);

    let stale_subject = service
        .list(ListQuery {
            class: Some("12".into()),
            subject: Some("Chem".into()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert!(stale_subject.is_empty());

    // the category pointer keeps its ingest-time subject, so the board-scoped
    // listing still matches the old value and joins to the updated record
    let via_pointer = service
        .list(ListQuery {
            board: Some("icse".into()),
            subject: Some("Chem".into()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(via_pointer.len(), 1);
    assert_eq!(via_pointer[0].subject.as_deref(), Some("Chemistry"));

    let via_pointer_new_subject = service
        .list(ListQuery {
            board: Some("icse".into()),
            subject: Some("Chemistry".into()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert!(via_pointer_new_subject.is_empty());

    // patching an id that matches nothing still reports success
    service
        .update(
            "no-such-document",
            DocumentPatch {
                class: Some("8".into()),
                ..Default::default()
            },
        )
        .await
        .expect("unknown update");
}
