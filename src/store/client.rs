//! SQLite-backed access to the canonical document collection and the two
//! category-pointer partitions.
//!
//! The store enforces no integrity across its collections; appearing and disappearing
//! together is the coordinators' job.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};

use crate::store::types::{
    CategoryFilter, CategoryPointer, DocumentPatch, DocumentRecord, Partition, StoreError,
};

const DOCUMENT_COLUMNS: &str =
    "document_id, filename, board, class, subject, group_name, uploaded_at";
const POINTER_COLUMNS: &str = "class, subject, group_name, document_id";

/// Long-lived handle over the metadata collections.
pub struct MetadataStore {
    pool: SqlitePool,
}

impl MetadataStore {
    /// Open (or create) the store at `url` and ensure its schema exists.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // Every connection to a private in-memory database sees its own empty schema,
        // so those URLs must not be pooled beyond a single connection.
        let max_connections = if url.contains(":memory:") || url.contains("mode=memory") {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        tracing::debug!(url, "Metadata store ready");
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS documents (
                document_id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                board TEXT NOT NULL,
                class TEXT,
                subject TEXT,
                group_name TEXT,
                uploaded_at TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS stateboard_pointers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                class TEXT,
                subject TEXT,
                group_name TEXT,
                document_id TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS curriculum_pointers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                class TEXT,
                subject TEXT,
                group_name TEXT,
                document_id TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_stateboard_document
                ON stateboard_pointers(document_id)",
            "CREATE INDEX IF NOT EXISTS idx_curriculum_document
                ON curriculum_pointers(document_id)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert the canonical record for a freshly ingested document.
    pub async fn insert_document(&self, record: &DocumentRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO documents (document_id, filename, board, class, subject, group_name, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&record.document_id)
        .bind(&record.filename)
        .bind(&record.board)
        .bind(&record.class)
        .bind(&record.subject)
        .bind(&record.group)
        .bind(&record.uploaded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Find canonical records matching the optional category filters.
    pub async fn find_documents(
        &self,
        filter: &CategoryFilter,
        limit: i64,
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {DOCUMENT_COLUMNS} FROM documents"));
        push_category_filters(&mut builder, filter);
        builder.push(" LIMIT ").push_bind(limit);

        let records = builder
            .build_query_as::<DocumentRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Fetch the canonical records for a set of document identifiers.
    pub async fn find_documents_by_ids(
        &self,
        ids: &[String],
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE document_id IN ("
        ));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let records = builder
            .build_query_as::<DocumentRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Merge the provided fields into the canonical record.
    ///
    /// Matching zero documents is a success; an empty patch touches nothing.
    pub async fn update_document(
        &self,
        document_id: &str,
        patch: &DocumentPatch,
    ) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE documents SET ");
        let mut first = true;
        for (column, value) in [
            ("filename", &patch.filename),
            ("board", &patch.board),
            ("class", &patch.class),
            ("subject", &patch.subject),
            ("group_name", &patch.group),
        ] {
            if let Some(value) = value {
                if !first {
                    builder.push(", ");
                }
                builder.push(column).push(" = ").push_bind(value.clone());
                first = false;
            }
        }
        builder
            .push(" WHERE document_id = ")
            .push_bind(document_id.to_string());

        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    /// Delete the canonical record; matching zero documents is a success.
    pub async fn delete_document(&self, document_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE document_id = ?1")
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// File a category pointer in the given partition.
    pub async fn insert_pointer(
        &self,
        partition: Partition,
        pointer: &CategoryPointer,
    ) -> Result<(), StoreError> {
        let statement = format!(
            "INSERT INTO {} (class, subject, group_name, document_id) VALUES (?1, ?2, ?3, ?4)",
            partition.table()
        );
        sqlx::query(&statement)
            .bind(&pointer.class)
            .bind(&pointer.subject)
            .bind(&pointer.group)
            .bind(&pointer.document_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Find pointers in a partition matching the optional category filters.
    pub async fn find_pointers(
        &self,
        partition: Partition,
        filter: &CategoryFilter,
        limit: i64,
    ) -> Result<Vec<CategoryPointer>, StoreError> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {POINTER_COLUMNS} FROM {}",
            partition.table()
        ));
        push_category_filters(&mut builder, filter);
        builder.push(" LIMIT ").push_bind(limit);

        let pointers = builder
            .build_query_as::<CategoryPointer>()
            .fetch_all(&self.pool)
            .await?;
        Ok(pointers)
    }

    /// Remove every pointer referencing the document from a partition.
    ///
    /// Returns the number of pointers removed; zero matches report success.
    pub async fn delete_pointers(
        &self,
        partition: Partition,
        document_id: &str,
    ) -> Result<u64, StoreError> {
        let statement = format!(
            "DELETE FROM {} WHERE document_id = ?1",
            partition.table()
        );
        let result = sqlx::query(&statement)
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn push_category_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &CategoryFilter) {
    let mut prefix = " WHERE ";
    for (column, value) in [
        ("class", &filter.class),
        ("subject", &filter.subject),
        ("group_name", &filter.group),
    ] {
        if let Some(value) = value {
            builder.push(prefix).push(column).push(" = ").push_bind(value.clone());
            prefix = " AND ";
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> MetadataStore {
        MetadataStore::connect("sqlite::memory:")
            .await
            .expect("connect in-memory store")
    }

    fn record(document_id: &str, board: &str, class: &str, subject: &str) -> DocumentRecord {
        DocumentRecord {
            document_id: document_id.to_string(),
            filename: format!("{document_id}.pdf"),
            board: board.to_string(),
            class: Some(class.to_string()),
            subject: Some(subject.to_string()),
            group: None,
            uploaded_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_find_documents_with_filters() {
        let store = memory_store().await;
        store
            .insert_document(&record("doc-1", "stateboard", "10", "Math"))
            .await
            .expect("insert");
        store
            .insert_document(&record("doc-2", "cbse", "10", "Science"))
            .await
            .expect("insert");

        let all = store
            .find_documents(&CategoryFilter::default(), 20)
            .await
            .expect("find");
        assert_eq!(all.len(), 2);

        let math = store
            .find_documents(
                &CategoryFilter {
                    class: Some("10".into()),
                    subject: Some("Math".into()),
                    ..Default::default()
                },
                20,
            )
            .await
            .expect("find");
        assert_eq!(math.len(), 1);
        assert_eq!(math[0].document_id, "doc-1");
    }

    #[tokio::test]
    async fn find_documents_respects_limit() {
        let store = memory_store().await;
        for i in 0..5 {
            store
                .insert_document(&record(&format!("doc-{i}"), "cbse", "9", "History"))
                .await
                .expect("insert");
        }

        let limited = store
            .find_documents(&CategoryFilter::default(), 3)
            .await
            .expect("find");
        assert_eq!(limited.len(), 3);
    }

    #[tokio::test]
    async fn find_documents_by_ids_handles_empty_and_missing() {
        let store = memory_store().await;
        store
            .insert_document(&record("doc-1", "cbse", "10", "Math"))
            .await
            .expect("insert");

        assert!(store.find_documents_by_ids(&[]).await.expect("find").is_empty());

        let found = store
            .find_documents_by_ids(&["doc-1".into(), "doc-404".into()])
            .await
            .expect("find");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].document_id, "doc-1");
    }

    #[tokio::test]
    async fn update_merges_partial_fields() {
        let store = memory_store().await;
        store
            .insert_document(&record("doc-1", "cbse", "10", "Math"))
            .await
            .expect("insert");

        store
            .update_document(
                "doc-1",
                &DocumentPatch {
                    subject: Some("Physics".into()),
                    ..Default::default()
                },
            )
            .await
            .expect("update");

        let found = store
            .find_documents_by_ids(&["doc-1".into()])
            .await
            .expect("find");
        assert_eq!(found[0].subject.as_deref(), Some("Physics"));
        // untouched fields keep their values
        assert_eq!(found[0].class.as_deref(), Some("10"));
        assert_eq!(found[0].board, "cbse");
    }

    #[tokio::test]
    async fn update_of_unknown_document_succeeds() {
        let store = memory_store().await;
        store
            .update_document(
                "doc-404",
                &DocumentPatch {
                    class: Some("12".into()),
                    ..Default::default()
                },
            )
            .await
            .expect("update");
    }

    #[tokio::test]
    async fn delete_of_unknown_document_succeeds() {
        let store = memory_store().await;
        store.delete_document("doc-404").await.expect("delete");
    }

    #[tokio::test]
    async fn pointers_stay_in_their_partition() {
        let store = memory_store().await;
        let pointer = CategoryPointer {
            class: Some("10".into()),
            subject: Some("Math".into()),
            group: None,
            document_id: "doc-1".into(),
        };
        store
            .insert_pointer(Partition::StateBoard, &pointer)
            .await
            .expect("insert pointer");

        let stateboard = store
            .find_pointers(Partition::StateBoard, &CategoryFilter::default(), 20)
            .await
            .expect("find");
        assert_eq!(stateboard, vec![pointer]);

        let curriculum = store
            .find_pointers(Partition::Curriculum, &CategoryFilter::default(), 20)
            .await
            .expect("find");
        assert!(curriculum.is_empty());
    }

    #[tokio::test]
    async fn delete_pointers_removes_all_matches() {
        let store = memory_store().await;
        let pointer = CategoryPointer {
            class: Some("10".into()),
            subject: Some("Math".into()),
            group: Some("A".into()),
            document_id: "doc-1".into(),
        };
        store
            .insert_pointer(Partition::Curriculum, &pointer)
            .await
            .expect("insert");
        store
            .insert_pointer(Partition::Curriculum, &pointer)
            .await
            .expect("insert");

        let removed = store
            .delete_pointers(Partition::Curriculum, "doc-1")
            .await
            .expect("delete");
        assert_eq!(removed, 2);

        let removed_again = store
            .delete_pointers(Partition::Curriculum, "doc-1")
            .await
            .expect("delete");
        assert_eq!(removed_again, 0);
    }
}
