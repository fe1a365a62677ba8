//! Document history database operations
//!
//! One row per uploaded image. Rows are created at upload time and mutated
//! only by the pipeline's completion and failure paths; deletion is a user
//! action through the API.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Result;

/// History entries kept when listing; older entries age out of view
pub const HISTORY_LIMIT: i64 = 200;

/// An uploaded image and the state of its pipeline run
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub id: String,
    /// Original upload file name
    pub name: String,
    /// Assembled document markup, present once the run completed (or the
    /// partial document of a failed run)
    pub result: Option<String>,
    pub is_processing: bool,
    /// Failure message of the last run, when it failed
    pub error: Option<String>,
    pub uploaded_at: String,
}

/// Document repository
pub struct DocumentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DocumentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a record for a fresh upload, marked as processing.
    pub async fn create(&self, name: &str) -> Result<StoredImage> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO documents (id, name, result, is_processing, error, uploaded_at)
            VALUES (?, ?, NULL, 1, NULL, ?)
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(&now)
        .execute(self.pool)
        .await?;

        Ok(StoredImage {
            id,
            name: name.to_string(),
            result: None,
            is_processing: true,
            error: None,
            uploaded_at: now,
        })
    }

    /// Get a single record.
    pub async fn get(&self, id: &str) -> Result<Option<StoredImage>> {
        let record = sqlx::query_as::<_, StoredImage>(
            r#"
            SELECT id, name, result, is_processing, error, uploaded_at
            FROM documents
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// List history, newest first, capped at [`HISTORY_LIMIT`].
    pub async fn list(&self) -> Result<Vec<StoredImage>> {
        let records = sqlx::query_as::<_, StoredImage>(
            r#"
            SELECT id, name, result, is_processing, error, uploaded_at
            FROM documents
            ORDER BY uploaded_at DESC
            LIMIT ?
            "#,
        )
        .bind(HISTORY_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Record a completed run.
    pub async fn complete(&self, id: &str, result: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE documents
            SET result = ?, is_processing = 0, error = NULL
            WHERE id = ?
            "#,
        )
        .bind(result)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Record a failed run, keeping whatever partial document survived.
    pub async fn fail(&self, id: &str, error: &str, partial: Option<&str>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE documents
            SET result = ?, is_processing = 0, error = ?
            WHERE id = ?
            "#,
        )
        .bind(partial)
        .bind(error)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete a record. Returns whether anything was removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pooled connections each need to see the same database, so tests use
    /// a file under a temp dir rather than per-connection `:memory:` stores.
    async fn test_pool() -> (tempfile::TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/test.db", dir.path().display());
        let pool = crate::db::create_pool(&url).await.unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_dir, pool) = test_pool().await;
        let repo = DocumentRepository::new(&pool);

        let created = repo.create("paper-1.png").await.unwrap();
        assert!(created.is_processing);
        assert!(created.result.is_none());

        let fetched = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "paper-1.png");
        assert!(fetched.is_processing);
    }

    #[tokio::test]
    async fn test_complete_clears_processing() {
        let (_dir, pool) = test_pool().await;
        let repo = DocumentRepository::new(&pool);

        let created = repo.create("paper-2.png").await.unwrap();
        repo.complete(&created.id, "<strong>done</strong>").await.unwrap();

        let fetched = repo.get(&created.id).await.unwrap().unwrap();
        assert!(!fetched.is_processing);
        assert_eq!(fetched.result.as_deref(), Some("<strong>done</strong>"));
        assert!(fetched.error.is_none());
    }

    #[tokio::test]
    async fn test_fail_keeps_partial_document() {
        let (_dir, pool) = test_pool().await;
        let repo = DocumentRepository::new(&pool);

        let created = repo.create("paper-3.png").await.unwrap();
        repo.fail(&created.id, "assembly failed", Some("partial text"))
            .await
            .unwrap();

        let fetched = repo.get(&created.id).await.unwrap().unwrap();
        assert!(!fetched.is_processing);
        assert_eq!(fetched.error.as_deref(), Some("assembly failed"));
        assert_eq!(fetched.result.as_deref(), Some("partial text"));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (_dir, pool) = test_pool().await;
        let repo = DocumentRepository::new(&pool);

        for name in ["a.png", "b.png", "c.png"] {
            repo.create(name).await.unwrap();
            // rfc3339 timestamps need distinct instants to order reliably
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].name, "c.png");
        assert_eq!(listed[2].name, "a.png");
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, pool) = test_pool().await;
        let repo = DocumentRepository::new(&pool);

        let created = repo.create("gone.png").await.unwrap();
        assert!(repo.delete(&created.id).await.unwrap());
        assert!(!repo.delete(&created.id).await.unwrap());
        assert!(repo.get(&created.id).await.unwrap().is_none());
    }
}
