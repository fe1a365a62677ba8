//! Editor-state persistence
//!
//! The last-set editor content lives under one fixed key and is reloaded
//! by the client on its next initialization. The assembler's output is
//! written here whenever a run completes.

use sqlx::SqlitePool;

use crate::error::Result;

/// The single key the editor content is persisted under
pub const EDITOR_STATE_KEY: &str = "editor-content";

/// Read the persisted editor content, if any was ever set.
pub async fn editor_state(pool: &SqlitePool) -> Result<Option<String>> {
    let value: Option<(String,)> =
        sqlx::query_as("SELECT value FROM editor_state WHERE key = ?")
            .bind(EDITOR_STATE_KEY)
            .fetch_optional(pool)
            .await?;

    Ok(value.map(|(v,)| v))
}

/// Replace the persisted editor content.
pub async fn set_editor_state(pool: &SqlitePool, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO editor_state (key, value, updated_at)
        VALUES (?, ?, datetime('now'))
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(EDITOR_STATE_KEY)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_editor_state_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/test.db", dir.path().display());
        let pool = crate::db::create_pool(&url).await.unwrap();

        assert!(editor_state(&pool).await.unwrap().is_none());

        set_editor_state(&pool, "<p>draft one</p>").await.unwrap();
        assert_eq!(
            editor_state(&pool).await.unwrap().as_deref(),
            Some("<p>draft one</p>")
        );

        // Overwrites, never appends
        set_editor_state(&pool, "<p>draft two</p>").await.unwrap();
        assert_eq!(
            editor_state(&pool).await.unwrap().as_deref(),
            Some("<p>draft two</p>")
        );
    }
}
