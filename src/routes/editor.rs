//! Editor-state routes
//!
//! The client-side editor persists its last content under one fixed key
//! and reloads it on initialization.
//!
//! Endpoints:
//! - GET /api/v1/editor - read the persisted content
//! - PUT /api/v1/editor - replace the persisted content

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::{editor_state, set_editor_state};
use crate::error::Result;
use crate::state::AppState;

/// Create the editor router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(read_state).put(write_state))
}

#[derive(Serialize)]
struct EditorStateResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct EditorStateRequest {
    content: String,
}

/// GET /api/v1/editor
async fn read_state(State(state): State<AppState>) -> Result<Json<EditorStateResponse>> {
    let content = editor_state(state.db()).await?;
    Ok(Json(EditorStateResponse { content }))
}

/// PUT /api/v1/editor
async fn write_state(
    State(state): State<AppState>,
    Json(request): Json<EditorStateRequest>,
) -> Result<Json<EditorStateResponse>> {
    set_editor_state(state.db(), &request.content).await?;
    Ok(Json(EditorStateResponse {
        content: Some(request.content),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    async fn test_server() -> (tempfile::TempDir, axum_test::TestServer) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/test.db", dir.path().display());
        let pool = crate::db::create_pool(&url).await.unwrap();
        let state = AppState::new(Config::default(), pool).unwrap();
        let app = Router::new()
            .nest("/api/v1/editor", router())
            .with_state(state);
        (dir, axum_test::TestServer::new(app).unwrap())
    }

    #[tokio::test]
    async fn test_editor_state_round_trip() {
        let (_dir, server) = test_server().await;

        let response = server.get("/api/v1/editor").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert!(body["content"].is_null());

        let response = server
            .put("/api/v1/editor")
            .json(&serde_json::json!({"content": "<p>saved</p>"}))
            .await;
        response.assert_status_ok();

        let response = server.get("/api/v1/editor").await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["content"], "<p>saved</p>");
    }
}
