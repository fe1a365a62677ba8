//! Document routes
//!
//! Upload an exam-paper image, watch its pipeline run, and manage the
//! resulting document history.
//!
//! Endpoints:
//! - POST /api/v1/documents - upload an image, start the pipeline
//! - GET /api/v1/documents - history listing, newest first
//! - GET /api/v1/documents/:id - single record with its result
//! - DELETE /api/v1/documents/:id - remove a record

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::db::{set_editor_state, DocumentRepository, StoredImage};
use crate::error::{AppError, Result};
use crate::ocr::ImageSource;
use crate::state::AppState;

/// Uploads above this size are rejected before decoding
const MAX_UPLOAD_SIZE: usize = 20 * 1024 * 1024;

/// Create the documents router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_document).get(list_documents))
        .route("/:id", get(get_document))
        .route("/:id", delete(delete_document))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
}

/// Response for the history listing
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentListResponse {
    documents: Vec<StoredImage>,
    total: usize,
}

/// POST /api/v1/documents
///
/// Accepts one multipart image field, validates it, creates the history
/// record, and spawns the pipeline run. Returns the record immediately with
/// `isProcessing: true`; the result lands on it when the run finishes.
async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredImage>)> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" || name == "image" {
            let filename = field
                .file_name()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "untitled.png".to_string());

            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {}", e)))?;

            upload = Some((filename, data.to_vec()));
            break;
        }
    }

    let (filename, data) = upload
        .ok_or_else(|| AppError::BadRequest("Missing 'file' or 'image' field".to_string()))?;

    // Invalid images are rejected here, before a record exists
    let source = ImageSource::from_bytes(data)?;

    let record = DocumentRepository::new(state.db()).create(&filename).await?;

    tracing::info!(
        id = %record.id,
        name = %record.name,
        width = source.width,
        height = source.height,
        "Upload accepted, starting pipeline"
    );

    let task_state = state.clone();
    let task_id = record.id.clone();
    tokio::spawn(async move {
        run_pipeline(task_state, task_id, source).await;
    });

    Ok((StatusCode::ACCEPTED, Json(record)))
}

/// Drive one pipeline run and write its outcome back onto the record.
async fn run_pipeline(state: AppState, id: String, source: ImageSource) {
    let (progress_tx, mut progress_rx) = mpsc::channel::<u8>(32);

    let progress_id = id.clone();
    let progress_task = tokio::spawn(async move {
        while let Some(percent) = progress_rx.recv().await {
            tracing::debug!(id = %progress_id, percent, "Recognition progress");
        }
    });

    let outcome = state.assembler().assemble(&source, Some(progress_tx)).await;
    let _ = progress_task.await;

    let repo = DocumentRepository::new(state.db());
    match outcome {
        Ok(document) => {
            tracing::info!(
                id = %id,
                diagrams = document.diagrams_resolved,
                "Pipeline complete"
            );
            if let Err(e) = repo.complete(&id, &document.html).await {
                tracing::error!(id = %id, "Failed to store result: {}", e);
                return;
            }
            // The editor picks the latest result up on its next load
            if let Err(e) = set_editor_state(state.db(), &document.html).await {
                tracing::warn!(id = %id, "Failed to update editor state: {}", e);
            }
        }
        Err(e) => {
            tracing::warn!(id = %id, "Pipeline failed: {}", e);
            let partial = e.partial_document();
            if let Err(store_err) = repo.fail(&id, &e.to_string(), partial).await {
                tracing::error!(id = %id, "Failed to store failure: {}", store_err);
            }
        }
    }
}

/// GET /api/v1/documents
async fn list_documents(State(state): State<AppState>) -> Result<Json<DocumentListResponse>> {
    let documents = DocumentRepository::new(state.db()).list().await?;
    let total = documents.len();

    Ok(Json(DocumentListResponse { documents, total }))
}

/// GET /api/v1/documents/:id
async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredImage>> {
    let record = DocumentRepository::new(state.db())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document not found: {}", id)))?;

    Ok(Json(record))
}

/// DELETE /api/v1/documents/:id
async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let removed = DocumentRepository::new(state.db()).delete(&id).await?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Document not found: {}", id)))
    }
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
            .nest("/api/v1/documents", router())
            .with_state(state);
        (dir, axum_test::TestServer::new(app).unwrap())
    }

    #[tokio::test]
    async fn test_list_starts_empty() {
        let (_dir, server) = test_server().await;

        let response = server.get("/api/v1/documents").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_image() {
        let (_dir, server) = test_server().await;

        let part = axum_test::multipart::Part::bytes(b"definitely not an image".to_vec())
            .file_name("fake.png")
            .mime_type("image/png");
        let form = axum_test::multipart::MultipartForm::new().add_part("file", part);

        let response = server.post("/api/v1/documents").multipart(form).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_upload_requires_file_field() {
        let (_dir, server) = test_server().await;

        let form = axum_test::multipart::MultipartForm::new().add_text("note", "no file here");
        let response = server.post("/api/v1/documents").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_missing_document_is_404() {
        let (_dir, server) = test_server().await;

        let response = server.get("/api/v1/documents/nope").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
