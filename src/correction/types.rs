//! Correction types
//!
//! Wire types for the Ollama-compatible generation endpoint and the
//! correction error taxonomy.

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/generate`
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub stream: bool,
    /// Constrains the model to emit a JSON object
    pub format: String,
}

/// Response body from `POST /api/generate`
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// The structured payload the model must return: one field, the corrected
/// text. Anything else is a schema violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectedPayload {
    #[serde(rename = "correctedText")]
    pub corrected_text: String,
}

/// Correction service error types
///
/// None of these ever surface as a failure of the overall pipeline run; the
/// service falls back to the raw text instead.
#[derive(Debug, thiserror::Error)]
pub enum CorrectionError {
    #[error("Failed to reach correction service: {0}")]
    Unreachable(String),

    #[error("Correction service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Correction request timed out")]
    Timeout,

    #[error("Response violates the expected schema: {0}")]
    Schema(String),
}
