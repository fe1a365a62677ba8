//! Pipeline types
//!
//! Stage tracking, the assembled-document result, and the fatal error
//! taxonomy for one pipeline run.

use serde::Serialize;

use crate::ocr::OcrError;

/// Stages of one document-assembly run.
///
/// A run moves strictly forward; `Failed` is reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    Idle,
    Recognizing,
    Correcting,
    ResolvingDiagrams,
    Assembling,
    Done,
    Failed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Recognizing => "recognizing",
            Self::Correcting => "correcting",
            Self::ResolvingDiagrams => "resolving-diagrams",
            Self::Assembling => "assembling",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Final output of one pipeline run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledDocument {
    /// The corrected document with diagram placeholders replaced by
    /// embedded images
    pub html: String,
    /// Paper code found in the text, when any
    pub paper_code: Option<String>,
    /// Diagram questions detected in the corrected text
    pub diagrams_detected: usize,
    /// Diagram placeholders that received an embedded image
    pub diagrams_resolved: usize,
}

/// Fatal pipeline errors
///
/// Everything else (correction faults, per-key diagram misses) degrades to
/// a lesser-quality document instead of surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Invalid input image or recognition engine fault
    #[error(transparent)]
    Recognition(#[from] OcrError),

    /// Text substitution itself could not complete
    #[error("Assembly failed: {reason}")]
    Assembly {
        reason: String,
        /// The corrected document as it stood when assembly failed, so the
        /// caller can still present it
        document: String,
    },
}

impl PipelineError {
    /// HTTP status code for this error at the route boundary
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Recognition(OcrError::InvalidInput(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Recognition(OcrError::RecognitionFailed(_)) => StatusCode::BAD_GATEWAY,
            Self::Assembly { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Partial document that survived the failure, when any exists
    pub fn partial_document(&self) -> Option<&str> {
        match self {
            Self::Assembly { document, .. } => Some(document),
            Self::Recognition(_) => None,
        }
    }
}
