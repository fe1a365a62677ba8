//! Correction Module
//!
//! Model-assisted reformatting of raw OCR text into semantically tagged
//! markup, driven by a fixed instruction policy and an Ollama-compatible
//! endpoint. Falls back to the raw text whenever the service misbehaves.

mod policy;
mod service;
mod types;

pub use policy::{build_prompt, POLICY_VERSION, SYSTEM_PROMPT};
pub use service::{CorrectionBackend, CorrectionService, HttpBackend};
pub use types::{CorrectedPayload, CorrectionError, GenerateRequest, GenerateResponse};

#[cfg(test)]
pub use service::MockBackend;
