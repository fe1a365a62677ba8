//! OCR Module
//!
//! Wraps the text-recognition engine (Tesseract invoked as a subprocess)
//! behind an async trait, normalizes its progress into a monotonic
//! percentage stream, and returns recognized text with per-line geometry.

mod engine;
mod service;
mod types;

pub use engine::{RecognizerEngine, TesseractEngine};
pub use service::RecognizerService;
pub use types::{
    ImageSource, LineBox, OcrError, ProgressReporter, RecognitionResult, RecognizedLine,
    HEADING_HEIGHT_THRESHOLD,
};

#[cfg(test)]
pub use engine::MockEngine;
