//! Recognizer service
//!
//! Thin adapter over a recognition engine: owns the progress channel
//! plumbing and guarantees nothing is reported after the call resolves.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use super::engine::RecognizerEngine;
use super::types::{ImageSource, OcrError, ProgressReporter, RecognitionResult};

/// Recognizer service
pub struct RecognizerService {
    engine: Arc<dyn RecognizerEngine>,
}

impl RecognizerService {
    pub fn new(engine: Arc<dyn RecognizerEngine>) -> Self {
        Self { engine }
    }

    /// Recognize text from an image.
    ///
    /// Progress percentages stream over `progress_tx` while recognition runs;
    /// the reporter is dropped before this returns, so no value arrives after
    /// the result. The service does not retry engine faults.
    pub async fn recognize(
        &self,
        image: &ImageSource,
        progress_tx: Option<mpsc::Sender<u8>>,
    ) -> Result<RecognitionResult, OcrError> {
        let started = Instant::now();
        let mut reporter = ProgressReporter::new(progress_tx);

        let result = self.engine.recognize(image, &mut reporter).await;
        drop(reporter);

        match &result {
            Ok(recognized) => {
                tracing::debug!(
                    lines = recognized.lines.len(),
                    chars = recognized.text.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Recognition complete"
                );
            }
            Err(e) => {
                tracing::warn!("Recognition failed: {}", e);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::engine::MockEngine;

    fn test_image() -> ImageSource {
        let img = image::RgbImage::from_pixel(100, 100, image::Rgb([255, 255, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut buf),
                image::ImageFormat::Png,
            )
            .unwrap();
        ImageSource::from_bytes(buf).unwrap()
    }

    #[tokio::test]
    async fn test_progress_ends_before_result() {
        let service = RecognizerService::new(Arc::new(MockEngine::with_text("hello")));
        let (tx, mut rx) = mpsc::channel(16);

        let result = service.recognize(&test_image(), Some(tx)).await.unwrap();
        assert_eq!(result.text, "hello");

        // Sender side is dropped by now: drain without blocking and hit the
        // closed channel, proving nothing arrives after the call resolved.
        let mut seen = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(p) => seen.push(p),
                Err(mpsc::error::TryRecvError::Disconnected) => break,
                Err(mpsc::error::TryRecvError::Empty) => panic!("channel still open"),
            }
        }

        assert_eq!(seen, vec![10, 50, 100]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_engine_fault_is_not_retried() {
        let service = RecognizerService::new(Arc::new(MockEngine::failing("engine crashed")));

        let result = service.recognize(&test_image(), None).await;
        assert!(matches!(result, Err(OcrError::RecognitionFailed(_))));
    }
}
