//! Recognition types
//!
//! Defines the input and output types for the text-recognition stage.

use serde::Serialize;
use tokio::sync::mpsc;

/// Bounding-box height above which a line is considered a heading candidate.
pub const HEADING_HEIGHT_THRESHOLD: u32 = 50;

/// A source image captured for one pipeline run.
///
/// Holds the encoded bytes alongside the decoded dimensions so that
/// downstream region checks never have to re-measure the image.
#[derive(Debug, Clone)]
pub struct ImageSource {
    /// Encoded image bytes (PNG or JPEG)
    pub bytes: Vec<u8>,
    /// Pixel width of the decoded image
    pub width: u32,
    /// Pixel height of the decoded image
    pub height: u32,
}

impl ImageSource {
    /// Capture an image from encoded bytes.
    ///
    /// Only PNG and JPEG are accepted; anything else is an invalid input,
    /// not a recognition failure.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, OcrError> {
        let format = image::guess_format(&bytes)
            .map_err(|e| OcrError::InvalidInput(format!("Unrecognized image encoding: {}", e)))?;

        match format {
            image::ImageFormat::Png | image::ImageFormat::Jpeg => {}
            other => {
                return Err(OcrError::InvalidInput(format!(
                    "Unsupported image format: {:?} (expected PNG or JPEG)",
                    other
                )));
            }
        }

        let img = image::load_from_memory(&bytes)
            .map_err(|e| OcrError::InvalidInput(format!("Failed to decode image: {}", e)))?;

        Ok(Self {
            width: img.width(),
            height: img.height(),
            bytes,
        })
    }
}

/// Line geometry in source-image pixel coordinates
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LineBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl LineBox {
    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }
}

/// A single recognized line of text
#[derive(Debug, Clone, Serialize)]
pub struct RecognizedLine {
    /// Line text with words joined by single spaces
    pub content: String,
    /// Bounding box of the line
    pub bbox: LineBox,
    /// Heading candidate flag (large-text heuristic, advisory only)
    pub heading: bool,
}

/// Result of one recognition run
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionResult {
    /// Recognized plain text, one line per recognized line
    pub text: String,
    /// Per-line geometry, when the engine provides it
    pub lines: Vec<RecognizedLine>,
}

impl RecognitionResult {
    /// Plain text with heading candidates wrapped in `<strong>` and lines
    /// joined by `<br>` markers, ready for the correction stage.
    ///
    /// Falls back to the raw text when no line geometry is available.
    pub fn marked_text(&self) -> String {
        if self.lines.is_empty() {
            return self.text.clone();
        }

        self.lines
            .iter()
            .map(|line| {
                if line.heading {
                    format!("<strong>{}</strong>", line.content)
                } else {
                    line.content.clone()
                }
            })
            .collect::<Vec<_>>()
            .join("<br>\n")
    }
}

/// One-way, non-blocking progress channel from the engine to the caller.
///
/// Percentages are clamped to be monotonically non-decreasing and capped at
/// 100. Sends never block: a lagging receiver loses intermediate values
/// rather than stalling recognition, and a dropped receiver is ignored.
#[derive(Debug)]
pub struct ProgressReporter {
    tx: Option<mpsc::Sender<u8>>,
    last: u8,
}

impl ProgressReporter {
    pub fn new(tx: Option<mpsc::Sender<u8>>) -> Self {
        Self { tx, last: 0 }
    }

    /// Reporter that discards every value.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Report a completion percentage.
    ///
    /// Values below the last reported percentage are raised to it, so the
    /// observed sequence is always non-decreasing.
    pub fn report(&mut self, percent: u8) {
        let percent = percent.min(100).max(self.last);
        self.last = percent;
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(percent);
        }
    }

    /// Last percentage reported so far.
    pub fn last(&self) -> u8 {
        self.last
    }
}

/// Recognition error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// The input is not a valid raster image in a supported encoding
    #[error("Invalid input image: {0}")]
    InvalidInput(String),

    /// The recognition engine itself faulted
    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([250, 250, 250]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut buf),
                image::ImageFormat::Png,
            )
            .unwrap();
        buf
    }

    #[test]
    fn test_image_source_decodes_png() {
        let source = ImageSource::from_bytes(png_bytes(640, 480)).unwrap();
        assert_eq!(source.width, 640);
        assert_eq!(source.height, 480);
    }

    #[test]
    fn test_image_source_rejects_garbage() {
        let result = ImageSource::from_bytes(b"not an image at all".to_vec());
        assert!(matches!(result, Err(OcrError::InvalidInput(_))));
    }

    #[test]
    fn test_progress_reporter_is_monotonic() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut reporter = ProgressReporter::new(Some(tx));

        reporter.report(10);
        reporter.report(40);
        reporter.report(25); // regression is clamped up
        reporter.report(100);
        drop(reporter);

        let mut seen = Vec::new();
        while let Ok(p) = rx.try_recv() {
            seen.push(p);
        }

        assert_eq!(seen, vec![10, 40, 40, 100]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_progress_reporter_caps_at_100() {
        let mut reporter = ProgressReporter::disabled();
        reporter.report(250);
        assert_eq!(reporter.last(), 100);
    }

    #[test]
    fn test_marked_text_wraps_headings() {
        let result = RecognitionResult {
            text: "3. Answer all questions\n(a) first".to_string(),
            lines: vec![
                RecognizedLine {
                    content: "3. Answer all questions".to_string(),
                    bbox: LineBox { x1: 10, y1: 100, x2: 700, y2: 160 },
                    heading: true,
                },
                RecognizedLine {
                    content: "(a) first".to_string(),
                    bbox: LineBox { x1: 10, y1: 180, x2: 300, y2: 210 },
                    heading: false,
                },
            ],
        };

        assert_eq!(
            result.marked_text(),
            "<strong>3. Answer all questions</strong><br>\n(a) first"
        );
    }

    #[test]
    fn test_marked_text_without_geometry_is_raw_text() {
        let result = RecognitionResult {
            text: "plain text".to_string(),
            lines: Vec::new(),
        };
        assert_eq!(result.marked_text(), "plain text");
    }
}
