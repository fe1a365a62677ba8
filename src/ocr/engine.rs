//! Recognition engines
//!
//! Defines the engine trait and the Tesseract subprocess implementation.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RecognizerConfig;

use super::types::{
    ImageSource, LineBox, OcrError, ProgressReporter, RecognitionResult, RecognizedLine,
    HEADING_HEIGHT_THRESHOLD,
};

/// Numbered-section pattern used by the heading heuristic
static NUMBERED_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").expect("valid regex"));

/// Text-recognition engine
///
/// Implementations must release any scoped resource (temp files, worker
/// sessions) on every exit path, and must not touch the progress reporter
/// after returning.
#[async_trait]
pub trait RecognizerEngine: Send + Sync {
    /// Recognize text from an image, reporting coarse progress along the way.
    async fn recognize(
        &self,
        image: &ImageSource,
        progress: &mut ProgressReporter,
    ) -> Result<RecognitionResult, OcrError>;
}

/// Tesseract CLI engine
///
/// Shells out to the `tesseract` binary with a fixed language set,
/// page-segmentation mode, and character whitelist, and parses the TSV
/// output for per-line geometry.
pub struct TesseractEngine {
    config: RecognizerConfig,
}

impl TesseractEngine {
    pub fn new(config: RecognizerConfig) -> Self {
        Self { config }
    }

    /// Check whether the tesseract binary is runnable.
    pub async fn is_available(&self) -> bool {
        let result = tokio::process::Command::new(&self.config.tesseract_path)
            .arg("--version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await;

        matches!(result, Ok(status) if status.success())
    }
}

#[async_trait]
impl RecognizerEngine for TesseractEngine {
    async fn recognize(
        &self,
        image: &ImageSource,
        progress: &mut ProgressReporter,
    ) -> Result<RecognitionResult, OcrError> {
        progress.report(5);

        let temp_dir = std::env::temp_dir();
        let unique_id = uuid::Uuid::new_v4();
        let input_path = temp_dir.join(format!("prashna_ocr_{}.png", unique_id));
        let output_base = temp_dir.join(format!("prashna_ocr_{}", unique_id));

        tokio::fs::write(&input_path, &image.bytes)
            .await
            .map_err(|e| OcrError::RecognitionFailed(format!("Failed to write temp file: {}", e)))?;

        progress.report(15);

        let mut cmd = tokio::process::Command::new(&self.config.tesseract_path);
        cmd.arg(&input_path).arg(&output_base);
        cmd.arg("-l").arg(&self.config.languages);
        cmd.arg("--psm").arg(self.config.page_seg_mode.to_string());
        if let Some(dir) = &self.config.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd.arg("-c")
            .arg(format!("tessedit_char_whitelist={}", self.config.char_whitelist));
        cmd.arg("-c").arg("preserve_interword_spaces=1");
        cmd.arg("tsv");

        let output = cmd.output().await;

        // Input temp file is no longer needed whatever happened
        let _ = tokio::fs::remove_file(&input_path).await;

        let output = output
            .map_err(|e| OcrError::RecognitionFailed(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!("tesseract exited with {}: {}", output.status, stderr);
            return Err(OcrError::RecognitionFailed(format!(
                "tesseract failed: {}",
                stderr
            )));
        }

        progress.report(70);

        let tsv_path = format!("{}.tsv", output_base.display());
        let tsv = tokio::fs::read_to_string(&tsv_path).await;
        let _ = tokio::fs::remove_file(&tsv_path).await;

        let tsv = tsv
            .map_err(|e| OcrError::RecognitionFailed(format!("Failed to read output: {}", e)))?;

        let result = parse_tsv(&tsv);
        progress.report(100);

        Ok(result)
    }
}

/// Parse tesseract TSV output into recognized lines.
///
/// Level 4 rows open a line and carry its bounding box; level 5 rows carry
/// the words. Empty words are skipped.
pub(crate) fn parse_tsv(tsv: &str) -> RecognitionResult {
    struct OpenLine {
        bbox: LineBox,
        words: Vec<String>,
    }

    let mut lines: Vec<RecognizedLine> = Vec::new();
    let mut current: Option<OpenLine> = None;

    let flush = |open: Option<OpenLine>, lines: &mut Vec<RecognizedLine>| {
        if let Some(open) = open {
            if !open.words.is_empty() {
                let content = open.words.join(" ");
                let heading = open.bbox.height() > HEADING_HEIGHT_THRESHOLD
                    && NUMBERED_LINE.is_match(&content);
                lines.push(RecognizedLine {
                    content,
                    bbox: open.bbox,
                    heading,
                });
            }
        }
    };

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }

        let level: u8 = match cols[0].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };

        match level {
            4 => {
                let parse = |i: usize| cols[i].parse::<u32>().unwrap_or(0);
                let (left, top, width, height) = (parse(6), parse(7), parse(8), parse(9));
                flush(current.take(), &mut lines);
                current = Some(OpenLine {
                    bbox: LineBox {
                        x1: left,
                        y1: top,
                        x2: left + width,
                        y2: top + height,
                    },
                    words: Vec::new(),
                });
            }
            5 => {
                let word = cols[11].trim();
                if !word.is_empty() {
                    if let Some(open) = current.as_mut() {
                        open.words.push(word.to_string());
                    }
                }
            }
            _ => {}
        }
    }
    flush(current.take(), &mut lines);

    let text = lines
        .iter()
        .map(|l| l.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    RecognitionResult { text, lines }
}

/// Mock engine for testing
#[cfg(test)]
pub struct MockEngine {
    pub result: Result<RecognitionResult, OcrError>,
    /// Progress values emitted before returning
    pub progress: Vec<u8>,
}

#[cfg(test)]
impl MockEngine {
    pub fn with_text(text: &str) -> Self {
        Self {
            result: Ok(RecognitionResult {
                text: text.to_string(),
                lines: Vec::new(),
            }),
            progress: vec![10, 50, 100],
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(OcrError::RecognitionFailed(message.to_string())),
            progress: vec![10],
        }
    }
}

#[cfg(test)]
#[async_trait]
impl RecognizerEngine for MockEngine {
    async fn recognize(
        &self,
        _image: &ImageSource,
        progress: &mut ProgressReporter,
    ) -> Result<RecognitionResult, OcrError> {
        for p in &self.progress {
            progress.report(*p);
        }
        match &self.result {
            Ok(result) => Ok(result.clone()),
            Err(OcrError::InvalidInput(m)) => Err(OcrError::InvalidInput(m.clone())),
            Err(OcrError::RecognitionFailed(m)) => Err(OcrError::RecognitionFailed(m.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
1\t1\t0\t0\t0\t0\t0\t0\t800\t1000\t-1\t\n\
4\t1\t1\t1\t1\t0\t20\t30\t700\t60\t-1\t\n\
5\t1\t1\t1\t1\t1\t20\t30\t40\t60\t96\t3.\n\
5\t1\t1\t1\t1\t2\t70\t30\t120\t60\t95\tAnswer\n\
5\t1\t1\t1\t1\t3\t200\t30\t80\t60\t93\tall\n\
4\t1\t1\t1\t2\t0\t20\t120\t400\t30\t-1\t\n\
5\t1\t1\t1\t2\t1\t20\t120\t60\t30\t91\t(a)\n\
5\t1\t1\t1\t2\t2\t90\t120\t90\t30\t90\tfirst\n";

    #[test]
    fn test_parse_tsv_groups_words_into_lines() {
        let result = parse_tsv(SAMPLE_TSV);

        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].content, "3. Answer all");
        assert_eq!(result.lines[1].content, "(a) first");
        assert_eq!(result.text, "3. Answer all\n(a) first");
    }

    #[test]
    fn test_parse_tsv_heading_heuristic() {
        let result = parse_tsv(SAMPLE_TSV);

        // 60px tall numbered line is a heading candidate; 30px line is not
        assert!(result.lines[0].heading);
        assert!(!result.lines[1].heading);
    }

    #[test]
    fn test_parse_tsv_line_geometry() {
        let result = parse_tsv(SAMPLE_TSV);
        let bbox = result.lines[0].bbox;

        assert_eq!((bbox.x1, bbox.y1, bbox.x2, bbox.y2), (20, 30, 720, 90));
        assert_eq!(bbox.height(), 60);
    }

    #[test]
    fn test_parse_tsv_empty_output() {
        let result = parse_tsv("level\tpage_num\n");
        assert!(result.text.is_empty());
        assert!(result.lines.is_empty());
    }
}
