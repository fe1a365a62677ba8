//! Document assembler
//!
//! Orchestrates recognition, correction, diagram resolution, and cropping
//! into one forward-only pipeline run, then splices the cropped diagrams
//! into the corrected markup at their placeholder anchors.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::mpsc;

use crate::correction::CorrectionService;
use crate::diagram::{
    crop_decoded, extract_paper_code, find_diagram_questions, normalize_key, CroppedDiagram,
    DiagramRegion, PaperTemplates, DIAGRAM_KEY,
};
use crate::ocr::{ImageSource, OcrError, RecognizerService};

use super::types::{AssembledDocument, PipelineError, PipelineStage};

/// Concurrent crops per run; cropping is CPU-bound and regions are few
const MAX_CONCURRENT_CROPS: usize = 4;

/// Canonical placeholder form emitted by the correction policy
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<diagram\s+id="([^"]*)"\s*/>"#).expect("valid regex"));

/// Anchored variant used to validate each diagram tag in isolation
static PLACEHOLDER_EXACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^<diagram\s+id="([^"]*)"\s*/>$"#).expect("valid regex"));

/// Any tag that opens with the diagram element name, well-formed or not
static ANY_DIAGRAM_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<diagram\b[^>]*>").expect("valid regex"));

/// Document assembler
pub struct DocumentAssembler {
    recognizer: RecognizerService,
    correction: CorrectionService,
    templates: Arc<PaperTemplates>,
}

impl DocumentAssembler {
    pub fn new(
        recognizer: RecognizerService,
        correction: CorrectionService,
        templates: Arc<PaperTemplates>,
    ) -> Self {
        Self {
            recognizer,
            correction,
            templates,
        }
    }

    /// Run the full pipeline over one source image.
    ///
    /// Stages run strictly in order; recognition progress streams over
    /// `progress_tx`. Only recognition faults and assembly faults abort the
    /// run - correction and per-diagram failures degrade the output instead.
    pub async fn assemble(
        &self,
        image: &ImageSource,
        progress_tx: Option<mpsc::Sender<u8>>,
    ) -> Result<AssembledDocument, PipelineError> {
        let mut stage = PipelineStage::Idle;

        let result = self.run(image, progress_tx, &mut stage).await;
        if result.is_err() {
            advance(&mut stage, PipelineStage::Failed);
        }
        result
    }

    async fn run(
        &self,
        image: &ImageSource,
        progress_tx: Option<mpsc::Sender<u8>>,
        stage: &mut PipelineStage,
    ) -> Result<AssembledDocument, PipelineError> {
        advance(stage, PipelineStage::Recognizing);
        let recognized = self.recognizer.recognize(image, progress_tx).await?;

        advance(stage, PipelineStage::Correcting);
        let corrected = self.correction.correct(&recognized.marked_text()).await;

        advance(stage, PipelineStage::ResolvingDiagrams);
        let paper_code = extract_paper_code(&corrected);
        let labels = find_diagram_questions(&corrected);

        let crops = match &paper_code {
            Some(code) if !labels.is_empty() => {
                self.resolve_crops(image, code, &labels).await?
            }
            _ => {
                if !labels.is_empty() {
                    tracing::debug!(
                        labels = labels.len(),
                        "Diagram questions found but no paper code; skipping diagrams"
                    );
                }
                HashMap::new()
            }
        };

        advance(stage, PipelineStage::Assembling);
        let html = apply_replacements(&corrected, &crops).map_err(|reason| {
            PipelineError::Assembly {
                reason,
                document: corrected.clone(),
            }
        })?;

        advance(stage, PipelineStage::Done);
        Ok(AssembledDocument {
            html,
            paper_code,
            diagrams_detected: labels.len(),
            diagrams_resolved: crops.len(),
        })
    }

    /// Look up every discovered label, then crop the mapped regions with
    /// bounded concurrency. All crops resolve before any text is touched;
    /// results are keyed by diagram key, so completion order cannot affect
    /// the substitution outcome. Per-key failures are logged and skipped.
    async fn resolve_crops(
        &self,
        image: &ImageSource,
        paper_code: &str,
        labels: &[String],
    ) -> Result<HashMap<String, CroppedDiagram>, PipelineError> {
        // Lookups in discovery order; misses and oversized regions skip the key
        let mut found: Vec<(String, DiagramRegion)> = Vec::new();
        for label in labels {
            let region = match self.templates.lookup(paper_code, label) {
                Some(region) => region,
                None => {
                    tracing::debug!(paper_code, label = label.as_str(), "No diagram region mapped");
                    continue;
                }
            };
            if !region.fits_within(image.width, image.height) {
                tracing::warn!(
                    paper_code,
                    label = label.as_str(),
                    "Template region exceeds image bounds; skipping"
                );
                continue;
            }
            if let Some(key) = normalize_key(label) {
                found.push((key, region));
            }
        }

        if found.is_empty() {
            return Ok(HashMap::new());
        }

        // Decode once for the whole fan-out; the bytes already decoded at
        // capture time, so a failure here means the source got corrupted
        let decoded = image::load_from_memory(&image.bytes).map_err(|e| {
            PipelineError::Recognition(OcrError::InvalidInput(format!(
                "Source image no longer decodable: {}",
                e
            )))
        })?;
        let decoded = Arc::new(decoded);

        let crops: Vec<Option<CroppedDiagram>> = stream::iter(found.into_iter().map(
            |(key, region)| {
                let decoded = Arc::clone(&decoded);
                async move {
                    let result = tokio::task::spawn_blocking(move || {
                        crop_decoded(&decoded, &key, &region)
                    })
                    .await;

                    match result {
                        Ok(Ok(crop)) => Some(crop),
                        Ok(Err(e)) => {
                            tracing::warn!("Cropping failed: {}", e);
                            None
                        }
                        Err(e) => {
                            tracing::warn!("Crop task panicked: {}", e);
                            None
                        }
                    }
                }
            },
        ))
        .buffer_unordered(MAX_CONCURRENT_CROPS)
        .collect()
        .await;

        Ok(crops
            .into_iter()
            .flatten()
            .map(|crop| (crop.key.clone(), crop))
            .collect())
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    tracing::debug!(from = %stage, to = %next, "Pipeline stage transition");
    *stage = next;
}

/// Replace resolved diagram placeholders with embedded image markup.
///
/// Every diagram tag in the document must be a well-formed placeholder
/// whose id satisfies the key grammar; anything else fails the assembly.
/// Placeholders without a crop are left byte-for-byte as they were, and a
/// document without placeholders comes back unchanged.
fn apply_replacements(
    corrected: &str,
    crops: &HashMap<String, CroppedDiagram>,
) -> Result<String, String> {
    for tag in ANY_DIAGRAM_TAG.find_iter(corrected) {
        let tag = tag.as_str();
        let captures = PLACEHOLDER_EXACT
            .captures(tag)
            .ok_or_else(|| format!("Malformed diagram placeholder: {}", tag))?;
        let id = &captures[1];
        if !DIAGRAM_KEY.is_match(id) {
            return Err(format!("Diagram placeholder id '{}' is not a valid key", id));
        }
    }

    let replaced = PLACEHOLDER.replace_all(corrected, |captures: &regex::Captures| {
        let id = &captures[1];
        match crops.get(id) {
            Some(crop) => format!(
                r#"<img src="{}" alt="Diagram {}">"#,
                crop.data_uri,
                html_escape::encode_double_quoted_attribute(id)
            ),
            // Unresolved placeholders stay exactly as they were
            None => captures[0].to_string(),
        }
    });

    Ok(replaced.into_owned())
}
