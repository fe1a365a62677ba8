//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::correction::{CorrectionService, HttpBackend};
use crate::diagram::PaperTemplates;
use crate::ocr::{RecognizerService, TesseractEngine};
use crate::pipeline::DocumentAssembler;

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to load paper templates: {0}")]
    Templates(#[from] anyhow::Error),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pub config: Config,
    pub db: SqlitePool,
    pub templates: Arc<PaperTemplates>,
    pub assembler: DocumentAssembler,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Builds the recognition and correction services from the configuration
    /// and loads the diagram-position table (built-in, or replaced from the
    /// configured JSON file).
    pub fn new(config: Config, db: SqlitePool) -> Result<Self, StateError> {
        let templates = match &config.templates.path {
            Some(path) => {
                let loaded = PaperTemplates::from_json_file(path)?;
                tracing::info!(
                    papers = loaded.len(),
                    path = %path.display(),
                    "Loaded paper templates from file"
                );
                Arc::new(loaded)
            }
            None => Arc::new(PaperTemplates::builtin()),
        };

        let recognizer = RecognizerService::new(Arc::new(TesseractEngine::new(
            config.recognizer.clone(),
        )));
        let correction = CorrectionService::new(Arc::new(HttpBackend::new(&config.correction)));
        let assembler = DocumentAssembler::new(recognizer, correction, Arc::clone(&templates));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                templates,
                assembler,
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the paper-template table
    pub fn templates(&self) -> &PaperTemplates {
        &self.inner.templates
    }

    /// Get the document assembler
    pub fn assembler(&self) -> &DocumentAssembler {
        &self.inner.assembler
    }
}
