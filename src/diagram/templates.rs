//! Paper templates
//!
//! The diagram-position table: paper code → diagram key → pixel region in
//! the original source image. The table is built once at startup (built-in
//! positions, optionally replaced from a JSON file) and injected where
//! needed; nothing mutates it at runtime.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::resolver::normalize_key;
use super::types::DiagramRegion;

/// Immutable diagram-position table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PaperTemplates {
    papers: HashMap<String, HashMap<String, DiagramRegion>>,
}

impl PaperTemplates {
    /// The built-in position table for known paper templates.
    pub fn builtin() -> Self {
        let mut papers = HashMap::new();

        papers.insert(
            "RE-109P'1".to_string(),
            HashMap::from([
                // Parallelogram
                ("3a".to_string(), DiagramRegion { x: 300, y: 400, width: 250, height: 180 }),
                // Circle
                ("3b".to_string(), DiagramRegion { x: 400, y: 600, width: 200, height: 150 }),
            ]),
        );

        papers.insert(
            "RE-109P'2".to_string(),
            HashMap::from([
                ("3a".to_string(), DiagramRegion { x: 320, y: 410, width: 240, height: 170 }),
                ("3b".to_string(), DiagramRegion { x: 410, y: 610, width: 190, height: 140 }),
            ]),
        );

        Self { papers }
    }

    /// Load a replacement table from a JSON file of the shape
    /// `{"RE-109P'1": {"3a": {"x":300,"y":400,"width":250,"height":180}}}`.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let templates: Self = serde_json::from_str(&raw)?;
        Ok(templates)
    }

    /// Look up the region for a question label within a paper template.
    ///
    /// The label is normalized first (`3(a)` → `3a`); absence of the paper
    /// code, an unsupported label, or an unmapped key all yield `None`.
    pub fn lookup(&self, paper_code: &str, label: &str) -> Option<DiagramRegion> {
        let key = normalize_key(label)?;
        self.papers.get(paper_code)?.get(&key).copied()
    }

    /// Number of paper templates in the table.
    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }
}
