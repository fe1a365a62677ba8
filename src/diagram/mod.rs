//! Diagram Module
//!
//! Resolves which exam questions reference a diagram, locates each
//! diagram's pixel region for the recognized paper template, and crops the
//! region into a standalone embeddable artifact.
//!
//! The resolver functions are pure; the only shared state is the immutable
//! [`PaperTemplates`] table injected at startup.

mod crop;
mod resolver;
mod templates;
mod types;

pub use crop::{crop_decoded, crop_region};
pub use resolver::{extract_paper_code, find_diagram_questions, normalize_key, DIAGRAM_KEY};
pub use templates::PaperTemplates;
pub use types::{CroppedDiagram, DiagramError, DiagramRegion};
