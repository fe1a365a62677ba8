//! Diagram types
//!
//! Pixel regions, cropped artifacts, and the diagram error taxonomy.

use serde::{Deserialize, Serialize};

/// A top-left-anchored axis-aligned rectangle in the coordinate space of the
/// original, uncropped source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DiagramRegion {
    /// Whether the region lies entirely within an image of the given size.
    ///
    /// Checked with 64-bit arithmetic so degenerate templates cannot wrap.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && (self.x as u64 + self.width as u64) <= image_width as u64
            && (self.y as u64 + self.height as u64) <= image_height as u64
    }
}

/// A standalone cropped diagram image
#[derive(Debug, Clone)]
pub struct CroppedDiagram {
    /// Normalized diagram key this crop belongs to (e.g. `3a`)
    pub key: String,
    /// Encoded PNG bytes
    pub png: Vec<u8>,
    /// `data:image/png;base64,...` URI for embedding
    pub data_uri: String,
}

/// Diagram resolution and cropping errors
///
/// These are recovered per diagram key: a failed key leaves its placeholder
/// unresolved and the run continues.
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    #[error("Region {region:?} exceeds image bounds {width}x{height}")]
    RegionOutOfBounds {
        region: DiagramRegion,
        width: u32,
        height: u32,
    },

    #[error("Failed to decode source image: {0}")]
    Decode(String),

    #[error("Failed to encode cropped region: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_containment() {
        let region = DiagramRegion { x: 300, y: 400, width: 250, height: 180 };

        assert!(region.fits_within(800, 1000));
        assert!(region.fits_within(550, 580)); // exact fit
        assert!(!region.fits_within(549, 1000)); // x + width over
        assert!(!region.fits_within(800, 579)); // y + height over
    }

    #[test]
    fn test_degenerate_region_never_fits() {
        let flat = DiagramRegion { x: 0, y: 0, width: 0, height: 100 };
        assert!(!flat.fits_within(800, 1000));
    }

    #[test]
    fn test_containment_does_not_overflow() {
        let region = DiagramRegion { x: u32::MAX, y: 0, width: u32::MAX, height: 10 };
        assert!(!region.fits_within(u32::MAX, u32::MAX));
    }
}
