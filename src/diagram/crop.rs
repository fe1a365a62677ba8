//! Region cropper
//!
//! Cuts a diagram region out of the source image and encodes it as a
//! standalone PNG artifact with a data URI for embedding.

use base64::Engine;
use image::DynamicImage;

use crate::ocr::ImageSource;

use super::types::{CroppedDiagram, DiagramError, DiagramRegion};

/// Crop a region out of a source image.
///
/// The region must lie entirely within the image; violations fail with
/// [`DiagramError::RegionOutOfBounds`] and produce no artifact. Identical
/// image and region always yield a byte-identical artifact.
pub fn crop_region(
    source: &ImageSource,
    key: &str,
    region: &DiagramRegion,
) -> Result<CroppedDiagram, DiagramError> {
    if !region.fits_within(source.width, source.height) {
        return Err(DiagramError::RegionOutOfBounds {
            region: *region,
            width: source.width,
            height: source.height,
        });
    }

    let img = image::load_from_memory(&source.bytes)
        .map_err(|e| DiagramError::Decode(e.to_string()))?;

    crop_decoded(&img, key, region)
}

/// Crop from an already-decoded image.
///
/// Used by the assembler to decode the source once and fan out per key.
/// The caller is responsible for the containment check against the original
/// source dimensions.
pub fn crop_decoded(
    img: &DynamicImage,
    key: &str,
    region: &DiagramRegion,
) -> Result<CroppedDiagram, DiagramError> {
    if !region.fits_within(img.width(), img.height()) {
        return Err(DiagramError::RegionOutOfBounds {
            region: *region,
            width: img.width(),
            height: img.height(),
        });
    }

    let cropped = img.crop_imm(region.x, region.y, region.width, region.height);

    let mut png = Vec::new();
    cropped
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| DiagramError::Encode(e.to_string()))?;

    let data_uri = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&png)
    );

    Ok(CroppedDiagram {
        key: key.to_string(),
        png,
        data_uri,
    })
}
