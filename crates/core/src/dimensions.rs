//! Output sizing for generated drafts.
//!
//! The image API accepts a fixed set of output sizes. When a run follows
//! the reference image's aspect ratio, the reference header is read and
//! the closest supported size is chosen.

use std::io::Cursor;

use serde::{Deserialize, Serialize};

/// Width and height of a generated image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn ratio(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Square (1:1).
pub const SQUARE: Dimensions = Dimensions::new(1024, 1024);
/// Portrait (2:3). Used when no reference sizing applies.
pub const PORTRAIT: Dimensions = Dimensions::new(1024, 1536);
/// Landscape (3:2).
pub const LANDSCAPE: Dimensions = Dimensions::new(1536, 1024);

/// Sizes supported by the generation API, in preference order on ties.
pub const SUPPORTED_DIMENSIONS: [Dimensions; 3] = [SQUARE, PORTRAIT, LANDSCAPE];

/// Size used when the reference ratio is not followed or cannot be read.
pub const DEFAULT_DIMENSIONS: Dimensions = PORTRAIT;

/// Pick the supported size whose aspect ratio is closest to the reference.
///
/// Zero-sized references fall back to [`DEFAULT_DIMENSIONS`].
pub fn closest_supported(reference: Dimensions) -> Dimensions {
    if reference.width == 0 || reference.height == 0 {
        return DEFAULT_DIMENSIONS;
    }
    let ratio = reference.ratio();

    let mut best = SUPPORTED_DIMENSIONS[0];
    let mut best_diff = (ratio - best.ratio()).abs();
    for candidate in &SUPPORTED_DIMENSIONS[1..] {
        let diff = (ratio - candidate.ratio()).abs();
        if diff < best_diff {
            best = *candidate;
            best_diff = diff;
        }
    }
    best
}

/// Read the pixel dimensions from an encoded image header.
///
/// Supports PNG, JPEG and WebP. Returns `None` for anything unreadable.
pub fn detect_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    let (width, height) = reader.into_dimensions().ok()?;
    Some(Dimensions::new(width, height))
}

/// Resolve output dimensions for a reference image.
pub fn dimensions_for_reference(bytes: &[u8]) -> Dimensions {
    detect_dimensions(bytes)
        .map(closest_supported)
        .unwrap_or(DEFAULT_DIMENSIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image::RgbImage::new(width, height)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn square_reference_maps_to_square() {
        assert_eq!(closest_supported(Dimensions::new(800, 800)), SQUARE);
    }

    #[test]
    fn tall_reference_maps_to_portrait() {
        assert_eq!(closest_supported(Dimensions::new(600, 1000)), PORTRAIT);
    }

    #[test]
    fn wide_reference_maps_to_landscape() {
        assert_eq!(closest_supported(Dimensions::new(1920, 1080)), LANDSCAPE);
    }

    #[test]
    fn zero_height_falls_back_to_default() {
        assert_eq!(closest_supported(Dimensions::new(100, 0)), DEFAULT_DIMENSIONS);
    }

    #[test]
    fn garbage_bytes_have_no_dimensions() {
        assert_eq!(detect_dimensions(b"not an image"), None);
        assert_eq!(dimensions_for_reference(b"not an image"), DEFAULT_DIMENSIONS);
    }

    #[test]
    fn png_dimensions_detected() {
        let bytes = encoded_png(12, 8);
        assert_eq!(detect_dimensions(&bytes), Some(Dimensions::new(12, 8)));
        assert_eq!(dimensions_for_reference(&bytes), LANDSCAPE);
    }
}
