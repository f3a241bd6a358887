//! Perceptual "close enough" comparison between a capture and its baseline.
//!
//! The score is the fraction of pixel positions whose RGB values are
//! identical in both images, so 1.0 means pixel-identical. Images with
//! different dimensions cannot be aligned and score 0.0. The score is
//! symmetric in its arguments and reflexive (an image scores 1.0 against
//! itself).

use image::RgbImage;

/// Minimum similarity for a capture to be considered a match
pub const DEFAULT_TOLERANCE: f64 = 0.9;

/// Similarity between two images in `[0.0, 1.0]`
pub fn similarity(a: &RgbImage, b: &RgbImage) -> f64 {
    if a.dimensions() != b.dimensions() {
        return 0.0;
    }

    let total = u64::from(a.width()) * u64::from(a.height());
    if total == 0 {
        return 1.0;
    }

    let same = a
        .pixels()
        .zip(b.pixels())
        .filter(|(pa, pb)| pa == pb)
        .count() as u64;

    same as f64 / total as f64
}
