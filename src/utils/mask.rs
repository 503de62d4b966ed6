//! Mask generation utilities
//!
//! Builds [`ValidityMask`]s from geometry (circular apertures) or from a
//! magnitude image.

use crate::error::{Result, UnwrapError};
use crate::grid::ValidityMask;
use crate::utils::threshold::otsu_threshold;

/// Circular aperture: pixels within `radius` of the centre are valid
///
/// Distances are measured between pixel coordinates, so a centre of
/// `((width - 1) / 2, (height - 1) / 2)` gives a symmetric disc.
///
/// # Arguments
/// * `width`, `height` - Grid dimensions
/// * `center_x`, `center_y` - Disc centre in pixel coordinates
/// * `radius` - Disc radius in pixels (squared distance `<= radius²` is inside)
pub fn circular_mask(
    width: usize,
    height: usize,
    center_x: f64,
    center_y: f64,
    radius: f64,
) -> ValidityMask {
    let r2 = radius * radius;
    ValidityMask::from_fn(width, height, |x, y| {
        let dx = x as f64 - center_x;
        let dy = y as f64 - center_y;
        dx * dx + dy * dy <= r2
    })
}

/// Centred circular aperture
pub fn centered_aperture(width: usize, height: usize, radius: f64) -> ValidityMask {
    circular_mask(
        width,
        height,
        (width as f64 - 1.0) / 2.0,
        (height as f64 - 1.0) / 2.0,
        radius,
    )
}

/// Pixels whose magnitude is at least `threshold`
///
/// Non-finite magnitudes are always excluded.
pub fn magnitude_mask(
    magnitude: &[f64],
    width: usize,
    height: usize,
    threshold: f64,
) -> Result<ValidityMask> {
    if width.checked_mul(height) != Some(magnitude.len()) {
        return Err(UnwrapError::ShapeMismatch {
            len: magnitude.len(),
            width,
            height,
        });
    }
    let valid = magnitude
        .iter()
        .map(|&m| m.is_finite() && m >= threshold)
        .collect();
    ValidityMask::from_bools(valid, width, height)
}

/// Magnitude mask with an Otsu threshold (256 bins)
pub fn otsu_magnitude_mask(magnitude: &[f64], width: usize, height: usize) -> Result<ValidityMask> {
    let threshold = otsu_threshold(magnitude, 256);
    tracing::debug!("otsu magnitude threshold {:.4}", threshold);
    magnitude_mask(magnitude, width, height, threshold)
}
