//! Helpers around the unwrapper: masks, thresholds and accuracy metrics

pub mod mask;
pub mod metrics;
pub mod threshold;

pub use mask::{centered_aperture, circular_mask, magnitude_mask, otsu_magnitude_mask};
pub use metrics::{discontinuities, masked_difference_variance, masked_rmse, rewrap_error};
pub use threshold::otsu_threshold;
