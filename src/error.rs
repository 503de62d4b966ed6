//! Error type for phase unwrapping
//!
//! Only structural problems with the caller's input are errors. Residues and
//! unreachable pixels are ordinary outcomes and are reported through
//! [`UnwrapResult`](crate::result::UnwrapResult) instead.

use thiserror::Error;

/// Errors that can occur while preparing or running an unwrap
#[derive(Debug, Error)]
pub enum UnwrapError {
    /// Phase buffer length does not match the declared dimensions
    #[error("phase buffer holds {len} samples, expected {width}x{height}")]
    ShapeMismatch {
        len: usize,
        width: usize,
        height: usize,
    },

    /// Mask and phase dimensions differ
    #[error("mask is {mask_width}x{mask_height} but phase is {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        mask_width: usize,
        mask_height: usize,
    },

    /// A valid pixel holds a value outside [-π, π] or a non-finite value
    #[error("phase value {value} at ({x}, {y}) is outside [-pi, pi]")]
    PhaseOutOfRange { x: usize, y: usize, value: f64 },

    /// Coordinate lies outside the grid
    #[error("pixel ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// Requested seed pixel is excluded by the mask
    #[error("seed pixel ({x}, {y}) is masked out")]
    InvalidSeed { x: usize, y: usize },

    /// Pixel was not reached by the integration, so it carries no value
    #[error("pixel ({x}, {y}) was not reached by the unwrap")]
    NotReached { x: usize, y: usize },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Array conversion failed
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, UnwrapError>;
