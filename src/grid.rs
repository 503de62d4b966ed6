//! Grid and validity-mask model
//!
//! Every buffer in this crate is a flat slice indexed `x + y * width`, so `x`
//! runs fastest. That is the row-major layout of an `(height, width)` array
//! and matches `ndarray`'s standard layout.
//!
//! A [`PhaseGrid`] is a read-only view over the caller's wrapped phase plus an
//! optional [`ValidityMask`]. It owns nothing and never mutates the input.

use std::f64::consts::PI;
use std::str::FromStr;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, UnwrapError};

pub const TWO_PI: f64 = 2.0 * PI;

/// Slack allowed beyond ±π when validating wrapped input (covers f32 sources)
pub const DEFAULT_PHASE_TOLERANCE: f64 = 1e-6;

/// Wrap angle to (-π, π]
#[inline]
pub fn wrap_to_pi(angle: f64) -> f64 {
    let a = (angle + PI).rem_euclid(TWO_PI) - PI;
    if a <= -PI {
        a + TWO_PI
    } else {
        a
    }
}

/// Number of whole cycles to add to `to - from` so that it lands in (-π, π]
///
/// Integrating across an edge then means
/// `cycles[to] = cycles[from] + cycles_between(phase[from], phase[to])`.
#[inline]
pub fn cycles_between(from: f64, to: f64) -> i32 {
    ((PI - (to - from)) / TWO_PI).floor() as i32
}

/// Index into a 2D array, x fastest
#[inline(always)]
pub(crate) fn idx2d(x: usize, y: usize, width: usize) -> usize {
    x + y * width
}

/// Grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub x: usize,
    pub y: usize,
}

impl Pixel {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

const FOUR_OFFSETS: [(isize, isize); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

// First half points "forward"; entry d and d + 4 are opposite.
const EIGHT_OFFSETS: [(isize, isize); 8] = [
    (1, 0),
    (0, 1),
    (1, 1),
    (-1, 1),
    (-1, 0),
    (0, -1),
    (-1, -1),
    (1, -1),
];

/// Pixel neighbourhood used for integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Right, down, left, up
    #[default]
    Four,
    /// Four plus the diagonals
    Eight,
}

impl Connectivity {
    /// Neighbour offsets `(dx, dy)`; direction `d` and `d + n/2` are opposite
    pub fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &FOUR_OFFSETS,
            Connectivity::Eight => &EIGHT_OFFSETS,
        }
    }

    /// Offsets that enumerate each undirected edge exactly once
    pub fn forward_offsets(self) -> &'static [(isize, isize)] {
        let offsets = self.offsets();
        &offsets[..offsets.len() / 2]
    }

    pub fn directions(self) -> usize {
        self.offsets().len()
    }

    #[inline]
    pub fn opposite(self, dir: usize) -> usize {
        let n = self.directions();
        (dir + n / 2) % n
    }
}

impl FromStr for Connectivity {
    type Err = UnwrapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "4" | "four" => Ok(Connectivity::Four),
            "8" | "eight" => Ok(Connectivity::Eight),
            other => Err(UnwrapError::InvalidConfig(format!(
                "unknown connectivity '{other}' (expected 4 or 8)"
            ))),
        }
    }
}

/// Periodic boundaries per axis
///
/// Useful for MRI data where the field of view wraps. An axis shorter than
/// three pixels is never treated as periodic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WrapAround {
    pub x: bool,
    pub y: bool,
}

/// Boolean validity grid, same layout as the phase buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityMask {
    width: usize,
    height: usize,
    valid: Vec<bool>,
}

impl ValidityMask {
    /// Mask with every pixel valid
    ///
    /// # Panics
    /// If `width * height` overflows `usize`, like any allocation of that size.
    pub fn all_valid(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            valid: vec![true; width * height],
        }
    }

    pub fn from_bools(valid: Vec<bool>, width: usize, height: usize) -> Result<Self> {
        if checked_len(width, height) != Some(valid.len()) {
            return Err(UnwrapError::ShapeMismatch {
                len: valid.len(),
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            valid,
        })
    }

    /// Mask built pixel by pixel from `f(x, y)`
    pub(crate) fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> bool,
    ) -> Self {
        let mut valid = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                valid.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            valid,
        }
    }

    /// Byte mask where any non-zero value marks a valid pixel
    pub fn from_u8(mask: &[u8], width: usize, height: usize) -> Result<Self> {
        Self::from_bools(mask.iter().map(|&m| m != 0).collect(), width, height)
    }

    /// Mask from an `(height, width)` array
    pub fn from_array(mask: ArrayView2<'_, bool>) -> Self {
        let (height, width) = mask.dim();
        Self {
            width,
            height,
            valid: mask.iter().copied().collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.valid
    }

    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        self.valid[idx]
    }

    pub fn is_valid_at(&self, p: Pixel) -> Result<bool> {
        self.check_bounds(p)?;
        Ok(self.valid[idx2d(p.x, p.y, self.width)])
    }

    /// Include or exclude a single pixel
    pub fn set(&mut self, p: Pixel, valid: bool) -> Result<()> {
        self.check_bounds(p)?;
        self.valid[idx2d(p.x, p.y, self.width)] = valid;
        Ok(())
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    fn check_bounds(&self, p: Pixel) -> Result<()> {
        if p.x >= self.width || p.y >= self.height {
            return Err(UnwrapError::OutOfBounds {
                x: p.x,
                y: p.y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Read-only view over wrapped phase and its validity mask
#[derive(Debug, Clone, Copy)]
pub struct PhaseGrid<'a> {
    phase: &'a [f64],
    mask: Option<&'a ValidityMask>,
    width: usize,
    height: usize,
    connectivity: Connectivity,
    wrap_x: bool,
    wrap_y: bool,
}

impl<'a> PhaseGrid<'a> {
    /// Build a grid view, checking shape and the phase range of valid pixels
    pub fn new(
        phase: &'a [f64],
        width: usize,
        height: usize,
        mask: Option<&'a ValidityMask>,
    ) -> Result<Self> {
        Self::with_tolerance(phase, width, height, mask, DEFAULT_PHASE_TOLERANCE)
    }

    /// Same as [`PhaseGrid::new`] with an explicit range tolerance
    ///
    /// Valid pixels must be finite and lie in `[-π - tolerance, π + tolerance]`.
    /// Masked pixels are never read, so they may hold anything (including NaN).
    pub fn with_tolerance(
        phase: &'a [f64],
        width: usize,
        height: usize,
        mask: Option<&'a ValidityMask>,
        tolerance: f64,
    ) -> Result<Self> {
        if checked_len(width, height) != Some(phase.len()) {
            return Err(UnwrapError::ShapeMismatch {
                len: phase.len(),
                width,
                height,
            });
        }
        if let Some(m) = mask {
            if m.width != width || m.height != height {
                return Err(UnwrapError::DimensionMismatch {
                    width,
                    height,
                    mask_width: m.width,
                    mask_height: m.height,
                });
            }
        }

        let grid = Self {
            phase,
            mask,
            width,
            height,
            connectivity: Connectivity::default(),
            wrap_x: false,
            wrap_y: false,
        };

        let limit = PI + tolerance;
        for (idx, &value) in phase.iter().enumerate() {
            if grid.is_valid(idx) && !(value.is_finite() && value.abs() <= limit) {
                let p = grid.pixel(idx);
                return Err(UnwrapError::PhaseOutOfRange {
                    x: p.x,
                    y: p.y,
                    value,
                });
            }
        }

        Ok(grid)
    }

    /// Set the neighbourhood and boundary handling
    pub fn with_topology(mut self, connectivity: Connectivity, wrap: WrapAround) -> Self {
        self.connectivity = connectivity;
        self.wrap_x = wrap.x && self.width >= 3;
        self.wrap_y = wrap.y && self.height >= 3;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.phase.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phase.is_empty()
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn wraps_x(&self) -> bool {
        self.wrap_x
    }

    pub fn wraps_y(&self) -> bool {
        self.wrap_y
    }

    pub fn phase_slice(&self) -> &'a [f64] {
        self.phase
    }

    /// Flat index of a pixel, rejecting coordinates outside the grid
    pub fn index(&self, p: Pixel) -> Result<usize> {
        if p.x >= self.width || p.y >= self.height {
            return Err(UnwrapError::OutOfBounds {
                x: p.x,
                y: p.y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(idx2d(p.x, p.y, self.width))
    }

    #[inline]
    pub fn pixel(&self, idx: usize) -> Pixel {
        Pixel::new(idx % self.width, idx / self.width)
    }

    pub fn phase_at(&self, p: Pixel) -> Result<f64> {
        Ok(self.phase[self.index(p)?])
    }

    pub fn is_valid_at(&self, p: Pixel) -> Result<bool> {
        Ok(self.is_valid(self.index(p)?))
    }

    #[inline]
    pub fn phase(&self, idx: usize) -> f64 {
        self.phase[idx]
    }

    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        self.mask.map_or(true, |m| m.is_valid(idx))
    }

    pub fn valid_count(&self) -> usize {
        self.mask.map_or(self.len(), ValidityMask::valid_count)
    }

    /// Pixel reached by moving `(dx, dy)` from `idx`, honouring periodic axes
    ///
    /// `idx` must lie inside the grid.
    #[inline]
    pub(crate) fn offset(&self, idx: usize, dx: isize, dy: isize) -> Option<usize> {
        let x = shift(idx % self.width, dx, self.width, self.wrap_x)?;
        let y = shift(idx / self.width, dy, self.height, self.wrap_y)?;
        Some(idx2d(x, y, self.width))
    }

    /// Valid neighbours of `idx` as `(direction, neighbour)` pairs
    pub(crate) fn neighbors(&self, idx: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        debug_assert!(idx < self.len());
        self.connectivity
            .offsets()
            .iter()
            .enumerate()
            .filter_map(move |(dir, &(dx, dy))| self.offset(idx, dx, dy).map(|n| (dir, n)))
            .filter(move |&(_, n)| self.is_valid(n))
    }

    /// Valid neighbours of `p` as `(direction, neighbour)` pairs
    ///
    /// Directions index [`Connectivity::offsets`].
    pub fn neighbors_of(&self, p: Pixel) -> Result<impl Iterator<Item = (usize, Pixel)> + '_> {
        let idx = self.index(p)?;
        Ok(self.neighbors(idx).map(move |(dir, n)| (dir, self.pixel(n))))
    }
}

/// `width * height`, or `None` on overflow
#[inline]
fn checked_len(width: usize, height: usize) -> Option<usize> {
    width.checked_mul(height)
}

#[inline]
fn shift(pos: usize, delta: isize, len: usize, periodic: bool) -> Option<usize> {
    let moved = pos as isize + delta;
    if moved >= 0 && moved < len as isize {
        Some(moved as usize)
    } else if periodic {
        Some(moved.rem_euclid(len as isize) as usize)
    } else {
        None
    }
}
