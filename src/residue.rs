//! Residue detection
//!
//! A residue is an elementary 2x2 loop whose wrapped phase differences do not
//! sum to zero. Integration is path-independent only on residue-free regions,
//! so the residue map tells the integration engine where paths disagree.
//!
//! Each loop is traversed right, down, left, up starting at the cell origin.
//! The charge is the sum of the per-edge wrap counts, which equals
//! `Σ wrap(Δφ) / 2π` but is computed in integer arithmetic and is exact.

use serde::{Deserialize, Serialize};

use crate::error::{Result, UnwrapError};
use crate::grid::{cycles_between, idx2d, PhaseGrid, Pixel};

/// Net wrap count around one elementary cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Residue {
    Zero,
    Positive,
    Negative,
    /// At least one corner is masked out
    Undefined,
}

impl Residue {
    fn from_charge(charge: Option<i8>) -> Self {
        match charge {
            None => Residue::Undefined,
            Some(0) => Residue::Zero,
            Some(c) if c > 0 => Residue::Positive,
            Some(_) => Residue::Negative,
        }
    }
}

/// Signed residue charges over the grid's elementary cells
///
/// Cell `(cx, cy)` has its origin at pixel `(cx, cy)`. A non-periodic axis of
/// length `n` has `n - 1` cells; a periodic one has `n`.
#[derive(Debug, Clone)]
pub struct ResidueMap {
    width: usize,
    height: usize,
    wrap_x: bool,
    wrap_y: bool,
    charges: Vec<Option<i8>>,
}

impl ResidueMap {
    /// Compute the charge of every cell in the grid
    pub fn detect(grid: &PhaseGrid<'_>) -> Self {
        let width = if grid.wraps_x() {
            grid.width()
        } else {
            grid.width().saturating_sub(1)
        };
        let height = if grid.wraps_y() {
            grid.height()
        } else {
            grid.height().saturating_sub(1)
        };

        let mut charges = Vec::with_capacity(width * height);
        for cy in 0..height {
            for cx in 0..width {
                charges.push(loop_charge(grid, idx2d(cx, cy, grid.width())));
            }
        }

        let map = Self {
            width,
            height,
            wrap_x: grid.wraps_x(),
            wrap_y: grid.wraps_y(),
            charges,
        };
        tracing::debug!(
            "residue map {}x{}: {} positive, {} negative, {} undefined cells",
            width,
            height,
            map.positive(),
            map.negative(),
            map.undefined_cells()
        );
        map
    }

    /// Number of cells along x and y
    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Charge of a cell, `None` when the cell has a masked corner
    pub fn charge(&self, cx: usize, cy: usize) -> Result<Option<i8>> {
        if cx >= self.width || cy >= self.height {
            return Err(UnwrapError::OutOfBounds {
                x: cx,
                y: cy,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.charges[idx2d(cx, cy, self.width)])
    }

    pub fn residue(&self, cx: usize, cy: usize) -> Result<Residue> {
        self.charge(cx, cy).map(Residue::from_charge)
    }

    /// Total residue count, `Σ |charge|` over defined cells
    pub fn count(&self) -> usize {
        self.charges
            .iter()
            .flatten()
            .map(|c| c.unsigned_abs() as usize)
            .sum()
    }

    pub fn positive(&self) -> usize {
        self.charges.iter().flatten().filter(|&&c| c > 0).count()
    }

    pub fn negative(&self) -> usize {
        self.charges.iter().flatten().filter(|&&c| c < 0).count()
    }

    pub fn undefined_cells(&self) -> usize {
        self.charges.iter().filter(|c| c.is_none()).count()
    }

    /// Origins and charges of all non-zero cells, in scan order
    pub fn residues(&self) -> Vec<(Pixel, i8)> {
        self.charges
            .iter()
            .enumerate()
            .filter_map(|(i, c)| match c {
                Some(c) if *c != 0 => Some((Pixel::new(i % self.width, i / self.width), *c)),
                _ => None,
            })
            .collect()
    }

    /// Cell lookup with signed coordinates, wrapping periodic axes
    ///
    /// The outer `None` means there is no cell at that position (beyond a
    /// non-periodic border); the inner one marks an undefined cell.
    pub(crate) fn cell_near(&self, cx: isize, cy: isize) -> Option<Option<i8>> {
        let cx = wrap_cell(cx, self.width, self.wrap_x)?;
        let cy = wrap_cell(cy, self.height, self.wrap_y)?;
        Some(self.charges[idx2d(cx, cy, self.width)])
    }
}

fn wrap_cell(c: isize, len: usize, periodic: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if c >= 0 && c < len as isize {
        Some(c as usize)
    } else if periodic {
        Some(c.rem_euclid(len as isize) as usize)
    } else {
        None
    }
}

fn loop_charge(grid: &PhaseGrid<'_>, origin: usize) -> Option<i8> {
    let corners = [
        origin,
        grid.offset(origin, 1, 0)?,
        grid.offset(origin, 1, 1)?,
        grid.offset(origin, 0, 1)?,
    ];
    if !corners.iter().all(|&p| grid.is_valid(p)) {
        return None;
    }

    let charge: i32 = (0..4)
        .map(|i| cycles_between(grid.phase(corners[i]), grid.phase(corners[(i + 1) % 4])))
        .sum();
    Some(charge as i8)
}
