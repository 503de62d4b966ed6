//! Unwrapping output
//!
//! The engines produce integer cycle counts; [`assemble`] turns them into
//! phase values as `wrapped + 2π·cycles`, so every reached output re-wraps to
//! its input exactly (up to floating-point rounding of the addition).

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::SeedAnchor;
use crate::error::{Result, UnwrapError};
use crate::grid::{idx2d, PhaseGrid, Pixel, TWO_PI};
use crate::residue::ResidueMap;

/// Region label of pixels no engine reached
pub(crate) const UNREACHED: u32 = u32::MAX;

/// Raw engine output: cycles relative to each region's seed
#[derive(Debug, Clone)]
pub(crate) struct Integrated {
    pub cycles: Vec<i32>,
    pub labels: Vec<u32>,
    /// Seed of region `r` at index `r`
    pub seeds: Vec<usize>,
}

impl Integrated {
    pub fn empty(len: usize) -> Self {
        Self {
            cycles: vec![0; len],
            labels: vec![UNREACHED; len],
            seeds: Vec::new(),
        }
    }
}

/// Summary counts of one unwrapping run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnwrapStats {
    pub valid_pixels: usize,
    pub reached_pixels: usize,
    pub unreached_pixels: usize,
    pub regions: usize,
    pub residue_count: usize,
    pub positive_residues: usize,
    pub negative_residues: usize,
    pub undefined_cells: usize,
}

impl UnwrapStats {
    /// Reached share of the valid pixels, 1 for an empty region
    pub fn coverage(&self) -> f64 {
        if self.valid_pixels == 0 {
            1.0
        } else {
            self.reached_pixels as f64 / self.valid_pixels as f64
        }
    }
}

/// Unwrapped phase plus per-pixel bookkeeping
///
/// Unreached pixels (masked, or cut off from the seed) hold `NaN` in
/// [`unwrapped`](UnwrapResult::unwrapped); use
/// [`filled`](UnwrapResult::filled) for a dense copy.
#[derive(Debug, Clone)]
pub struct UnwrapResult {
    width: usize,
    height: usize,
    unwrapped: Vec<f64>,
    reached: Vec<bool>,
    cycles: Vec<i32>,
    labels: Vec<u32>,
    seeds: Vec<Pixel>,
    unreached: Vec<Pixel>,
    stats: UnwrapStats,
}

pub(crate) fn assemble(
    grid: &PhaseGrid<'_>,
    residues: &ResidueMap,
    integrated: Integrated,
    anchor: SeedAnchor,
) -> UnwrapResult {
    let Integrated {
        cycles,
        labels,
        seeds,
    } = integrated;

    let shifts: Vec<f64> = seeds
        .iter()
        .map(|&s| match anchor {
            SeedAnchor::Wrapped => 0.0,
            SeedAnchor::Zero => grid.phase(s),
        })
        .collect();

    let mut unwrapped = vec![f64::NAN; grid.len()];
    let mut reached = vec![false; grid.len()];
    let mut unreached = Vec::new();
    for i in 0..grid.len() {
        let label = labels[i];
        if label == UNREACHED {
            if grid.is_valid(i) {
                unreached.push(grid.pixel(i));
            }
            continue;
        }
        unwrapped[i] = grid.phase(i) + TWO_PI * f64::from(cycles[i]) - shifts[label as usize];
        reached[i] = true;
    }

    let valid = grid.valid_count();
    let reached_count = valid - unreached.len();
    let stats = UnwrapStats {
        valid_pixels: valid,
        reached_pixels: reached_count,
        unreached_pixels: unreached.len(),
        regions: seeds.len(),
        residue_count: residues.count(),
        positive_residues: residues.positive(),
        negative_residues: residues.negative(),
        undefined_cells: residues.undefined_cells(),
    };
    tracing::debug!(
        "reached {} of {} valid pixels in {} region(s), {} residue(s)",
        reached_count,
        valid,
        stats.regions,
        stats.residue_count
    );
    if !unreached.is_empty() {
        tracing::debug!("{} valid pixel(s) left unreached", unreached.len());
    }

    UnwrapResult {
        width: grid.width(),
        height: grid.height(),
        unwrapped,
        reached,
        cycles,
        labels,
        seeds: seeds.iter().map(|&s| grid.pixel(s)).collect(),
        unreached,
        stats,
    }
}

impl UnwrapResult {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Unwrapped phase, `NaN` where unreached
    pub fn unwrapped(&self) -> &[f64] {
        &self.unwrapped
    }

    pub fn reached(&self) -> &[bool] {
        &self.reached
    }

    /// Whole cycles added to each pixel relative to its region seed
    pub fn cycles(&self) -> &[i32] {
        &self.cycles
    }

    pub fn into_unwrapped(self) -> Vec<f64> {
        self.unwrapped
    }

    /// Residue count of the input (Σ |charge|)
    pub fn residue_count(&self) -> usize {
        self.stats.residue_count
    }

    pub fn stats(&self) -> &UnwrapStats {
        &self.stats
    }

    /// Primary seed, `None` when nothing was valid
    pub fn seed(&self) -> Option<Pixel> {
        self.seeds.first().copied()
    }

    /// Seeds of all unwrapped regions, primary first
    pub fn seeds(&self) -> &[Pixel] {
        &self.seeds
    }

    /// Valid pixels that were not reached, in scan order
    pub fn unreached(&self) -> &[Pixel] {
        &self.unreached
    }

    /// Unwrapped value at `p`, `None` if the pixel was not reached
    pub fn value_at(&self, p: Pixel) -> Result<Option<f64>> {
        let idx = self.index(p)?;
        Ok(self.reached[idx].then_some(self.unwrapped[idx]))
    }

    pub fn is_reached(&self, p: Pixel) -> Result<bool> {
        Ok(self.reached[self.index(p)?])
    }

    /// Region of `p` (0 is the seed's region), `None` if unreached
    pub fn region(&self, p: Pixel) -> Result<Option<usize>> {
        let label = self.labels[self.index(p)?];
        Ok((label != UNREACHED).then_some(label as usize))
    }

    /// Smallest unwrapped value over reached pixels
    pub fn reached_minimum(&self) -> Option<f64> {
        self.unwrapped
            .iter()
            .zip(&self.reached)
            .filter(|(_, &r)| r)
            .map(|(&v, _)| v)
            .reduce(f64::min)
    }

    /// Dense copy with unreached pixels set to `fill`
    pub fn filled(&self, fill: f64) -> Vec<f64> {
        self.unwrapped
            .iter()
            .zip(&self.reached)
            .map(|(&v, &r)| if r { v } else { fill })
            .collect()
    }

    /// Dense copy with unreached pixels set to the reached minimum
    pub fn filled_with_minimum(&self) -> Vec<f64> {
        self.filled(self.reached_minimum().unwrap_or(0.0))
    }

    /// Shift the region containing `p` by whole cycles so that `p` lands as
    /// close as possible to `expected`
    ///
    /// Resolves the global 2π ambiguity against a known reference value.
    /// Returns the number of cycles added.
    pub fn rereference(&mut self, p: Pixel, expected: f64) -> Result<i32> {
        let idx = self.index(p)?;
        if !self.reached[idx] {
            return Err(UnwrapError::NotReached { x: p.x, y: p.y });
        }
        let shift = ((expected - self.unwrapped[idx]) / TWO_PI).round() as i32;
        if shift != 0 {
            let label = self.labels[idx];
            for i in 0..self.unwrapped.len() {
                if self.labels[i] == label {
                    self.unwrapped[i] += TWO_PI * f64::from(shift);
                    self.cycles[i] += shift;
                }
            }
        }
        Ok(shift)
    }

    /// Unwrapped phase and reached flags as `(height, width)` arrays
    pub fn to_arrays(&self) -> Result<(Array2<f64>, Array2<bool>)> {
        let shape = (self.height, self.width);
        let unwrapped = Array2::from_shape_vec(shape, self.unwrapped.clone())?;
        let reached = Array2::from_shape_vec(shape, self.reached.clone())?;
        Ok((unwrapped, reached))
    }

    fn index(&self, p: Pixel) -> Result<usize> {
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{wrap_to_pi, ValidityMask};

    fn sample() -> (Vec<f64>, ValidityMask) {
        let phase = vec![0.5, -3.0, 3.0, 0.0];
        let mask = ValidityMask::from_u8(&[1, 1, 1, 0], 2, 2).unwrap();
        (phase, mask)
    }

    fn integrated() -> Integrated {
        Integrated {
            cycles: vec![0, 1, 0, 0],
            labels: vec![0, 0, 1, UNREACHED],
            seeds: vec![0, 2],
        }
    }

    #[test]
    fn test_assemble_adds_whole_cycles() {
        let (phase, mask) = sample();
        let grid = PhaseGrid::new(&phase, 2, 2, Some(&mask)).unwrap();
        let residues = ResidueMap::detect(&grid);
        let result = assemble(&grid, &residues, integrated(), SeedAnchor::Wrapped);

        assert_eq!(result.unwrapped()[0], 0.5);
        assert!((result.unwrapped()[1] - (-3.0 + TWO_PI)).abs() < 1e-12);
        assert!(result.unwrapped()[3].is_nan());
        assert_eq!(result.reached(), &[true, true, true, false]);
        assert_eq!(result.seed(), Some(Pixel::new(0, 0)));
        assert_eq!(result.seeds().len(), 2);
        assert!(result.unreached().is_empty());
        assert_eq!(result.stats().regions, 2);
        assert_eq!(result.stats().valid_pixels, 3);
        assert_eq!(result.stats().undefined_cells, 1);

        for i in 0..3 {
            assert!((wrap_to_pi(result.unwrapped()[i]) - phase[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_anchor_shifts_each_region() {
        let (phase, mask) = sample();
        let grid = PhaseGrid::new(&phase, 2, 2, Some(&mask)).unwrap();
        let residues = ResidueMap::detect(&grid);
        let result = assemble(&grid, &residues, integrated(), SeedAnchor::Zero);
        assert_eq!(result.unwrapped()[0], 0.0);
        assert_eq!(result.unwrapped()[2], 0.0);
        assert!((result.unwrapped()[1] - (-3.5 + TWO_PI)).abs() < 1e-12);
    }

    #[test]
    fn test_unreached_valid_pixels_reported() {
        let (phase, _) = sample();
        let grid = PhaseGrid::new(&phase, 2, 2, None).unwrap();
        let residues = ResidueMap::detect(&grid);
        let result = assemble(&grid, &residues, integrated(), SeedAnchor::Wrapped);
        assert_eq!(result.unreached(), &[Pixel::new(1, 1)]);
        assert_eq!(result.stats().unreached_pixels, 1);
        assert!((result.stats().coverage() - 0.75).abs() < 1e-12);
        assert_eq!(result.value_at(Pixel::new(1, 1)).unwrap(), None);
        assert_eq!(result.region(Pixel::new(1, 1)).unwrap(), None);
        assert_eq!(result.region(Pixel::new(0, 1)).unwrap(), Some(1));
    }

    #[test]
    fn test_fill_helpers() {
        let (phase, mask) = sample();
        let grid = PhaseGrid::new(&phase, 2, 2, Some(&mask)).unwrap();
        let residues = ResidueMap::detect(&grid);
        let result = assemble(&grid, &residues, integrated(), SeedAnchor::Wrapped);

        assert_eq!(result.reached_minimum(), Some(0.5));
        assert_eq!(result.filled(-7.0)[3], -7.0);
        assert_eq!(result.filled_with_minimum()[3], 0.5);
        assert!(!result.is_reached(Pixel::new(1, 1)).unwrap());
        assert!(result.value_at(Pixel::new(2, 0)).is_err());
    }

    #[test]
    fn test_rereference_shifts_only_that_region() {
        let (phase, mask) = sample();
        let grid = PhaseGrid::new(&phase, 2, 2, Some(&mask)).unwrap();
        let residues = ResidueMap::detect(&grid);
        let mut result = assemble(&grid, &residues, integrated(), SeedAnchor::Wrapped);

        let shift = result.rereference(Pixel::new(0, 0), 0.5 + 2.0 * TWO_PI).unwrap();
        assert_eq!(shift, 2);
        assert!((result.unwrapped()[0] - (0.5 + 2.0 * TWO_PI)).abs() < 1e-12);
        assert_eq!(result.cycles()[1], 3);
        assert_eq!(result.unwrapped()[2], 3.0);

        assert!(matches!(
            result.rereference(Pixel::new(1, 1), 0.0),
            Err(UnwrapError::NotReached { x: 1, y: 1 })
        ));
    }

    #[test]
    fn test_to_arrays_shape() {
        let (phase, mask) = sample();
        let grid = PhaseGrid::new(&phase, 2, 2, Some(&mask)).unwrap();
        let residues = ResidueMap::detect(&grid);
        let result = assemble(&grid, &residues, integrated(), SeedAnchor::Wrapped);
        let (u, r) = result.to_arrays().unwrap();
        assert_eq!(u.dim(), (2, 2));
        assert_eq!(u[[0, 1]], result.unwrapped()[1]);
        assert!(!r[[1, 1]]);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = UnwrapStats {
            valid_pixels: 4,
            reached_pixels: 4,
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"reached_pixels\":4"));
    }
}
