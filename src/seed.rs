//! Seed selection
//!
//! The seed is the pixel the integration starts from; it keeps zero added
//! cycles. Any valid pixel gives a correct unwrap up to the global 2π
//! ambiguity, but on noisy data starting in a smooth area keeps early errors
//! from spreading.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UnwrapError};
use crate::grid::{PhaseGrid, Pixel};
use crate::quality::EdgeWeights;

/// How the integration seed is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolicy {
    /// Pixel with the highest mean reliability over its edges; ties go to
    /// the first in scan order
    #[default]
    MostReliable,
    /// First valid pixel in scan order
    FirstValid,
    /// Centroid of the valid pixels, or the nearest valid pixel to it
    Centroid,
    /// Caller-chosen pixel, which must be in bounds and valid
    Explicit(Pixel),
}

impl FromStr for SeedPolicy {
    type Err = UnwrapError;

    /// Accepts a policy name or an explicit `x,y` coordinate
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "most_reliable" | "reliable" => Ok(SeedPolicy::MostReliable),
            "first_valid" | "first" => Ok(SeedPolicy::FirstValid),
            "centroid" | "center" | "centre" => Ok(SeedPolicy::Centroid),
            other => {
                let coords: Vec<&str> = other.split(',').map(str::trim).collect();
                match coords.as_slice() {
                    [x, y] => match (x.parse(), y.parse()) {
                        (Ok(x), Ok(y)) => Ok(SeedPolicy::Explicit(Pixel::new(x, y))),
                        _ => Err(UnwrapError::InvalidConfig(format!("bad seed coordinate '{s}'"))),
                    },
                    _ => Err(UnwrapError::InvalidConfig(format!("unknown seed policy '{s}'"))),
                }
            }
        }
    }
}

/// Pick the seed pixel, `None` when the grid has no valid pixel
pub fn select_seed(
    grid: &PhaseGrid<'_>,
    weights: &EdgeWeights,
    policy: SeedPolicy,
) -> Result<Option<usize>> {
    let seed = match policy {
        SeedPolicy::FirstValid => (0..grid.len()).find(|&i| grid.is_valid(i)),
        SeedPolicy::MostReliable => most_reliable(grid, weights),
        SeedPolicy::Centroid => centroid(grid),
        SeedPolicy::Explicit(p) => {
            let idx = grid.index(p)?;
            if !grid.is_valid(idx) {
                return Err(UnwrapError::InvalidSeed { x: p.x, y: p.y });
            }
            Some(idx)
        }
    };

    if let Some(idx) = seed {
        let p = grid.pixel(idx);
        tracing::debug!("seed ({}, {}) chosen by {:?}", p.x, p.y, policy);
    }
    Ok(seed)
}

fn most_reliable(grid: &PhaseGrid<'_>, weights: &EdgeWeights) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for i in (0..grid.len()).filter(|&i| grid.is_valid(i)) {
        let score = weights.pixel_mean(i);
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

fn centroid(grid: &PhaseGrid<'_>) -> Option<usize> {
    let mut sum_x = 0usize;
    let mut sum_y = 0usize;
    let mut count = 0usize;
    for i in (0..grid.len()).filter(|&i| grid.is_valid(i)) {
        let p = grid.pixel(i);
        sum_x += p.x;
        sum_y += p.y;
        count += 1;
    }
    if count == 0 {
        return None;
    }

    let (cx, cy) = (sum_x / count, sum_y / count);
    let centre = cx + cy * grid.width();
    if grid.is_valid(centre) {
        return Some(centre);
    }

    // Masked centroid (e.g. an annulus): nearest valid pixel, scan order on ties
    (0..grid.len())
        .filter(|&i| grid.is_valid(i))
        .min_by_key(|&i| {
            let p = grid.pixel(i);
            let dx = p.x.abs_diff(cx);
            let dy = p.y.abs_diff(cy);
            dx * dx + dy * dy
        })
}
