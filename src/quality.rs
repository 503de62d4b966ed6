//! Edge reliability scoring
//!
//! Every edge between two valid neighbouring pixels gets a scalar
//! reliability; the integration engine crosses high-reliability edges first.
//! Scores must be symmetric in the two endpoints. Higher means smoother and
//! therefore safer to integrate across.
//!
//! Built-in scorers:
//! - [`SecondDifference`]: wrapped second differences over the 3x3
//!   neighbourhood of both endpoints (Herráez et al., Applied Optics 41(35),
//!   2002). Default.
//! - [`ResidueDensity`]: penalises edges bordering residue or masked cells.
//! - [`PhaseCoherence`]: `1 - |wrap(Δφ)| / π`, the phase term of ROMEO
//!   (Dymerska et al., MRM 2021).

use std::f64::consts::PI;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UnwrapError};
use crate::grid::{wrap_to_pi, PhaseGrid, Pixel};
use crate::residue::ResidueMap;

/// Second-difference reliability given to pixels without a full valid 3x3
/// neighbourhood, larger than any attainable sum of squared second differences
pub const INCOMPLETE_NEIGHBOURHOOD_PENALTY: f64 = 1.0e4;

/// One undirected edge as seen by a scorer
#[derive(Debug, Clone, Copy)]
pub struct EdgeContext<'g> {
    pub grid: &'g PhaseGrid<'g>,
    pub residues: &'g ResidueMap,
    pub from: usize,
    pub to: usize,
    /// Step `(dx, dy)` from `from` to `to`
    pub offset: (isize, isize),
}

impl<'g> EdgeContext<'g> {
    pub fn from_pixel(&self) -> Pixel {
        self.grid.pixel(self.from)
    }

    pub fn to_pixel(&self) -> Pixel {
        self.grid.pixel(self.to)
    }

    /// Phase step across the edge resolved into (-π, π]
    pub fn wrapped_difference(&self) -> f64 {
        wrap_to_pi(self.grid.phase(self.to) - self.grid.phase(self.from))
    }

    /// Charges of the residue cells bordering the edge
    ///
    /// Axis edges touch up to two cells, diagonal edges cut through one.
    /// `None` entries are undefined cells (a masked corner).
    pub fn adjacent_cells(&self) -> impl Iterator<Item = Option<i8>> + 'g {
        let (dx, dy) = self.offset;
        let (origin, (dx, dy)) = if dy > 0 || (dy == 0 && dx > 0) {
            (self.from, (dx, dy))
        } else {
            (self.to, (-dx, -dy))
        };
        let p = self.grid.pixel(origin);
        let (x, y) = (p.x as isize, p.y as isize);
        let cells = match (dx, dy) {
            (1, 0) => [Some((x, y - 1)), Some((x, y))],
            (0, 1) => [Some((x - 1, y)), Some((x, y))],
            (1, 1) => [Some((x, y)), None],
            (-1, 1) => [Some((x - 1, y)), None],
            _ => [None, None],
        };
        let residues = self.residues;
        cells
            .into_iter()
            .flatten()
            .filter_map(move |(cx, cy)| residues.cell_near(cx, cy))
    }
}

/// Reliability of every edge, stored per pixel and direction
///
/// `get(a, d)` and `get(b, opposite(d))` hold the same score. Entries for
/// missing or masked neighbours are `-∞`.
#[derive(Debug, Clone)]
pub struct EdgeWeights {
    directions: usize,
    weights: Vec<f64>,
}

impl EdgeWeights {
    /// Score each undirected edge of the grid once with `f(from, offset, to)`
    pub fn from_fn<F>(grid: &PhaseGrid<'_>, mut f: F) -> Self
    where
        F: FnMut(usize, (isize, isize), usize) -> f64,
    {
        let connectivity = grid.connectivity();
        let directions = connectivity.directions();
        let mut weights = vec![f64::NEG_INFINITY; grid.len() * directions];

        for a in 0..grid.len() {
            if !grid.is_valid(a) {
                continue;
            }
            for (dir, &(dx, dy)) in connectivity.forward_offsets().iter().enumerate() {
                let Some(b) = grid.offset(a, dx, dy) else {
                    continue;
                };
                if !grid.is_valid(b) {
                    continue;
                }
                let score = f(a, (dx, dy), b);
                let score = if score.is_nan() { f64::NEG_INFINITY } else { score };
                weights[a * directions + dir] = score;
                weights[b * directions + connectivity.opposite(dir)] = score;
            }
        }

        Self {
            directions,
            weights,
        }
    }

    #[inline]
    pub fn get(&self, idx: usize, dir: usize) -> f64 {
        self.weights[idx * self.directions + dir]
    }

    pub fn directions(&self) -> usize {
        self.directions
    }

    /// Mean score over a pixel's existing edges, `-∞` if it has none
    pub fn pixel_mean(&self, idx: usize) -> f64 {
        let row = &self.weights[idx * self.directions..(idx + 1) * self.directions];
        let (sum, n) = row
            .iter()
            .filter(|w| **w != f64::NEG_INFINITY)
            .fold((0.0, 0usize), |(s, n), &w| (s + w, n + 1));
        if n == 0 {
            f64::NEG_INFINITY
        } else {
            sum / n as f64
        }
    }
}

/// Edge reliability model
///
/// Implement [`score`](EdgeScorer::score) for a per-edge rule. Override
/// [`score_edges`](EdgeScorer::score_edges) when per-pixel work can be shared
/// between edges. Closures `Fn(&EdgeContext) -> f64` are scorers too.
pub trait EdgeScorer: Send + Sync {
    fn score(&self, edge: &EdgeContext<'_>) -> f64;

    fn score_edges(&self, grid: &PhaseGrid<'_>, residues: &ResidueMap) -> EdgeWeights {
        EdgeWeights::from_fn(grid, |from, offset, to| {
            self.score(&EdgeContext {
                grid,
                residues,
                from,
                to,
                offset,
            })
        })
    }
}

impl<F> EdgeScorer for F
where
    F: Fn(&EdgeContext<'_>) -> f64 + Send + Sync,
{
    fn score(&self, edge: &EdgeContext<'_>) -> f64 {
        self(edge)
    }
}

/// Negative sum of the endpoints' squared wrapped second differences
#[derive(Debug, Clone, Copy, Default)]
pub struct SecondDifference;

impl SecondDifference {
    /// `H² + V² + D1² + D2²` over the 3x3 neighbourhood of `idx`
    pub fn pixel_reliability(grid: &PhaseGrid<'_>, idx: usize) -> f64 {
        let at = |dx: isize, dy: isize| {
            grid.offset(idx, dx, dy)
                .filter(|&n| grid.is_valid(n))
                .map(|n| grid.phase(n))
        };
        let (Some(l), Some(r), Some(u), Some(d), Some(ul), Some(dr), Some(ur), Some(dl)) = (
            at(-1, 0),
            at(1, 0),
            at(0, -1),
            at(0, 1),
            at(-1, -1),
            at(1, 1),
            at(1, -1),
            at(-1, 1),
        ) else {
            return INCOMPLETE_NEIGHBOURHOOD_PENALTY;
        };

        let c = grid.phase(idx);
        let h = wrap_to_pi(l - c) - wrap_to_pi(c - r);
        let v = wrap_to_pi(u - c) - wrap_to_pi(c - d);
        let d1 = wrap_to_pi(ul - c) - wrap_to_pi(c - dr);
        let d2 = wrap_to_pi(ur - c) - wrap_to_pi(c - dl);
        h * h + v * v + d1 * d1 + d2 * d2
    }
}

impl EdgeScorer for SecondDifference {
    fn score(&self, edge: &EdgeContext<'_>) -> f64 {
        -(Self::pixel_reliability(edge.grid, edge.from) + Self::pixel_reliability(edge.grid, edge.to))
    }

    fn score_edges(&self, grid: &PhaseGrid<'_>, _residues: &ResidueMap) -> EdgeWeights {
        let per_pixel: Vec<f64> = (0..grid.len())
            .map(|i| {
                if grid.is_valid(i) {
                    Self::pixel_reliability(grid, i)
                } else {
                    INCOMPLETE_NEIGHBOURHOOD_PENALTY
                }
            })
            .collect();
        EdgeWeights::from_fn(grid, |a, _, b| -(per_pixel[a] + per_pixel[b]))
    }
}

/// Negative count of residue (or undefined) cells touching the edge
#[derive(Debug, Clone, Copy, Default)]
pub struct ResidueDensity;

impl EdgeScorer for ResidueDensity {
    fn score(&self, edge: &EdgeContext<'_>) -> f64 {
        -edge
            .adjacent_cells()
            .map(|cell| match cell {
                Some(charge) => f64::from(charge.unsigned_abs()),
                None => 1.0,
            })
            .sum::<f64>()
    }
}

/// `1 - |wrap(Δφ)| / π`, in [0, 1]
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseCoherence;

impl EdgeScorer for PhaseCoherence {
    fn score(&self, edge: &EdgeContext<'_>) -> f64 {
        1.0 - edge.wrapped_difference().abs() / PI
    }
}

/// Named reliability strategies selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityKind {
    #[default]
    SecondDifference,
    ResidueDensity,
    PhaseCoherence,
}

impl ReliabilityKind {
    pub fn scorer(self) -> Box<dyn EdgeScorer> {
        match self {
            ReliabilityKind::SecondDifference => Box::new(SecondDifference),
            ReliabilityKind::ResidueDensity => Box::new(ResidueDensity),
            ReliabilityKind::PhaseCoherence => Box::new(PhaseCoherence),
        }
    }
}

impl FromStr for ReliabilityKind {
    type Err = UnwrapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "second_difference" | "seconddifference" => Ok(ReliabilityKind::SecondDifference),
            "residue_density" | "residues" => Ok(ReliabilityKind::ResidueDensity),
            "phase_coherence" | "coherence" => Ok(ReliabilityKind::PhaseCoherence),
            other => Err(UnwrapError::InvalidConfig(format!(
                "unknown reliability '{other}'"
            ))),
        }
    }
}
