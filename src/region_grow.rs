//! Reliability-ordered region growing
//!
//! Starting from a seed, repeatedly cross the most reliable edge between the
//! visited set and an unvisited valid pixel, carrying the integer cycle count
//! across it. This is Prim's algorithm on the maximum-reliability spanning
//! tree: unreliable edges (near residues, steep gradients) are crossed last,
//! so errors they cause stay local.

use crate::config::RegionPolicy;
use crate::grid::{cycles_between, PhaseGrid};
use crate::priority_queue::FrontierQueue;
use crate::quality::EdgeWeights;
use crate::result::{Integrated, UNREACHED};

/// Flood-fill state shared across the regions of one grid
pub struct RegionGrower<'g> {
    grid: &'g PhaseGrid<'g>,
    weights: &'g EdgeWeights,
    visited: Vec<bool>,
    cycles: Vec<i32>,
    labels: Vec<u32>,
    seeds: Vec<usize>,
    queue: FrontierQueue,
}

impl<'g> RegionGrower<'g> {
    pub fn new(grid: &'g PhaseGrid<'g>, weights: &'g EdgeWeights) -> Self {
        let n = grid.len();
        Self {
            grid,
            weights,
            visited: vec![false; n],
            cycles: vec![0; n],
            labels: vec![UNREACHED; n],
            seeds: Vec::new(),
            queue: FrontierQueue::with_capacity(n.min(1 << 16)),
        }
    }

    pub fn is_visited(&self, idx: usize) -> bool {
        self.visited[idx]
    }

    /// Cycles relative to the seed of each pixel's region, 0 where unvisited
    pub fn cycles(&self) -> &[i32] {
        &self.cycles
    }

    /// Number of regions grown so far
    pub fn regions(&self) -> usize {
        self.seeds.len()
    }

    /// Grow a new region from `seed`, returning the number of pixels it reached
    ///
    /// `seed` must be valid and not yet visited.
    pub fn grow(&mut self, seed: usize) -> usize {
        debug_assert!(self.grid.is_valid(seed) && !self.is_visited(seed));
        let label = self.seeds.len() as u32;
        self.seeds.push(seed);

        self.visit(seed, 0, label);
        let mut reached = 1;
        self.push_frontier(seed);

        while let Some(edge) = self.queue.pop() {
            if self.visited[edge.to] {
                continue;
            }
            let k = cycles_between(self.grid.phase(edge.from), self.grid.phase(edge.to));
            self.visit(edge.to, self.cycles[edge.from] + k, label);
            reached += 1;
            self.push_frontier(edge.to);
        }

        tracing::trace!("region {} grew to {} pixels", label, reached);
        reached
    }

    fn visit(&mut self, idx: usize, cycles: i32, label: u32) {
        self.visited[idx] = true;
        self.cycles[idx] = cycles;
        self.labels[idx] = label;
    }

    fn push_frontier(&mut self, from: usize) {
        let grid = self.grid;
        for (dir, n) in grid.neighbors(from) {
            if !self.visited[n] {
                self.queue.push(from, n, self.weights.get(from, dir));
            }
        }
    }

    pub(crate) fn finish(self) -> Integrated {
        Integrated {
            cycles: self.cycles,
            labels: self.labels,
            seeds: self.seeds,
        }
    }
}

/// Flood-fill integration from `seed`
///
/// With [`RegionPolicy::AllRegions`] every remaining component is grown in
/// turn from its first unvisited valid pixel in scan order.
pub(crate) fn integrate(
    grid: &PhaseGrid<'_>,
    weights: &EdgeWeights,
    seed: usize,
    regions: RegionPolicy,
) -> Integrated {
    let mut grower = RegionGrower::new(grid, weights);
    let reached = grower.grow(seed);
    tracing::debug!("flood fill reached {} pixels from the seed", reached);

    if regions == RegionPolicy::AllRegions {
        for idx in 0..grid.len() {
            if grid.is_valid(idx) && !grower.is_visited(idx) {
                grower.grow(idx);
            }
        }
    }
    grower.finish()
}
