//! Non-continuous path integration by group merging
//!
//! All edges are sorted by reliability once and processed from most to least
//! reliable. Each edge joins the groups of its two pixels, shifting the
//! smaller group by whole cycles so that the edge's phase step lands in
//! (-π, π]. Edges inside a group are skipped. Unlike the flood fill the
//! unwrapped area grows in many places at once (Herráez et al., 2002).
//!
//! Groups live in a weighted union-find: every node stores its cycle offset
//! relative to its parent, so a merge is O(α(n)) instead of relabelling the
//! smaller group.

use crate::config::RegionPolicy;
use crate::grid::{cycles_between, PhaseGrid};
use crate::quality::EdgeWeights;
use crate::result::{Integrated, UNREACHED};

/// Union-find over pixels with per-node cycle offsets
#[derive(Debug, Clone)]
pub struct CycleGroups {
    parent: Vec<usize>,
    /// Cycles of the node relative to its parent
    offset: Vec<i32>,
    size: Vec<u32>,
}

impl CycleGroups {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            offset: vec![0; n],
            size: vec![1; n],
        }
    }

    /// Root of `i` and the cycles of `i` relative to that root
    pub fn find(&mut self, i: usize) -> (usize, i32) {
        let mut root = i;
        let mut acc = 0;
        while self.parent[root] != root {
            acc += self.offset[root];
            root = self.parent[root];
        }

        // Point the whole path at the root
        let mut node = i;
        let mut rel = acc;
        while self.parent[node] != node {
            let next = self.parent[node];
            let step = self.offset[node];
            self.parent[node] = root;
            self.offset[node] = rel;
            rel -= step;
            node = next;
        }
        (root, acc)
    }

    /// Join the groups of `a` and `b` so that `cycles[b] = cycles[a] + k`
    ///
    /// Returns `false` when they already share a group.
    pub fn union(&mut self, a: usize, b: usize, k: i32) -> bool {
        let (ra, oa) = self.find(a);
        let (rb, ob) = self.find(b);
        if ra == rb {
            return false;
        }
        if self.size[ra] >= self.size[rb] {
            self.parent[rb] = ra;
            self.offset[rb] = oa + k - ob;
            self.size[ra] += self.size[rb];
        } else {
            self.parent[ra] = rb;
            self.offset[ra] = ob - k - oa;
            self.size[rb] += self.size[ra];
        }
        true
    }

    pub fn same_group(&mut self, a: usize, b: usize) -> bool {
        self.find(a).0 == self.find(b).0
    }
}

/// Every valid edge once, most reliable first; equal scores keep scan order
fn sorted_edges(grid: &PhaseGrid<'_>, weights: &EdgeWeights) -> Vec<(f64, usize, usize)> {
    let connectivity = grid.connectivity();
    let mut edges = Vec::with_capacity(grid.len() * connectivity.directions() / 2);
    for a in 0..grid.len() {
        if !grid.is_valid(a) {
            continue;
        }
        for (dir, &(dx, dy)) in connectivity.forward_offsets().iter().enumerate() {
            if let Some(b) = grid.offset(a, dx, dy).filter(|&b| grid.is_valid(b)) {
                edges.push((weights.get(a, dir), a, b));
            }
        }
    }
    edges.sort_by(|x, y| y.0.total_cmp(&x.0));
    edges
}

/// Group-merge integration; region 0 is the group containing `seed`
///
/// With [`RegionPolicy::AllRegions`] the other groups follow in scan order of
/// their first pixel, each anchored at that pixel.
pub(crate) fn integrate(
    grid: &PhaseGrid<'_>,
    weights: &EdgeWeights,
    seed: usize,
    regions: RegionPolicy,
) -> Integrated {
    let n = grid.len();
    let edges = sorted_edges(grid, weights);
    let mut groups = CycleGroups::new(n);
    let mut merges = 0usize;
    for &(_, a, b) in &edges {
        if groups.union(a, b, cycles_between(grid.phase(a), grid.phase(b))) {
            merges += 1;
        }
    }
    tracing::debug!("group merge: {} edges, {} merges", edges.len(), merges);

    let mut out = Integrated::empty(n);
    // Root -> (region label, root-relative cycles of the region seed)
    let mut anchors: Vec<Option<(u32, i32)>> = vec![None; n];

    let (seed_root, seed_rel) = groups.find(seed);
    anchors[seed_root] = Some((0, seed_rel));
    out.seeds.push(seed);

    for i in 0..n {
        if !grid.is_valid(i) {
            continue;
        }
        let (root, rel) = groups.find(i);
        let (label, anchor_rel) = match anchors[root] {
            Some(anchor) => anchor,
            None if regions == RegionPolicy::AllRegions => {
                let anchor = (out.seeds.len() as u32, rel);
                anchors[root] = Some(anchor);
                out.seeds.push(i);
                anchor
            }
            None => continue,
        };
        out.labels[i] = label;
        out.cycles[i] = rel - anchor_rel;
    }
    debug_assert!(out.labels[seed] != UNREACHED && out.cycles[seed] == 0);
    out
}
