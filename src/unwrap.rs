//! Unwrapping pipeline
//!
//! grid → residues → edge weights → seed → integration → result

use std::fmt;

use ndarray::ArrayView2;

use crate::config::{Integration, UnwrapConfig};
use crate::error::Result;
use crate::grid::{PhaseGrid, ValidityMask};
use crate::quality::EdgeScorer;
use crate::residue::ResidueMap;
use crate::result::{assemble, Integrated, UnwrapResult};
use crate::seed::select_seed;
use crate::{group_merge, region_grow};

/// Configured phase unwrapper
///
/// Holds no per-run state, so one instance can serve many grids, including
/// from several threads at once.
pub struct Unwrapper {
    config: UnwrapConfig,
    scorer: Box<dyn EdgeScorer>,
}

impl fmt::Debug for Unwrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unwrapper")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Unwrapper {
    fn default() -> Self {
        let config = UnwrapConfig::default();
        let scorer = config.reliability.scorer();
        Self { config, scorer }
    }
}

impl Unwrapper {
    pub fn new(config: UnwrapConfig) -> Result<Self> {
        config.validate()?;
        let scorer = config.reliability.scorer();
        Ok(Self { config, scorer })
    }

    /// Replace the configured reliability with a custom scorer
    pub fn with_scorer<S: EdgeScorer + 'static>(mut self, scorer: S) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    pub fn config(&self) -> &UnwrapConfig {
        &self.config
    }

    /// Unwrap a flat row-major buffer (`x + y * width`)
    pub fn unwrap(
        &self,
        phase: &[f64],
        width: usize,
        height: usize,
        mask: Option<&ValidityMask>,
    ) -> Result<UnwrapResult> {
        let grid =
            PhaseGrid::with_tolerance(phase, width, height, mask, self.config.phase_tolerance)?
                .with_topology(self.config.connectivity, self.config.wrap_around);
        self.unwrap_grid(&grid)
    }

    /// Unwrap an `(height, width)` array with an optional boolean mask
    pub fn unwrap_array(
        &self,
        phase: ArrayView2<'_, f64>,
        mask: Option<ArrayView2<'_, bool>>,
    ) -> Result<UnwrapResult> {
        let (height, width) = phase.dim();
        let data: Vec<f64> = phase.iter().copied().collect();
        let mask = mask.map(ValidityMask::from_array);
        self.unwrap(&data, width, height, mask.as_ref())
    }

    /// Unwrap a prepared grid view
    ///
    /// The grid's own connectivity and wrap-around are used; the configured
    /// ones only apply when this unwrapper builds the grid itself.
    pub fn unwrap_grid(&self, grid: &PhaseGrid<'_>) -> Result<UnwrapResult> {
        tracing::debug!(
            "unwrapping {}x{} grid ({} valid), {:?} connectivity, {:?}",
            grid.width(),
            grid.height(),
            grid.valid_count(),
            grid.connectivity(),
            self.config.integration
        );

        let residues = ResidueMap::detect(grid);
        let weights = self.scorer.score_edges(grid, &residues);

        let integrated = match select_seed(grid, &weights, self.config.seed)? {
            None => {
                tracing::warn!("no valid pixels, nothing to unwrap");
                Integrated::empty(grid.len())
            }
            Some(seed) => match self.config.integration {
                Integration::FloodFill => {
                    region_grow::integrate(grid, &weights, seed, self.config.regions)
                }
                Integration::GroupMerge => {
                    group_merge::integrate(grid, &weights, seed, self.config.regions)
                }
            },
        };

        Ok(assemble(grid, &residues, integrated, self.config.anchor))
    }
}

/// Unwrap with the default configuration
pub fn unwrap_phase(
    phase: &[f64],
    width: usize,
    height: usize,
    mask: Option<&ValidityMask>,
) -> Result<UnwrapResult> {
    Unwrapper::default().unwrap(phase, width, height, mask)
}
