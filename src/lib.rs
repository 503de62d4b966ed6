//! phase-unwrap2d: reliability-guided 2D phase unwrapping
//!
//! Recovers a continuous phase field from samples wrapped into (-π, π],
//! restricted to a validity mask. Integration follows the most reliable
//! edges first, so noise and phase residues corrupt as little of the field
//! as possible.
//!
//! # Modules
//! - `grid`: Phase grid view, validity mask, connectivity and wrap helpers
//! - `residue`: Residue (phase singularity) detection on 2x2 loops
//! - `quality`: Edge reliability scorers (second difference, residue density, coherence)
//! - `seed`: Seed selection policies
//! - `priority_queue`: Frontier queue for the flood fill
//! - `region_grow`: Reliability-ordered flood-fill integration
//! - `group_merge`: Sorted-edge group-merge integration
//! - `unwrap`: The `Unwrapper` pipeline
//! - `result`: Unwrapped output, reached set and statistics
//! - `config`: Serde configuration
//! - `synthetic`: Test fields and phasor noise
//! - `utils`: Masks, Otsu threshold, accuracy metrics
//!
//! ```
//! use phase_unwrap2d::{synthetic, utils, Unwrapper};
//!
//! let truth = synthetic::quadratic_bowl(64, 64, 6.0, 31.0);
//! let wrapped = synthetic::wrap_field(&truth);
//! let mask = utils::centered_aperture(64, 64, 31.0);
//!
//! let result = Unwrapper::default().unwrap(&wrapped, 64, 64, Some(&mask)).unwrap();
//! assert!(result.unreached().is_empty());
//! assert_eq!(result.residue_count(), 0);
//! ```

// Core modules
pub mod error;
pub mod grid;
pub mod residue;
pub mod quality;
pub mod seed;

// Integration
pub mod priority_queue;
pub mod region_grow;
pub mod group_merge;
pub mod unwrap;
pub mod result;
pub mod config;

// Supporting modules
pub mod synthetic;
pub mod utils;

pub use config::{Integration, RegionPolicy, SeedAnchor, UnwrapConfig};
pub use error::{Result, UnwrapError};
pub use grid::{wrap_to_pi, Connectivity, PhaseGrid, Pixel, ValidityMask, WrapAround};
pub use quality::{EdgeContext, EdgeScorer, ReliabilityKind};
pub use residue::{Residue, ResidueMap};
pub use result::{UnwrapResult, UnwrapStats};
pub use seed::SeedPolicy;
pub use unwrap::{unwrap_phase, Unwrapper};
