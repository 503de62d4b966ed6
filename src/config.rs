//! Unwrapper configuration
//!
//! Every field has a default, so a partial JSON/TOML document deserializes
//! into a complete configuration.

use std::f64::consts::PI;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UnwrapError};
use crate::grid::{Connectivity, WrapAround, DEFAULT_PHASE_TOLERANCE};
use crate::quality::ReliabilityKind;
use crate::seed::SeedPolicy;

/// Integration engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integration {
    /// Reliability-ordered region growing from the seed
    #[default]
    FloodFill,
    /// Global edge sort with group merging (non-continuous path)
    GroupMerge,
}

impl FromStr for Integration {
    type Err = UnwrapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "flood_fill" | "flood" | "region_grow" => Ok(Integration::FloodFill),
            "group_merge" | "merge" | "sorted_edges" => Ok(Integration::GroupMerge),
            other => Err(UnwrapError::InvalidConfig(format!(
                "unknown integration '{other}'"
            ))),
        }
    }
}

/// What happens to valid pixels not connected to the seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionPolicy {
    /// Leave them unreached
    #[default]
    SeedRegion,
    /// Unwrap every connected component, each anchored at its own seed
    AllRegions,
}

impl FromStr for RegionPolicy {
    type Err = UnwrapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "seed_region" | "seed" => Ok(RegionPolicy::SeedRegion),
            "all_regions" | "all" => Ok(RegionPolicy::AllRegions),
            other => Err(UnwrapError::InvalidConfig(format!(
                "unknown region policy '{other}'"
            ))),
        }
    }
}

/// Output value given to each region's seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedAnchor {
    /// Seed keeps its wrapped value, so every output re-wraps to the input
    #[default]
    Wrapped,
    /// Seed is shifted to exactly zero
    Zero,
}

impl FromStr for SeedAnchor {
    type Err = UnwrapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "wrapped" => Ok(SeedAnchor::Wrapped),
            "zero" => Ok(SeedAnchor::Zero),
            other => Err(UnwrapError::InvalidConfig(format!(
                "unknown seed anchor '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnwrapConfig {
    pub connectivity: Connectivity,
    pub seed: SeedPolicy,
    pub reliability: ReliabilityKind,
    pub integration: Integration,
    pub regions: RegionPolicy,
    pub anchor: SeedAnchor,
    pub wrap_around: WrapAround,
    /// Slack beyond ±π accepted on input phase
    pub phase_tolerance: f64,
}

impl Default for UnwrapConfig {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Four,
            seed: SeedPolicy::MostReliable,
            reliability: ReliabilityKind::SecondDifference,
            integration: Integration::FloodFill,
            regions: RegionPolicy::SeedRegion,
            anchor: SeedAnchor::Wrapped,
            wrap_around: WrapAround::default(),
            phase_tolerance: DEFAULT_PHASE_TOLERANCE,
        }
    }
}

impl UnwrapConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.phase_tolerance.is_finite() || self.phase_tolerance < 0.0 {
            return Err(UnwrapError::InvalidConfig(format!(
                "phase_tolerance must be finite and non-negative, got {}",
                self.phase_tolerance
            )));
        }
        if self.phase_tolerance >= PI {
            return Err(UnwrapError::InvalidConfig(format!(
                "phase_tolerance {} would accept unwrapped input",
                self.phase_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Pixel;

    #[test]
    fn test_default_config_is_valid() {
        let config = UnwrapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.connectivity, Connectivity::Four);
        assert_eq!(config.integration, Integration::FloodFill);
    }

    #[test]
    fn test_validate_rejects_bad_tolerance() {
        for tol in [-1e-3, f64::NAN, f64::INFINITY, 4.0] {
            let config = UnwrapConfig {
                phase_tolerance: tol,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(UnwrapError::InvalidConfig(_))),
                "tolerance {} accepted",
                tol
            );
        }
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: UnwrapConfig = serde_json::from_str(
            r#"{"connectivity": "eight", "seed": {"explicit": {"x": 3, "y": 4}},
                "integration": "group_merge", "wrap_around": {"x": true, "y": false}}"#,
        )
        .unwrap();
        assert_eq!(config.connectivity, Connectivity::Eight);
        assert_eq!(config.seed, SeedPolicy::Explicit(Pixel::new(3, 4)));
        assert_eq!(config.integration, Integration::GroupMerge);
        assert!(config.wrap_around.x);
        assert_eq!(config.reliability, ReliabilityKind::SecondDifference);
        assert_eq!(config.phase_tolerance, DEFAULT_PHASE_TOLERANCE);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = UnwrapConfig {
            regions: RegionPolicy::AllRegions,
            anchor: SeedAnchor::Zero,
            seed: SeedPolicy::Centroid,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: UnwrapConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_enum_from_str() {
        assert_eq!("merge".parse::<Integration>().unwrap(), Integration::GroupMerge);
        assert_eq!("flood-fill".parse::<Integration>().unwrap(), Integration::FloodFill);
        assert_eq!("all".parse::<RegionPolicy>().unwrap(), RegionPolicy::AllRegions);
        assert_eq!("Zero".parse::<SeedAnchor>().unwrap(), SeedAnchor::Zero);
        assert!("sideways".parse::<Integration>().is_err());
        assert!("some".parse::<RegionPolicy>().is_err());
    }
}
