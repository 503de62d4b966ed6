//! Property tests over random grids and masks

use std::collections::VecDeque;
use std::f64::consts::PI;

use phase_unwrap2d::synthetic;
use phase_unwrap2d::utils::rewrap_error;
use phase_unwrap2d::{
    Integration, RegionPolicy, UnwrapConfig, UnwrapResult, Unwrapper, ValidityMask,
};
use proptest::prelude::*;

/// Random wrapped grid with a random mask
fn grid_strategy() -> impl Strategy<Value = (usize, usize, Vec<f64>, Vec<bool>)> {
    (1usize..12, 1usize..12).prop_flat_map(|(w, h)| {
        (
            Just(w),
            Just(h),
            prop::collection::vec(-PI..PI, w * h),
            prop::collection::vec(prop::bool::weighted(0.8), w * h),
        )
    })
}

fn run(config: UnwrapConfig, phase: &[f64], w: usize, h: usize, mask: &ValidityMask) -> UnwrapResult {
    Unwrapper::new(config).unwrap().unwrap(phase, w, h, Some(mask)).unwrap()
}

/// Valid pixels 4-connected to `seed`
fn component(valid: &[bool], w: usize, h: usize, seed: usize) -> Vec<bool> {
    let mut seen = vec![false; valid.len()];
    let mut queue = VecDeque::from([seed]);
    seen[seed] = true;
    while let Some(i) = queue.pop_front() {
        let (x, y) = (i % w, i / w);
        let mut next = Vec::new();
        if x + 1 < w {
            next.push(i + 1);
        }
        if x > 0 {
            next.push(i - 1);
        }
        if y + 1 < h {
            next.push(i + w);
        }
        if y > 0 {
            next.push(i - w);
        }
        for n in next {
            if valid[n] && !seen[n] {
                seen[n] = true;
                queue.push_back(n);
            }
        }
    }
    seen
}

proptest! {
    #[test]
    fn prop_rewrap_exact_and_mask_respected((w, h, phase, valid) in grid_strategy()) {
        let mask = ValidityMask::from_bools(valid.clone(), w, h).unwrap();
        for integration in [Integration::FloodFill, Integration::GroupMerge] {
            let result = run(UnwrapConfig { integration, ..Default::default() }, &phase, w, h, &mask);
            prop_assert!(rewrap_error(result.unwrapped(), &phase, result.reached()) < 1e-9);
            for i in 0..w * h {
                if !valid[i] {
                    prop_assert!(!result.reached()[i]);
                    prop_assert!(result.unwrapped()[i].is_nan());
                }
            }
        }
    }

    #[test]
    fn prop_reached_set_is_seed_component((w, h, phase, valid) in grid_strategy()) {
        let mask = ValidityMask::from_bools(valid.clone(), w, h).unwrap();
        for integration in [Integration::FloodFill, Integration::GroupMerge] {
            let result = run(UnwrapConfig { integration, ..Default::default() }, &phase, w, h, &mask);
            match result.seed() {
                None => prop_assert!(valid.iter().all(|&v| !v)),
                Some(seed) => {
                    let expected = component(&valid, w, h, seed.x + seed.y * w);
                    prop_assert_eq!(result.reached(), expected.as_slice());
                }
            }
        }
    }

    #[test]
    fn prop_all_regions_reaches_every_valid_pixel((w, h, phase, valid) in grid_strategy()) {
        let mask = ValidityMask::from_bools(valid.clone(), w, h).unwrap();
        let flood = run(
            UnwrapConfig { regions: RegionPolicy::AllRegions, ..Default::default() },
            &phase, w, h, &mask,
        );
        prop_assert_eq!(flood.reached(), valid.as_slice());
        prop_assert!(flood.unreached().is_empty());

        let merge = run(
            UnwrapConfig {
                regions: RegionPolicy::AllRegions,
                integration: Integration::GroupMerge,
                ..Default::default()
            },
            &phase, w, h, &mask,
        );
        prop_assert_eq!(merge.stats().regions, flood.stats().regions);
        prop_assert_eq!(merge.seeds(), flood.seeds());
    }

    #[test]
    fn prop_smooth_ramp_unwrapped_exactly(
        w in 2usize..24,
        h in 2usize..24,
        gx in -2.8f64..2.8,
        gy in -2.8f64..2.8,
    ) {
        let truth = synthetic::linear_ramp(w, h, gx, gy);
        let wrapped = synthetic::wrap_field(&truth);
        let mask = ValidityMask::all_valid(w, h);
        let result = run(UnwrapConfig::default(), &wrapped, w, h, &mask);
        prop_assert_eq!(result.residue_count(), 0);

        let offset = result.unwrapped()[0] - truth[0];
        for i in 0..w * h {
            prop_assert!((result.unwrapped()[i] - truth[i] - offset).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_identical_inputs_identical_outputs((w, h, phase, valid) in grid_strategy()) {
        let mask = ValidityMask::from_bools(valid, w, h).unwrap();
        let a = run(UnwrapConfig::default(), &phase, w, h, &mask);
        let b = run(UnwrapConfig::default(), &phase, w, h, &mask);
        let bits = |r: &UnwrapResult| r.unwrapped().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(&a), bits(&b));
    }
}
