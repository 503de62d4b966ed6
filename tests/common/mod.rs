//! Common test utilities for phase-unwrap2d integration tests

#![allow(dead_code)]

use phase_unwrap2d::grid::TWO_PI;
use phase_unwrap2d::synthetic;
use phase_unwrap2d::utils::{self, masked_difference_variance, masked_rmse};
use phase_unwrap2d::{UnwrapResult, ValidityMask};

/// Compute Pearson correlation coefficient within mask
pub fn correlation(a: &[f64], b: &[f64], mask: &[bool]) -> f64 {
    let mut sum_a = 0.0;
    let mut sum_b = 0.0;
    let mut sum_ab = 0.0;
    let mut sum_a2 = 0.0;
    let mut sum_b2 = 0.0;
    let mut n = 0usize;

    for i in 0..a.len() {
        if mask[i] {
            sum_a += a[i];
            sum_b += b[i];
            sum_ab += a[i] * b[i];
            sum_a2 += a[i] * a[i];
            sum_b2 += b[i] * b[i];
            n += 1;
        }
    }

    if n == 0 {
        return 0.0;
    }

    let n = n as f64;
    let numerator = n * sum_ab - sum_a * sum_b;
    let denominator = ((n * sum_a2 - sum_a * sum_a) * (n * sum_b2 - sum_b * sum_b)).sqrt();

    if denominator == 0.0 {
        return 0.0;
    }

    numerator / denominator
}

/// Ground-truth field with its wrapped version and mask
pub struct TestField {
    pub width: usize,
    pub height: usize,
    /// Unwrapped ground truth (radians)
    pub truth: Vec<f64>,
    /// Truth wrapped into (-π, π]
    pub wrapped: Vec<f64>,
    pub mask: ValidityMask,
}

impl TestField {
    /// 64x64 bowl with six cycles inside a radius-31 aperture
    pub fn reference_aperture() -> Self {
        Self::aperture_bowl(64, 31.0, 6.0)
    }

    pub fn aperture_bowl(size: usize, radius: f64, cycles: f64) -> Self {
        let truth = synthetic::quadratic_bowl(size, size, cycles, radius);
        let wrapped = synthetic::wrap_field(&truth);
        let mask = utils::centered_aperture(size, size, radius);
        TestField {
            width: size,
            height: size,
            truth,
            wrapped,
            mask,
        }
    }

    pub fn ramp(width: usize, height: usize, gx: f64, gy: f64) -> Self {
        let truth = synthetic::linear_ramp(width, height, gx, gy);
        let wrapped = synthetic::wrap_field(&truth);
        TestField {
            width,
            height,
            truth,
            wrapped,
            mask: ValidityMask::all_valid(width, height),
        }
    }

    pub fn valid(&self) -> &[bool] {
        self.mask.as_slice()
    }
}

/// Accuracy of one unwrap against a ground truth
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    /// Variance of truth - unwrapped over the mask
    pub variance: f64,
    pub rmse: f64,
    pub correlation: f64,
    pub reached: usize,
}

impl TestResult {
    pub fn new(name: &str, result: &UnwrapResult, truth: &[f64], mask: &[bool]) -> Self {
        let filled = result.filled_with_minimum();
        TestResult {
            name: name.to_string(),
            variance: masked_difference_variance(truth, &filled, mask),
            rmse: masked_rmse(truth, &filled, mask),
            correlation: correlation(&filled, truth, mask),
            reached: result.stats().reached_pixels,
        }
    }

    pub fn print(&self) {
        println!(
            "{:<20} var={:.3e}  RMSE={:.4}  r={:.4}  reached={}",
            self.name, self.variance, self.rmse, self.correlation, self.reached
        );
    }
}

/// Whether every reached pixel differs from the truth by the same whole
/// number of cycles
pub fn matches_up_to_cycles(result: &UnwrapResult, truth: &[f64], tol: f64) -> bool {
    let mut offset: Option<f64> = None;
    for (i, &reached) in result.reached().iter().enumerate() {
        if !reached {
            continue;
        }
        let d = result.unwrapped()[i] - truth[i];
        match offset {
            None => {
                if (d / TWO_PI - (d / TWO_PI).round()).abs() * TWO_PI > tol {
                    return false;
                }
                offset = Some(d);
            }
            Some(o) => {
                if (d - o).abs() > tol {
                    return false;
                }
            }
        }
    }
    true
}
