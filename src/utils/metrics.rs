//! Accuracy metrics for unwrapped phase
//!
//! Used by the tests, the noise-sweep demo and anyone comparing an unwrap
//! against a known truth. Unwrapping is only defined up to a global 2π
//! multiple, so [`masked_difference_variance`] (offset-free) is the primary
//! figure of merit.

use crate::grid::wrap_to_pi;

/// Population variance of `a - b` over pixels where `mask` is set
///
/// `NaN` when a masked pixel differs by `NaN` (e.g. an unreached pixel), 0
/// when the mask is empty.
pub fn masked_difference_variance(a: &[f64], b: &[f64], mask: &[bool]) -> f64 {
    let diffs: Vec<f64> = selected(a, b, mask).map(|(x, y)| x - y).collect();
    if diffs.is_empty() {
        return 0.0;
    }
    let n = diffs.len() as f64;
    let mean = diffs.iter().sum::<f64>() / n;
    diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n
}

/// Root-mean-square of `a - b` over pixels where `mask` is set
pub fn masked_rmse(a: &[f64], b: &[f64], mask: &[bool]) -> f64 {
    let mut sum_sq = 0.0;
    let mut count = 0usize;
    for (x, y) in selected(a, b, mask) {
        sum_sq += (x - y).powi(2);
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    (sum_sq / count as f64).sqrt()
}

/// Largest `|wrap(unwrapped - wrapped)|` over reached pixels
///
/// A correct unwrap only adds whole cycles, so this stays at rounding level.
pub fn rewrap_error(unwrapped: &[f64], wrapped: &[f64], reached: &[bool]) -> f64 {
    selected(unwrapped, wrapped, reached)
        .map(|(u, w)| wrap_to_pi(u - w).abs())
        .fold(0.0, f64::max)
}

/// Number of reached 4-neighbour pairs whose unwrapped values differ by
/// more than π
pub fn discontinuities(unwrapped: &[f64], reached: &[bool], width: usize) -> usize {
    if width == 0 {
        return 0;
    }
    let height = unwrapped.len() / width;
    let mut count = 0;
    for y in 0..height {
        for x in 0..width {
            let i = x + y * width;
            if !reached[i] {
                continue;
            }
            for j in [(x + 1 < width).then_some(i + 1), (y + 1 < height).then_some(i + width)]
                .into_iter()
                .flatten()
            {
                if reached[j] && (unwrapped[j] - unwrapped[i]).abs() > std::f64::consts::PI {
                    count += 1;
                }
            }
        }
    }
    count
}

fn selected<'a>(
    a: &'a [f64],
    b: &'a [f64],
    mask: &'a [bool],
) -> impl Iterator<Item = (f64, f64)> + 'a {
    a.iter()
        .zip(b)
        .zip(mask)
        .filter(|(_, &m)| m)
        .map(|((&x, &y), _)| (x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_variance_ignores_constant_offset() {
        let truth = vec![0.0, 1.0, 2.0, 3.0];
        let shifted: Vec<f64> = truth.iter().map(|v| v + 2.0 * PI).collect();
        let mask = vec![true; 4];
        assert!(masked_difference_variance(&shifted, &truth, &mask) < 1e-20);
        assert_relative_eq!(masked_rmse(&shifted, &truth, &mask), 2.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_variance_uses_mask() {
        let a = vec![0.0, 1.0, 10.0, f64::NAN];
        let b = vec![0.0, 0.0, 0.0, 0.0];
        assert_relative_eq!(
            masked_difference_variance(&a, &b, &[true, true, false, false]),
            0.25,
            epsilon = 1e-12
        );
        assert!(masked_difference_variance(&a, &b, &[true, true, true, true]).is_nan());
        assert_eq!(masked_difference_variance(&a, &b, &[false; 4]), 0.0);
    }

    #[test]
    fn test_rewrap_error() {
        let wrapped = vec![0.5, -3.0];
        let unwrapped = vec![0.5 + 4.0 * PI, -3.0 + 2.0 * PI];
        assert!(rewrap_error(&unwrapped, &wrapped, &[true, true]) < 1e-12);
        let off = vec![0.6, -3.0];
        assert_relative_eq!(rewrap_error(&off, &wrapped, &[true, true]), 0.1, epsilon = 1e-12);
        assert_eq!(rewrap_error(&off, &wrapped, &[false, false]), 0.0);
    }

    #[test]
    fn test_discontinuities() {
        // 3x2, one jump between (1,0) and (2,0)
        let u = vec![0.0, 0.5, 5.0, 0.1, 0.6, 4.0];
        assert_eq!(discontinuities(&u, &[true; 6], 3), 2);
        let mut reached = [true; 6];
        reached[2] = false;
        assert_eq!(discontinuities(&u, &reached, 3), 1);
    }
}
