//! Automatic thresholding
//!
//! Otsu's method, used to separate signal from background in a magnitude
//! image before unwrapping.

/// Otsu's method for automatic threshold selection
///
/// Builds a `num_bins` histogram over the finite values of `data` and picks
/// the split maximising inter-class variance. The returned value is the
/// upper edge of the last background bin, so `value >= threshold` selects
/// exactly the foreground classes. Constant data returns that constant.
pub fn otsu_threshold(data: &[f64], num_bins: usize) -> f64 {
    let finite = || data.iter().copied().filter(|v| v.is_finite());
    let Some(min_val) = finite().reduce(f64::min) else {
        return 0.0;
    };
    let max_val = finite().fold(min_val, f64::max);

    if num_bins < 2 || (max_val - min_val).abs() < 1e-10 {
        return min_val;
    }

    let bin_width = (max_val - min_val) / num_bins as f64;
    let mut histogram = vec![0usize; num_bins];
    for v in finite() {
        let bin = (((v - min_val) / bin_width).floor() as usize).min(num_bins - 1);
        histogram[bin] += 1;
    }

    let total: f64 = histogram.iter().sum::<usize>() as f64;
    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut sum_background = 0.0;
    let mut weight_background = 0.0;
    let mut max_variance = 0.0;
    let mut split = 0;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count as f64;
        if weight_background == 0.0 {
            continue;
        }
        let weight_foreground = total - weight_background;
        if weight_foreground == 0.0 {
            break;
        }
        sum_background += t as f64 * count as f64;

        let mean_background = sum_background / weight_background;
        let mean_foreground = (sum_total - sum_background) / weight_foreground;
        let variance =
            weight_background * weight_foreground * (mean_background - mean_foreground).powi(2);
        if variance > max_variance {
            max_variance = variance;
            split = t;
        }
    }

    min_val + (split + 1) as f64 * bin_width
}
