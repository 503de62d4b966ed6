//! Synthetic phase fields for tests, demos and benchmarks
//!
//! All fields use the crate layout (`x + y * width`) and are centred on
//! `((width - 1) / 2, (height - 1) / 2)`.

use num_complex::Complex64;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::grid::{idx2d, wrap_to_pi, TWO_PI};

fn centre(width: usize, height: usize) -> (f64, f64) {
    ((width as f64 - 1.0) / 2.0, (height as f64 - 1.0) / 2.0)
}

/// Quadratic bowl reaching `cycles` full turns at distance `radius`
///
/// `φ = r² / radius² · cycles · 2π`, unwrapped.
pub fn quadratic_bowl(width: usize, height: usize, cycles: f64, radius: f64) -> Vec<f64> {
    let (cx, cy) = centre(width, height);
    let scale = cycles * TWO_PI / (radius * radius);
    let mut phase = vec![0.0; width * height];
    for y in 0..height {
        for x in 0..width {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            phase[idx2d(x, y, width)] = (dx * dx + dy * dy) * scale;
        }
    }
    phase
}

/// Planar ramp `gx·x + gy·y`, unwrapped
pub fn linear_ramp(width: usize, height: usize, gx: f64, gy: f64) -> Vec<f64> {
    (0..width * height)
        .map(|i| gx * (i % width) as f64 + gy * (i / width) as f64)
        .collect()
}

/// Wrapped phase winding `charge` times around `(cx, cy)`
///
/// Place the core between pixels (e.g. at `x.5`) so no sample sits on it.
pub fn vortex(width: usize, height: usize, cx: f64, cy: f64, charge: i32) -> Vec<f64> {
    let mut phase = vec![0.0; width * height];
    for y in 0..height {
        for x in 0..width {
            let angle = (y as f64 - cy).atan2(x as f64 - cx);
            phase[idx2d(x, y, width)] = wrap_to_pi(f64::from(charge) * angle);
        }
    }
    phase
}

/// Wrap every sample into (-π, π]
pub fn wrap_field(phase: &[f64]) -> Vec<f64> {
    phase.iter().map(|&p| wrap_to_pi(p)).collect()
}

/// Add a constant offset and re-wrap
pub fn rotate(wrapped: &[f64], angle: f64) -> Vec<f64> {
    wrapped.iter().map(|&p| wrap_to_pi(p + angle)).collect()
}

/// Corrupt wrapped phase with additive complex noise
///
/// Each sample becomes `arg(e^{iφ} + a·n·e^{iθ})` with `n ~ N(0, 1)` drawn
/// per sample and a single `θ ~ U(0, 2π)` drawn per call, so all the noise
/// of one frame lies along one random axis. Amplitudes above ~1 approach
/// uniform phase.
pub fn add_phasor_noise<R: Rng + ?Sized>(wrapped: &[f64], amplitude: f64, rng: &mut R) -> Vec<f64> {
    let axis = Complex64::from_polar(1.0, rng.gen_range(0.0..TWO_PI));
    wrapped
        .iter()
        .map(|&phi| {
            let n: f64 = rng.sample(StandardNormal);
            (Complex64::from_polar(1.0, phi) + axis * (amplitude * n)).arg()
        })
        .collect()
}

/// Zero every sample outside `valid`
pub fn zero_outside(phase: &[f64], valid: &[bool]) -> Vec<f64> {
    phase
        .iter()
        .zip(valid)
        .map(|(&p, &v)| if v { p } else { 0.0 })
        .collect()
}
