//! Noise sweep over a circular aperture
//!
//! Wraps a quadratic bowl inside a circular aperture, corrupts it with
//! phasor noise of increasing amplitude and reports the variance of
//! `truth - unwrapped` over the aperture, averaged over many trials.
//!
//! By default each noisy frame is zeroed outside the aperture and unwrapped
//! without a mask. `--use-mask` passes the aperture to the unwrapper instead,
//! and `--rotate` adds a random global phase offset to every trial.
//!
//! ```text
//! cargo run --release --example noise_sweep -- --iterations 20
//! cargo run --release --example noise_sweep -- --integration group_merge --json
//! cargo run --release --example noise_sweep -- --use-mask --rotate
//! ```

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use phase_unwrap2d::grid::TWO_PI;
use phase_unwrap2d::utils::{centered_aperture, masked_difference_variance};
use phase_unwrap2d::{
    synthetic, Connectivity, Integration, ReliabilityKind, UnwrapConfig, Unwrapper,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "Unwrapping error as a function of phase noise")]
struct Args {
    /// Grid edge length in pixels
    #[arg(long, default_value_t = 64)]
    size: usize,

    /// Aperture radius in pixels
    #[arg(long, default_value_t = 31.0)]
    radius: f64,

    /// Phase cycles at the aperture edge
    #[arg(long, default_value_t = 6.0)]
    cycles: f64,

    /// Trials per amplitude
    #[arg(long, default_value_t = 100)]
    iterations: usize,

    /// Log-spaced amplitudes between 1e-3 and --max-amplitude
    #[arg(long, default_value_t = 16)]
    steps: usize,

    #[arg(long, default_value_t = 4.0)]
    max_amplitude: f64,

    /// RNG seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// 4 or 8
    #[arg(long, default_value = "4")]
    connectivity: Connectivity,

    #[arg(long, default_value = "second_difference")]
    reliability: ReliabilityKind,

    #[arg(long, default_value = "flood_fill")]
    integration: Integration,

    /// Unwrap with the aperture as validity mask instead of zeroing outside it
    #[arg(long, default_value_t = false)]
    use_mask: bool,

    /// Offset every trial by a random global phase before adding noise
    #[arg(long, default_value_t = false)]
    rotate: bool,

    /// JSON unwrapper configuration; replaces the strategy flags above
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print one JSON object per amplitude instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Serialize)]
struct SweepRow {
    amplitude: f64,
    variance: f64,
    mean_residues: f64,
    coverage: f64,
}

fn log_spaced(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let (a, b) = (start.log10(), end.log10());
            (0..steps)
                .map(|i| 10f64.powf(a + (b - a) * i as f64 / (steps - 1) as f64))
                .collect()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(
            args.log_level
                .parse::<tracing_subscriber::filter::LevelFilter>()
                .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO),
        )
        .with_target(false)
        .init();

    let config = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => UnwrapConfig {
            connectivity: args.connectivity,
            reliability: args.reliability,
            integration: args.integration,
            ..Default::default()
        },
    };
    tracing::info!("config: {}", serde_json::to_string(&config)?);
    let unwrapper = Unwrapper::new(config)?;

    let n = args.size;
    let truth = synthetic::quadratic_bowl(n, n, args.cycles, args.radius);
    let wrapped = synthetic::wrap_field(&truth);
    let mask = centered_aperture(n, n, args.radius);
    let valid = mask.as_slice();

    let clean = unwrapper.unwrap(&wrapped, n, n, Some(&mask))?;
    let clean_var = masked_difference_variance(&truth, &clean.filled_with_minimum(), valid);
    tracing::info!(
        "noiseless: variance {:.3e}, {} residues, {}/{} pixels reached",
        clean_var,
        clean.residue_count(),
        clean.stats().reached_pixels,
        clean.stats().valid_pixels
    );

    let truth_var = masked_difference_variance(&truth, &vec![0.0; n * n], valid);
    tracing::info!("aperture phase variance {:.2}", truth_var);

    let mut amplitudes = log_spaced(1e-3, args.max_amplitude, args.steps);
    amplitudes.push(100.0);

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    if !args.json {
        println!("{:>10} {:>12} {:>10} {:>9}", "amplitude", "variance", "residues", "coverage");
    }

    let start = Instant::now();
    for &amplitude in &amplitudes {
        let mut variance = 0.0;
        let mut residues = 0.0;
        let mut coverage = 0.0;
        for _ in 0..args.iterations {
            let noisy = if args.rotate {
                let rotated = synthetic::rotate(&wrapped, rng.gen_range(0.0..TWO_PI));
                synthetic::add_phasor_noise(&rotated, amplitude, &mut rng)
            } else {
                synthetic::add_phasor_noise(&wrapped, amplitude, &mut rng)
            };
            let result = if args.use_mask {
                unwrapper.unwrap(&noisy, n, n, Some(&mask))?
            } else {
                unwrapper.unwrap(&synthetic::zero_outside(&noisy, valid), n, n, None)?
            };
            variance += masked_difference_variance(&truth, &result.filled_with_minimum(), valid);
            residues += result.residue_count() as f64;
            coverage += result.stats().coverage();
        }

        let trials = args.iterations.max(1) as f64;
        let row = SweepRow {
            amplitude,
            variance: variance / trials,
            mean_residues: residues / trials,
            coverage: coverage / trials,
        };
        if args.json {
            println!("{}", serde_json::to_string(&row)?);
        } else {
            println!(
                "{:>10.4} {:>12.4e} {:>10.1} {:>9.3}",
                row.amplitude, row.variance, row.mean_residues, row.coverage
            );
        }
    }
    tracing::info!(
        "{} unwraps in {:.2?}",
        amplitudes.len() * args.iterations,
        start.elapsed()
    );

    Ok(())
}
