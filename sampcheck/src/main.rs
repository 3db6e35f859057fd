mod error;
mod stats;

use clap::{Parser, Subcommand};
use error::{CheckError, CheckResult};
use rand::{SeedableRng, rngs::StdRng};
use sampling_rs::{
    Generator,
    distributions::{Exponential, IntRange, Normal, Piecewise, Rotation, Sampler, UnitVector},
    piecewise::PiecewiseCurve,
    weighted::WeightedIndex,
};
use stats::{Histogram, Moments, chi_squared};
use std::f64::consts::{FRAC_1_PI, PI};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

/// Draws from one sampler and prints a histogram against the exact law.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Seed for the bit source
    #[arg(short, long, global = true, default_value_t = 0x63636363)]
    seed: u64,

    /// Number of draws
    #[arg(short, long, global = true, default_value_t = 1_000_000)]
    draws: usize,

    /// Histogram bins
    #[arg(short, long, global = true, default_value_t = 100)]
    bins: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Uniform integers on [lo, hi), or [lo, hi] with --inclusive
    Range {
        #[arg(long, allow_hyphen_values = true)]
        lo: i64,
        #[arg(long, allow_hyphen_values = true)]
        hi: i64,
        #[arg(long, default_value_t = false)]
        inclusive: bool,
    },
    /// Gaussian variates
    Normal {
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        mean: f64,
        #[arg(long, default_value_t = 1.0)]
        std_dev: f64,
    },
    /// Exponential variates
    Exponential {
        #[arg(long, default_value_t = 1.0)]
        rate: f64,
    },
    /// Piecewise density: linear by default, Hermite with --tangents,
    /// stepped with --step (one value per segment)
    Piecewise {
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        xs: Vec<f64>,
        #[arg(long, value_delimiter = ',')]
        ys: Vec<f64>,
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        tangents: Option<Vec<f64>>,
        #[arg(long, default_value_t = false)]
        step: bool,
    },
    /// First component of uniform unit vectors
    Sphere {
        #[arg(long, default_value_t = 3)]
        dim: usize,
    },
    /// Scalar part of uniform rotation quaternions
    Rotation,
    /// Weighted index choice
    Weighted {
        #[arg(long, value_delimiter = ',')]
        weights: Vec<f64>,
    },
}

fn init_tracing() -> CheckResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| CheckError::Tracing(err.to_string()))
}

/// CDF of one coordinate of a uniform point on the sphere in `dim` dimensions.
fn coordinate_cdf(dim: usize, z: f64) -> f64 {
    let z = z.clamp(-1.0, 1.0);
    match dim {
        2 => 0.5 + z.asin() * FRAC_1_PI,
        3 => 0.5 * (z + 1.0),
        _ => 0.5 + (z * (1.0 - z * z).sqrt() + z.asin()) / PI,
    }
}

/// Runs `sampler` through a histogram on `[lo, hi)` and reports the fit.
fn histogram_of<S, F>(
    rng: &mut StdRng,
    args: &Args,
    sampler: S,
    (lo, hi): (f64, f64),
    cdf: F,
) -> CheckResult<()>
where
    S: Sampler<Output = f64>,
    F: Fn(f64) -> f64,
{
    let mut hist = Histogram::new(lo, hi, args.bins)?;
    let mut moments = Moments::default();
    for x in Generator::new(rng, sampler).take(args.draws) {
        hist.add(x);
        moments.add(x);
    }
    hist.report(&hist.expected_from_cdf(args.draws, cdf));
    info!(mean = moments.mean(), variance = moments.variance(), "sample moments");
    Ok(())
}

fn run(args: &Args) -> CheckResult<()> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    info!(seed = args.seed, draws = args.draws, bins = args.bins, "starting");

    match &args.command {
        &Command::Range { lo, hi, inclusive } => {
            let range = if inclusive {
                IntRange::new_inclusive(lo, hi)?
            } else {
                IntRange::new(lo, hi)?
            };
            let span = (hi as f64 - lo as f64) + if inclusive { 1.0 } else { 0.0 };
            let bins = args.bins.min(span as usize).max(1);
            let mut hist = Histogram::new(lo as f64, lo as f64 + span, bins)?;
            for x in Generator::new(&mut rng, range).take(args.draws) {
                hist.add(x as f64);
            }
            // integers below x
            let cdf = |x: f64| ((x.ceil() - lo as f64) / span).clamp(0.0, 1.0);
            hist.report(&hist.expected_from_cdf(args.draws, cdf));
        }
        &Command::Normal { mean, std_dev } => {
            let normal = Normal::new(mean, std_dev)?;
            let norm = 1.0 / (std_dev * (2.0 * PI).sqrt());
            let density = |x: f64| norm * (-0.5 * ((x - mean) / std_dev).powi(2)).exp();
            let (lo, hi) = (mean - 5.0 * std_dev, mean + 5.0 * std_dev);
            let mut hist = Histogram::new(lo, hi, args.bins)?;
            let mut moments = Moments::default();
            for x in Generator::new(&mut rng, normal).take(args.draws) {
                hist.add(x);
                moments.add(x);
            }
            let expected: Vec<f64> = (0..args.bins)
                .map(|i| {
                    let (x0, x1) = hist.edges(i);
                    let simpson = (density(x0) + 4.0 * density(0.5 * (x0 + x1)) + density(x1)) / 6.0;
                    args.draws as f64 * simpson * (x1 - x0)
                })
                .collect();
            hist.report(&expected);
            info!(mean = moments.mean(), variance = moments.variance(), "sample moments");
        }
        &Command::Exponential { rate } => {
            let exponential = Exponential::new(rate)?;
            histogram_of(&mut rng, args, exponential, (0.0, 10.0 / rate), |x| {
                1.0 - (-rate * x.max(0.0)).exp()
            })?;
        }
        Command::Piecewise {
            xs,
            ys,
            tangents,
            step,
        } => {
            let curve = match (tangents, step) {
                (Some(_), true) => {
                    return Err(CheckError::Args("--step and --tangents conflict".into()));
                }
                (Some(m), false) => PiecewiseCurve::hermite(xs, ys, m)?,
                (None, true) => PiecewiseCurve::uniform(xs, ys)?,
                (None, false) => PiecewiseCurve::linear(xs, ys)?,
            };
            let support = curve.support();
            let area = curve.area();
            let sampler = Piecewise::new(curve)?;
            let mut hist = Histogram::new(support.0, support.1, args.bins)?;
            for x in Generator::new(&mut rng, &sampler).take(args.draws) {
                hist.add(x);
            }
            let pdf = |x: f64| sampler.curve().pdf(x) / area;
            let expected: Vec<f64> = (0..args.bins)
                .map(|i| {
                    let (x0, x1) = hist.edges(i);
                    // keep the right end inside the bin
                    let right = x1 - 1e-12 * (x1 - x0);
                    let simpson = (pdf(x0) + 4.0 * pdf(0.5 * (x0 + x1)) + pdf(right)) / 6.0;
                    args.draws as f64 * simpson * (x1 - x0)
                })
                .collect();
            hist.report(&expected);
        }
        &Command::Sphere { dim } => {
            let mut hist = Histogram::new(-1.0, 1.0, args.bins)?;
            let mut worst = 0.0f64;
            let mut record = |v: &[f64]| {
                let norm = v.iter().map(|c| c * c).sum::<f64>().sqrt();
                worst = worst.max((norm - 1.0).abs());
                hist.add(v[0]);
            };
            match dim {
                2 => Generator::new(&mut rng, UnitVector::<2>::new()?)
                    .take(args.draws)
                    .for_each(|v| record(&v)),
                3 => Generator::new(&mut rng, UnitVector::<3>::new()?)
                    .take(args.draws)
                    .for_each(|v| record(&v)),
                4 => Generator::new(&mut rng, UnitVector::<4>::new()?)
                    .take(args.draws)
                    .for_each(|v| record(&v)),
                _ => return Err(sampling_rs::SampleError::UnsupportedDimension(dim).into()),
            }
            hist.report(&hist.expected_from_cdf(args.draws, |z| coordinate_cdf(dim, z)));
            info!(worst_norm_error = worst, "unit vectors");
        }
        Command::Rotation => {
            let mut hist = Histogram::new(-1.0, 1.0, args.bins)?;
            let mut worst = 0.0f64;
            for q in Generator::new(&mut rng, Rotation).take(args.draws) {
                worst = worst.max((q.norm() - 1.0).abs());
                hist.add(q.w);
            }
            // a Haar rotation is a uniform point on the 3-sphere
            hist.report(&hist.expected_from_cdf(args.draws, |w| coordinate_cdf(4, w)));
            info!(worst_norm_error = worst, "rotations");
        }
        Command::Weighted { weights } => {
            let index = WeightedIndex::new(weights)?;
            let mut counts = vec![0u64; weights.len()];
            for i in Generator::new(&mut rng, &index).take(args.draws) {
                counts[i] += 1;
            }
            let expected: Vec<f64> = weights
                .iter()
                .map(|w| args.draws as f64 * w / index.total())
                .collect();
            for (i, (&c, &e)) in counts.iter().zip(&expected).enumerate() {
                println!("{} {} {}", i, c, gpoint::GPoint(e));
            }
            let (chi2, dof) = chi_squared(&counts, &expected);
            info!(chi2, dof, "weighted fit");
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(err) = init_tracing().and_then(|_| run(&args)) {
        eprintln!("sampcheck: {err}");
        std::process::exit(1);
    }
}
