use gpoint::GPoint;
use rand::{SeedableRng, rngs::StdRng};
use sampling_rs::distributions::{Normal, Sampler};
use std::f64::consts::FRAC_1_SQRT_2;

const NV: usize = 10000000;
const NB: usize = 100;
const SIGMA: f64 = 1.0;

fn main() {
    let mut rng = StdRng::seed_from_u64(0x63636363);
    let normal = Normal::new(0.0, SIGMA).expect("Unable to build normal distribution");

    let mut variate = vec![0.0f64; NV];
    let mut bin = vec![0usize; NB];

    for v in &mut variate {
        *v = normal.sample(&mut rng);
    }

    let minv = variate.iter().cloned().fold(f64::INFINITY, f64::min);
    let maxv = variate.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let binwidth = (maxv - minv) / NB as f64;

    for &v in &variate {
        let j = (((v - minv) / binwidth).floor() as usize).min(NB - 1);
        bin[j] += 1;
    }

    // expected count: NV times the normal mass of each bin
    let cdf = |x: f64| 0.5 * (1.0 + libm::erf(x * FRAC_1_SQRT_2 / SIGMA));
    (0..NB).for_each(|i| {
        let x0 = binwidth * i as f64 + minv;
        let x = x0 + 0.5 * binwidth;
        let expected = NV as f64 * (cdf(x0 + binwidth) - cdf(x0));
        println!("{} {} {}", GPoint(x), bin[i], GPoint(expected));
    });
}
