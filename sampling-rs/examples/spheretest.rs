use gpoint::GPoint;
use rand::{SeedableRng, rngs::StdRng};
use sampling_rs::unit_vector3;

const NV: usize = 10000000;
const NB: usize = 50;

/// Histogram of the z component of unit vectors; uniform on [-1, 1] by
/// Archimedes' hat-box theorem. The last column is the worst norm error seen.
fn main() {
    let mut rng = StdRng::seed_from_u64(0x63636363);
    let mut bin = vec![0usize; NB];
    let mut worst = 0.0f64;

    for _ in 0..NV {
        let [x, y, z]: [f64; 3] = unit_vector3(&mut rng);
        worst = worst.max(((x * x + y * y + z * z).sqrt() - 1.0).abs());
        let j = (((z + 1.0) * 0.5 * NB as f64).floor() as usize).min(NB - 1);
        bin[j] += 1;
    }

    let binwidth = 2.0 / NB as f64;
    let expected = NV as f64 / NB as f64;
    (0..NB).for_each(|i| {
        let z = binwidth * (i as f64 + 0.5) - 1.0;
        println!("{} {} {} {}", GPoint(z), bin[i], GPoint(expected), GPoint(worst));
    });
}
