//! Ziggurat sampling of smooth decreasing densities.
//!
//! Marsaglia and Tsang's method: pick a layer, pick an offset inside it, and
//! accept straight away when the offset sits under the layer's rectangle. The
//! rare wedge draws test the density itself, and the base layer hands its
//! overflow to an exact tail sampler. One 64-bit draw supplies the layer
//! index, the sign of two-sided distributions, and a 53-bit offset.

mod table;

pub use table::{ZigguratConfig, ZigguratTable};

use crate::{
    BitSource,
    fixed::open01_f64,
    range::{below_word, uniform01},
};
use std::sync::{Arc, LazyLock};
use table::{MAX_INLINE_LAYER_BITS, OFFSET_BITS};

const SIGN_BIT: u32 = MAX_INLINE_LAYER_BITS;

/// A decreasing density on `[0, inf)`; mirrored about zero when symmetric.
///
/// The density need not be normalised.
pub trait ZigguratDensity {
    fn pdf(&self, x: f64) -> f64;

    /// Inverse of [`ZigguratDensity::pdf`] on `(0, pdf(0)]`.
    fn inv_pdf(&self, y: f64) -> f64;

    /// Area under the density on `[r, inf)`.
    fn tail_area(&self, r: f64) -> f64;

    /// Exact draw from the density restricted to `[r, inf)`.
    fn sample_tail<B: BitSource + ?Sized>(&self, src: &mut B, r: f64) -> f64;

    fn symmetric(&self) -> bool;

    /// Bracket for the base radius `r`.
    fn search_interval(&self) -> (f64, f64) {
        (1e-3, 40.0)
    }
}

/// Draw from `table`, testing wedges against `pdf` and delegating the tail.
///
/// Rejected wedge points start over with a fresh draw; there is no cap on
/// the number of attempts.
pub fn sample<B, P, T>(src: &mut B, table: &ZigguratTable, mut pdf: P, mut tail: T) -> f64
where
    B: BitSource + ?Sized,
    P: FnMut(f64) -> f64,
    T: FnMut(&mut B, f64) -> f64,
{
    loop {
        let bits = src.next64();
        let layer = match table.layer_mask {
            Some(mask) => (bits & mask) as usize,
            None => below_word(src, table.layers() as u64) as usize,
        };
        let negative = table.symmetric && (bits >> SIGN_BIT) & 1 == 1;
        let sign = if negative { -1.0 } else { 1.0 };
        let offset = bits >> (64 - OFFSET_BITS);

        let x = offset as f64 * table.w[layer];
        // ~99% of draws end here
        if offset < table.k[layer] {
            return sign * x;
        }
        if layer == 0 {
            return sign * tail(src, table.r);
        }
        let lower = table.f[layer];
        let height = lower + (table.f[layer + 1] - lower) * uniform01(src);
        if height < pdf(x) {
            return sign * x;
        }
    }
}

/// `exp(-x^2 / 2)`, two-sided.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardNormal;

impl ZigguratDensity for StandardNormal {
    #[inline]
    fn pdf(&self, x: f64) -> f64 {
        libm::exp(-0.5 * x * x)
    }

    fn inv_pdf(&self, y: f64) -> f64 {
        libm::sqrt(-2.0 * libm::log(y))
    }

    fn tail_area(&self, r: f64) -> f64 {
        libm::sqrt(std::f64::consts::FRAC_PI_2) * libm::erfc(r * std::f64::consts::FRAC_1_SQRT_2)
    }

    /// Marsaglia's tail: `x = -ln(u1) / r`, `y = -ln(u2)`, until `2y > x^2`.
    fn sample_tail<B: BitSource + ?Sized>(&self, src: &mut B, r: f64) -> f64 {
        loop {
            let x = -libm::log(open01_f64(src.next64())) / r;
            let y = -libm::log(open01_f64(src.next64()));
            if y + y > x * x {
                return r + x;
            }
        }
    }

    fn symmetric(&self) -> bool {
        true
    }

    fn search_interval(&self) -> (f64, f64) {
        (0.1, 20.0)
    }
}

/// `exp(-x)`, one-sided.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardExponential;

impl ZigguratDensity for StandardExponential {
    #[inline]
    fn pdf(&self, x: f64) -> f64 {
        libm::exp(-x)
    }

    fn inv_pdf(&self, y: f64) -> f64 {
        -libm::log(y)
    }

    fn tail_area(&self, r: f64) -> f64 {
        libm::exp(-r)
    }

    /// Memoryless: the tail is the distribution shifted by `r`.
    fn sample_tail<B: BitSource + ?Sized>(&self, src: &mut B, r: f64) -> f64 {
        r - libm::log(open01_f64(src.next64()))
    }

    fn symmetric(&self) -> bool {
        false
    }

    fn search_interval(&self) -> (f64, f64) {
        (0.1, 60.0)
    }
}

static NORMAL_TABLE: LazyLock<Arc<ZigguratTable>> = LazyLock::new(|| {
    Arc::new(
        ZigguratTable::build(&StandardNormal, &ZigguratConfig::default())
            .expect("Unable to build the normal ziggurat table"),
    )
});

static EXPONENTIAL_TABLE: LazyLock<Arc<ZigguratTable>> = LazyLock::new(|| {
    Arc::new(
        ZigguratTable::build(&StandardExponential, &ZigguratConfig::default())
            .expect("Unable to build the exponential ziggurat table"),
    )
});

/// A density bound to a shared table.
#[derive(Debug, Clone)]
pub struct Ziggurat<D> {
    density: D,
    table: Arc<ZigguratTable>,
}

impl<D: ZigguratDensity> Ziggurat<D> {
    pub fn new(density: D, config: &ZigguratConfig) -> crate::SampleResult<Self> {
        let table = Arc::new(ZigguratTable::build(&density, config)?);
        Ok(Self { density, table })
    }

    /// Reuses an existing table; it must have been built from `density`.
    pub fn with_table(density: D, table: Arc<ZigguratTable>) -> Self {
        Self { density, table }
    }

    pub fn table(&self) -> &Arc<ZigguratTable> {
        &self.table
    }

    #[inline]
    pub fn sample<B: BitSource + ?Sized>(&self, src: &mut B) -> f64 {
        sample(
            src,
            &self.table,
            |x| self.density.pdf(x),
            |s, r| self.density.sample_tail(s, r),
        )
    }
}

impl Ziggurat<StandardNormal> {
    /// The shared 256-layer normal ziggurat.
    pub fn normal() -> Self {
        Self::with_table(StandardNormal, Arc::clone(&NORMAL_TABLE))
    }
}

impl Ziggurat<StandardExponential> {
    /// The shared 256-layer exponential ziggurat.
    pub fn exponential() -> Self {
        Self::with_table(StandardExponential, Arc::clone(&EXPONENTIAL_TABLE))
    }
}

/// Standard normal variate from the shared table.
#[inline]
pub fn standard_normal<B: BitSource + ?Sized>(src: &mut B) -> f64 {
    sample(
        src,
        &NORMAL_TABLE,
        |x| StandardNormal.pdf(x),
        |s, r| StandardNormal.sample_tail(s, r),
    )
}

/// Standard exponential variate from the shared table.
#[inline]
pub fn standard_exponential<B: BitSource + ?Sized>(src: &mut B) -> f64 {
    sample(
        src,
        &EXPONENTIAL_TABLE,
        |x| StandardExponential.pdf(x),
        |s, r| StandardExponential.sample_tail(s, r),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::testing::rng;

    struct Moments {
        mean: f64,
        variance: f64,
        skewness: f64,
        kurtosis: f64,
    }

    fn moments(xs: &[f64]) -> Moments {
        let n = xs.len() as f64;
        let mean = xs.iter().sum::<f64>() / n;
        let central = |p: i32| xs.iter().map(|x| (x - mean).powi(p)).sum::<f64>() / n;
        let variance = central(2);
        Moments {
            mean,
            variance,
            skewness: central(3) / variance.powf(1.5),
            kurtosis: central(4) / (variance * variance),
        }
    }

    #[test]
    fn test_normal_moments() {
        let mut rng = rng(42);
        let xs: Vec<f64> = (0..1_000_000).map(|_| standard_normal(&mut rng)).collect();
        let m = moments(&xs);
        assert!(m.mean.abs() < 0.005, "mean {}", m.mean);
        assert!((m.variance - 1.0).abs() < 0.01, "variance {}", m.variance);
        assert!(m.skewness.abs() < 0.015, "skewness {}", m.skewness);
        assert!((m.kurtosis - 3.0).abs() < 0.05, "kurtosis {}", m.kurtosis);
    }

    #[test]
    fn test_exponential_moments() {
        let mut rng = rng(43);
        let xs: Vec<f64> = (0..1_000_000).map(|_| standard_exponential(&mut rng)).collect();
        assert!(xs.iter().all(|&x| x >= 0.0));
        let m = moments(&xs);
        assert!((m.mean - 1.0).abs() < 0.005, "mean {}", m.mean);
        assert!((m.variance - 1.0).abs() < 0.02, "variance {}", m.variance);
        assert!((m.skewness - 2.0).abs() < 0.06, "skewness {}", m.skewness);
        assert!((m.kurtosis - 9.0).abs() < 0.6, "kurtosis {}", m.kurtosis);
    }

    #[test]
    fn test_tail_is_reached() {
        let mut rng = rng(44);
        let z = Ziggurat::normal();
        let r = z.table().r();
        let beyond = (0..2_000_000)
            .filter(|_| z.sample(&mut rng).abs() > r)
            .count();
        // P(|x| > 3.654) is about 2.58e-4
        let expected = 2_000_000.0 * 2.58e-4;
        assert!((beyond as f64 - expected).abs() < 5.0 * expected.sqrt(), "{beyond}");
    }

    #[test]
    fn test_non_power_of_two_layers() {
        let mut rng = rng(45);
        let z = Ziggurat::new(StandardExponential, &ZigguratConfig::with_layers(100)).unwrap();
        let n = 200_000;
        let mean = (0..n).map(|_| z.sample(&mut rng)).sum::<f64>() / n as f64;
        assert!((mean - 1.0).abs() < 0.015, "mean {mean}");
    }

    #[test]
    fn test_small_table_still_exact() {
        // few layers means most draws take the wedge or tail path
        let mut rng = rng(46);
        let z = Ziggurat::new(StandardNormal, &ZigguratConfig::with_layers(4)).unwrap();
        let xs: Vec<f64> = (0..400_000).map(|_| z.sample(&mut rng)).collect();
        let m = moments(&xs);
        assert!(m.mean.abs() < 0.01);
        assert!((m.variance - 1.0).abs() < 0.02);
    }

    #[test]
    fn test_shared_table_reused() {
        let a = Ziggurat::normal();
        let b = Ziggurat::normal();
        assert!(Arc::ptr_eq(a.table(), b.table()));
    }
}
