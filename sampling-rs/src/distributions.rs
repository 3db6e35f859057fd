//! Parameterised distributions, validated once and sampled many times.
//!
//! Each type checks its parameters in `new` and then samples infallibly. The
//! free functions at the bottom validate and draw once, for callers that do
//! not keep a distribution around.

use crate::{
    BitSource,
    error::{SampleError, SampleResult, ensure_finite, ensure_positive},
    piecewise::{PiecewiseCurve, PiecewiseSampler},
    range::{SampleInt, Word, below_inclusive_word, uniform01},
    sphere::{Quaternion, rotation, write_unit_vector},
    ziggurat::{standard_exponential, standard_normal},
};

/// Something that turns bits into values of one type.
pub trait Sampler {
    type Output;

    fn sample<B: BitSource + ?Sized>(&self, src: &mut B) -> Self::Output;
}

impl<S: Sampler + ?Sized> Sampler for &S {
    type Output = S::Output;

    #[inline]
    fn sample<B: BitSource + ?Sized>(&self, src: &mut B) -> Self::Output {
        (**self).sample(src)
    }
}

/// Continuous uniform on `[lo, hi)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform {
    lo: f64,
    width: f64,
}

impl Uniform {
    pub fn new(lo: f64, hi: f64) -> SampleResult<Self> {
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(SampleError::EmptyRange {
                lo: lo.to_string(),
                hi: hi.to_string(),
                kind: "[lo, hi)",
            });
        }
        let width = hi - lo;
        if !width.is_finite() {
            return Err(SampleError::invalid("hi", "range width overflows"));
        }
        Ok(Self { lo, width })
    }
}

impl Sampler for Uniform {
    type Output = f64;

    #[inline]
    fn sample<B: BitSource + ?Sized>(&self, src: &mut B) -> f64 {
        let hi = self.lo + self.width;
        loop {
            let x = self.lo + self.width * uniform01(src);
            if x < hi {
                return x;
            }
        }
    }
}

/// Gaussian through the shared normal ziggurat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    mean: f64,
    std_dev: f64,
}

impl Normal {
    pub fn new(mean: f64, std_dev: f64) -> SampleResult<Self> {
        Ok(Self {
            mean: ensure_finite("mean", mean)?,
            std_dev: ensure_positive("std_dev", std_dev)?,
        })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

impl Sampler for Normal {
    type Output = f64;

    #[inline]
    fn sample<B: BitSource + ?Sized>(&self, src: &mut B) -> f64 {
        self.mean + self.std_dev * standard_normal(src)
    }
}

/// Exponential with the given rate (mean `1 / rate`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    rate: f64,
}

impl Exponential {
    pub fn new(rate: f64) -> SampleResult<Self> {
        Ok(Self {
            rate: ensure_positive("rate", rate)?,
        })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Sampler for Exponential {
    type Output = f64;

    #[inline]
    fn sample<B: BitSource + ?Sized>(&self, src: &mut B) -> f64 {
        standard_exponential(src) / self.rate
    }
}

/// Builds a piecewise-linear sampler from points, merging coincident
/// abscissae and keeping the larger height.
fn merged_linear(points: &[(f64, f64)]) -> SampleResult<PiecewiseSampler> {
    let mut xs: Vec<f64> = Vec::with_capacity(points.len());
    let mut ys: Vec<f64> = Vec::with_capacity(points.len());
    for &(x, y) in points {
        match ys.last_mut() {
            Some(height) if xs.last() == Some(&x) => *height = height.max(y),
            _ => {
                xs.push(x);
                ys.push(y);
            }
        }
    }
    PiecewiseSampler::new(PiecewiseCurve::linear(&xs, &ys)?)
}

macro_rules! piecewise_sampler {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(PiecewiseSampler);

        impl Sampler for $name {
            type Output = f64;

            #[inline]
            fn sample<B: BitSource + ?Sized>(&self, src: &mut B) -> f64 {
                self.0.sample(src)
            }
        }
    };
}

piecewise_sampler!(
    /// Triangle on `[min, max]` peaking at `mode`.
    Triangular
);
piecewise_sampler!(
    /// Trapezoid rising on `[a, b]`, flat on `[b, c]`, falling on `[c, d]`.
    Trapezoidal
);
piecewise_sampler!(
    /// Piecewise-linear density through the given points.
    Linear
);
piecewise_sampler!(
    /// Cubic Hermite density through the given points and slopes.
    Hermite
);
piecewise_sampler!(
    /// Any [`PiecewiseCurve`].
    Piecewise
);

impl Triangular {
    pub fn new(min: f64, mode: f64, max: f64) -> SampleResult<Self> {
        if !(min < max) {
            return Err(SampleError::EmptyRange {
                lo: min.to_string(),
                hi: max.to_string(),
                kind: "[min, max]",
            });
        }
        if !(min <= mode && mode <= max) {
            return Err(SampleError::invalid(
                "mode",
                format!("{mode} lies outside [{min}, {max}]"),
            ));
        }
        merged_linear(&[(min, 0.0), (mode, 1.0), (max, 0.0)]).map(Self)
    }
}

impl Trapezoidal {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> SampleResult<Self> {
        if !(a < d) {
            return Err(SampleError::EmptyRange {
                lo: a.to_string(),
                hi: d.to_string(),
                kind: "[a, d]",
            });
        }
        if !(a <= b && b <= c && c <= d) {
            return Err(SampleError::invalid(
                "b, c",
                format!("need {a} <= {b} <= {c} <= {d}"),
            ));
        }
        merged_linear(&[(a, 0.0), (b, 1.0), (c, 1.0), (d, 0.0)]).map(Self)
    }
}

impl Linear {
    pub fn new(xs: &[f64], ys: &[f64]) -> SampleResult<Self> {
        PiecewiseSampler::new(PiecewiseCurve::linear(xs, ys)?).map(Self)
    }
}

impl Hermite {
    pub fn new(xs: &[f64], ys: &[f64], tangents: &[f64]) -> SampleResult<Self> {
        PiecewiseSampler::new(PiecewiseCurve::hermite(xs, ys, tangents)?).map(Self)
    }
}

impl Piecewise {
    pub fn new(curve: PiecewiseCurve) -> SampleResult<Self> {
        PiecewiseSampler::new(curve).map(Self)
    }

    pub fn curve(&self) -> &PiecewiseCurve {
        self.0.curve()
    }
}

/// Uniform direction in `N` dimensions (2, 3 or 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitVector<const N: usize>(());

impl<const N: usize> UnitVector<N> {
    pub fn new() -> SampleResult<Self> {
        match N {
            2..=4 => Ok(Self(())),
            _ => Err(SampleError::UnsupportedDimension(N)),
        }
    }
}

impl<const N: usize> Sampler for UnitVector<N> {
    type Output = [f64; N];

    #[inline]
    fn sample<B: BitSource + ?Sized>(&self, src: &mut B) -> [f64; N] {
        let mut out = [0.0; N];
        // N was checked in `new`
        write_unit_vector(src, &mut out);
        out
    }
}

/// Uniformly distributed rotation quaternion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rotation;

impl Sampler for Rotation {
    type Output = Quaternion<f64>;

    #[inline]
    fn sample<B: BitSource + ?Sized>(&self, src: &mut B) -> Quaternion<f64> {
        rotation(src)
    }
}

/// Uniform integers over a fixed range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntRange<T: SampleInt> {
    lo: T,
    // inclusive span, hi - lo
    span: T::Word,
}

impl<T: SampleInt> IntRange<T> {
    /// `[lo, hi)`.
    pub fn new(lo: T, hi: T) -> SampleResult<Self> {
        if lo >= hi {
            return Err(SampleError::EmptyRange {
                lo: format!("{lo:?}"),
                hi: format!("{hi:?}"),
                kind: "[lo, hi)",
            });
        }
        let span = hi.span_from(lo).wrapping_sub(<T::Word as Word>::ONE);
        Ok(Self { lo, span })
    }

    /// `[lo, hi]`.
    pub fn new_inclusive(lo: T, hi: T) -> SampleResult<Self> {
        if lo > hi {
            return Err(SampleError::EmptyRange {
                lo: format!("{lo:?}"),
                hi: format!("{hi:?}"),
                kind: "[lo, hi]",
            });
        }
        Ok(Self {
            lo,
            span: hi.span_from(lo),
        })
    }
}

impl<T: SampleInt> Sampler for IntRange<T> {
    type Output = T;

    #[inline]
    fn sample<B: BitSource + ?Sized>(&self, src: &mut B) -> T {
        self.lo.offset_by(below_inclusive_word(src, self.span))
    }
}

pub fn uniform<B: BitSource + ?Sized>(src: &mut B, lo: f64, hi: f64) -> SampleResult<f64> {
    Ok(Uniform::new(lo, hi)?.sample(src))
}

pub fn normal<B: BitSource + ?Sized>(src: &mut B, mean: f64, std_dev: f64) -> SampleResult<f64> {
    Ok(Normal::new(mean, std_dev)?.sample(src))
}

pub fn exponential<B: BitSource + ?Sized>(src: &mut B, rate: f64) -> SampleResult<f64> {
    Ok(Exponential::new(rate)?.sample(src))
}

/// One triangular draw. Builds a three-point table each call; keep a
/// [`Triangular`] for repeated draws.
pub fn triangular<B: BitSource + ?Sized>(
    src: &mut B,
    min: f64,
    mode: f64,
    max: f64,
) -> SampleResult<f64> {
    Ok(Triangular::new(min, mode, max)?.sample(src))
}

pub fn trapezoidal<B: BitSource + ?Sized>(
    src: &mut B,
    a: f64,
    b: f64,
    c: f64,
    d: f64,
) -> SampleResult<f64> {
    Ok(Trapezoidal::new(a, b, c, d)?.sample(src))
}

pub fn linear<B: BitSource + ?Sized>(src: &mut B, xs: &[f64], ys: &[f64]) -> SampleResult<f64> {
    Ok(Linear::new(xs, ys)?.sample(src))
}

pub fn hermite<B: BitSource + ?Sized>(
    src: &mut B,
    xs: &[f64],
    ys: &[f64],
    tangents: &[f64],
) -> SampleResult<f64> {
    Ok(Hermite::new(xs, ys, tangents)?.sample(src))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::testing::rng;

    fn mean_of<S: Sampler<Output = f64>>(s: &S, seed: u64, n: usize) -> f64 {
        let mut rng = rng(seed);
        (0..n).map(|_| s.sample(&mut rng)).sum::<f64>() / n as f64
    }

    #[test]
    fn test_normal_scaled() {
        let d = Normal::new(10.0, 2.0).unwrap();
        let mut rng = rng(61);
        let n = 200_000;
        let xs: Vec<f64> = (0..n).map(|_| d.sample(&mut rng)).collect();
        let mean = xs.iter().sum::<f64>() / n as f64;
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!((mean - 10.0).abs() < 0.03, "Mean should be close to 10, got {mean}");
        assert!((var - 4.0).abs() < 0.08, "Variance should be close to 4, got {var}");
    }

    #[test]
    fn test_exponential_rate() {
        let d = Exponential::new(4.0).unwrap();
        let mean = mean_of(&d, 62, 200_000);
        assert!((mean - 0.25).abs() < 0.003, "Mean should be close to 0.25, got {mean}");
    }

    #[test]
    fn test_uniform_range() {
        let d = Uniform::new(-3.0, 5.0).unwrap();
        let mut rng = rng(63);
        for _ in 0..10000 {
            let x = d.sample(&mut rng);
            assert!((-3.0..5.0).contains(&x));
        }
        let mean = mean_of(&d, 64, 100_000);
        assert!((mean - 1.0).abs() < 0.05, "{mean}");
    }

    #[test]
    fn test_triangular_shapes() {
        // symmetric, left-degenerate and right-degenerate modes
        let mean = mean_of(&Triangular::new(0.0, 1.0, 2.0).unwrap(), 65, 100_000);
        assert!((mean - 1.0).abs() < 0.01, "{mean}");
        let mean = mean_of(&Triangular::new(0.0, 0.0, 3.0).unwrap(), 66, 100_000);
        assert!((mean - 1.0).abs() < 0.015, "{mean}");
        let mean = mean_of(&Triangular::new(0.0, 3.0, 3.0).unwrap(), 67, 100_000);
        assert!((mean - 2.0).abs() < 0.015, "{mean}");
    }

    #[test]
    fn test_trapezoidal() {
        // a rectangle when b == a and c == d
        let d = Trapezoidal::new(1.0, 1.0, 3.0, 3.0).unwrap();
        let mean = mean_of(&d, 68, 100_000);
        assert!((mean - 2.0).abs() < 0.01, "{mean}");
        let d = Trapezoidal::new(0.0, 1.0, 2.0, 3.0).unwrap();
        let mean = mean_of(&d, 69, 100_000);
        assert!((mean - 1.5).abs() < 0.01, "{mean}");
    }

    #[test]
    fn test_int_range() {
        let d = IntRange::new(-5i32, 5).unwrap();
        let mut rng = rng(70);
        let mut seen = [false; 10];
        for _ in 0..10000 {
            let x = d.sample(&mut rng);
            assert!((-5..5).contains(&x));
            seen[(x + 5) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));

        let full = IntRange::new_inclusive(u8::MIN, u8::MAX).unwrap();
        let mut hits = [0u32; 256];
        for _ in 0..100_000 {
            hits[full.sample(&mut rng) as usize] += 1;
        }
        assert!(hits.iter().all(|&h| h > 0));
    }

    #[test]
    fn test_unit_vector_dimension() {
        assert!(UnitVector::<3>::new().is_ok());
        assert_eq!(UnitVector::<5>::new(), Err(SampleError::UnsupportedDimension(5)));
        assert_eq!(UnitVector::<1>::new(), Err(SampleError::UnsupportedDimension(1)));
        let mut rng = rng(71);
        let v = UnitVector::<2>::new().unwrap().sample(&mut rng);
        assert!((v[0] * v[0] + v[1] * v[1] - 1.0).abs() < 1e-9);
        let q = Rotation.sample(&mut rng);
        assert!((q.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(Normal::new(0.0, 0.0).is_err());
        assert!(Normal::new(f64::NAN, 1.0).is_err());
        assert!(Exponential::new(-1.0).is_err());
        assert!(Uniform::new(1.0, 1.0).is_err());
        assert!(Triangular::new(0.0, 2.0, 1.0).is_err());
        assert!(Triangular::new(1.0, 1.0, 1.0).is_err());
        assert!(Trapezoidal::new(0.0, 2.0, 1.0, 3.0).is_err());
        assert!(IntRange::new(3u8, 3).is_err());
        assert!(IntRange::new_inclusive(3u8, 3).is_ok());
    }

    #[test]
    fn test_one_shot_functions() {
        let mut rng = rng(72);
        assert!(normal(&mut rng, 0.0, 1.0).unwrap().is_finite());
        assert!(exponential(&mut rng, 1.0).unwrap() >= 0.0);
        assert!((0.0..1.0).contains(&uniform(&mut rng, 0.0, 1.0).unwrap()));
        assert!((0.0..=2.0).contains(&triangular(&mut rng, 0.0, 0.5, 2.0).unwrap()));
        assert!((0.0..=4.0).contains(&trapezoidal(&mut rng, 0.0, 1.0, 2.0, 4.0).unwrap()));
        assert!((0.0..=1.0).contains(&linear(&mut rng, &[0.0, 1.0], &[1.0, 2.0]).unwrap()));
        let x = hermite(&mut rng, &[0.0, 1.0], &[0.0, 0.0], &[4.0, -4.0]).unwrap();
        assert!((0.0..=1.0).contains(&x));
        assert!(normal(&mut rng, 0.0, -1.0).is_err());
    }
}
