use crate::error::{CheckError, CheckResult};
use gpoint::GPoint;
use tracing::info;

/// Equal-width bins over `[lo, hi)`; values outside are counted apart.
#[derive(Debug, Clone)]
pub struct Histogram {
    lo: f64,
    width: f64,
    counts: Vec<u64>,
    outside: u64,
}

impl Histogram {
    pub fn new(lo: f64, hi: f64, bins: usize) -> CheckResult<Self> {
        if bins == 0 {
            return Err(CheckError::Args("need at least one bin".into()));
        }
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(CheckError::Args(format!("bad histogram range [{lo}, {hi})")));
        }
        Ok(Self {
            lo,
            width: (hi - lo) / bins as f64,
            counts: vec![0; bins],
            outside: 0,
        })
    }

    #[inline]
    pub fn add(&mut self, x: f64) {
        let j = ((x - self.lo) / self.width).floor();
        if j >= 0.0 && (j as usize) < self.counts.len() {
            self.counts[j as usize] += 1;
        } else {
            self.outside += 1;
        }
    }

    /// Bin `i` as `[x0, x1)`.
    pub fn edges(&self, i: usize) -> (f64, f64) {
        let x0 = self.lo + self.width * i as f64;
        (x0, x0 + self.width)
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn outside(&self) -> u64 {
        self.outside
    }

    /// Expected counts from a CDF over the bin edges.
    pub fn expected_from_cdf<F: Fn(f64) -> f64>(&self, draws: usize, cdf: F) -> Vec<f64> {
        (0..self.counts.len())
            .map(|i| {
                let (x0, x1) = self.edges(i);
                draws as f64 * (cdf(x1) - cdf(x0))
            })
            .collect()
    }

    /// Prints `centre observed expected` rows, then logs the fit.
    pub fn report(&self, expected: &[f64]) {
        for (i, (&count, &e)) in self.counts.iter().zip(expected).enumerate() {
            let (x0, x1) = self.edges(i);
            println!("{} {} {}", GPoint(0.5 * (x0 + x1)), count, GPoint(e));
        }
        let (chi2, dof) = chi_squared(&self.counts, expected);
        info!(chi2, dof, outside = self.outside, "histogram fit");
    }
}

/// Pearson statistic over bins expecting at least 5 hits, and its degrees
/// of freedom.
pub fn chi_squared(observed: &[u64], expected: &[f64]) -> (f64, usize) {
    let mut chi2 = 0.0;
    let mut used: usize = 0;
    for (&o, &e) in observed.iter().zip(expected) {
        if e >= 5.0 {
            chi2 += (o as f64 - e).powi(2) / e;
            used += 1;
        }
    }
    (chi2, used.saturating_sub(1))
}

/// Running mean and variance (Welford).
#[derive(Debug, Clone, Copy, Default)]
pub struct Moments {
    n: u64,
    mean: f64,
    m2: f64,
}

impl Moments {
    #[inline]
    pub fn add(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn variance(&self) -> f64 {
        if self.n < 2 { 0.0 } else { self.m2 / self.n as f64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_bins() {
        let mut h = Histogram::new(0.0, 1.0, 4).unwrap();
        for x in [0.0, 0.1, 0.3, 0.99, 1.0, -0.1] {
            h.add(x);
        }
        assert_eq!(h.counts(), &[2, 1, 0, 1]);
        assert_eq!(h.outside(), 2);
        assert_eq!(h.edges(1), (0.25, 0.5));
        assert!(Histogram::new(1.0, 0.0, 4).is_err());
        assert!(Histogram::new(0.0, 1.0, 0).is_err());
    }

    #[test]
    fn test_chi_squared() {
        let (chi2, dof) = chi_squared(&[10, 10, 10, 0], &[10.0, 10.0, 10.0, 1.0]);
        assert_eq!(chi2, 0.0);
        assert_eq!(dof, 2);
        let (chi2, _) = chi_squared(&[15, 5], &[10.0, 10.0]);
        assert_eq!(chi2, 5.0);
    }

    #[test]
    fn test_moments() {
        let mut m = Moments::default();
        for x in [1.0, 2.0, 3.0, 4.0] {
            m.add(x);
        }
        assert_eq!(m.mean(), 2.5);
        assert!((m.variance() - 1.25).abs() < 1e-12);
    }
}
