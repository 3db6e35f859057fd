//! Weighted choice of an index.
//!
//! The one-shot functions check every weight, scale a single uniform by the
//! total and walk the running sum; [`WeightedIndex`] builds an integer CDF
//! once and binary searches it for every draw.

use crate::{
    BitSource,
    distributions::Sampler,
    error::{SampleError, SampleResult},
    piecewise::DiscreteCdf,
    range::uniform01,
};

#[inline]
fn check_weight(i: usize, w: f64) -> SampleResult<f64> {
    if w.is_finite() && w >= 0.0 {
        Ok(w)
    } else {
        Err(SampleError::invalid(
            "weights",
            format!("weight {i} is {w}, must be finite and non-negative"),
        ))
    }
}

/// Checks every weight and sums them in the same pass.
fn checked_total<I: Iterator<Item = f64>>(weights: I) -> SampleResult<f64> {
    let mut total = 0.0;
    for (i, w) in weights.enumerate() {
        total += check_weight(i, w)?;
    }
    if !total.is_finite() {
        return Err(SampleError::invalid("weights", "sum is not finite"));
    }
    if total <= 0.0 {
        return Err(SampleError::ZeroTotalWeight);
    }
    Ok(total)
}

/// Walks the running sum to the first non-zero weight past `target`.
///
/// Rounding can leave `target` at or past the last partial sum; the last
/// non-zero weight then owns it. `None` when every weight is zero.
fn scan<I: Iterator<Item = f64>>(weights: I, target: f64) -> Option<usize> {
    let mut sum = 0.0;
    let mut last = None;
    for (i, w) in weights.enumerate() {
        if w > 0.0 {
            sum += w;
            last = Some(i);
            if target < sum {
                return Some(i);
            }
        }
    }
    last
}

/// Index `i` with probability `weights[i] / sum(weights)`.
///
/// Fails before drawing if any weight is negative or not finite.
pub fn weighted_index<B: BitSource + ?Sized>(src: &mut B, weights: &[f64]) -> SampleResult<usize> {
    if weights.is_empty() {
        return Err(SampleError::invalid("weights", "no weights given"));
    }
    let total = checked_total(weights.iter().copied())?;
    let target = uniform01(src) * total;
    scan(weights.iter().copied(), target).ok_or(SampleError::ZeroTotalWeight)
}

/// As [`weighted_index`], with the sum supplied by the caller.
///
/// The weights are still checked but not summed. A `total` larger than the
/// true sum shifts the excess onto the last non-zero weight.
pub fn weighted_index_with_total<B: BitSource + ?Sized>(
    src: &mut B,
    weights: &[f64],
    total: f64,
) -> SampleResult<usize> {
    if !total.is_finite() {
        return Err(SampleError::invalid("total", format!("must be finite, got {total}")));
    }
    for (i, &w) in weights.iter().enumerate() {
        check_weight(i, w)?;
    }
    if total <= 0.0 {
        return Err(SampleError::ZeroTotalWeight);
    }
    let target = uniform01(src) * total;
    scan(weights.iter().copied(), target).ok_or(SampleError::ZeroTotalWeight)
}

/// Weights given by `weight(i)` for `i` in `0..n`.
///
/// `weight` is called twice per index, once to check and sum and once to
/// walk, and must return the same value both times.
pub fn weighted_index_by<B, F>(src: &mut B, n: usize, mut weight: F) -> SampleResult<usize>
where
    B: BitSource + ?Sized,
    F: FnMut(usize) -> f64,
{
    if n == 0 {
        return Err(SampleError::invalid("weights", "no weights given"));
    }
    let total = checked_total((0..n).map(&mut weight))?;
    let target = uniform01(src) * total;
    scan((0..n).map(weight), target).ok_or(SampleError::ZeroTotalWeight)
}

/// Reusable weighted choice over a fixed set of weights.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedIndex {
    cdf: DiscreteCdf<u64>,
}

impl WeightedIndex {
    pub fn new(weights: &[f64]) -> SampleResult<Self> {
        Ok(Self {
            cdf: DiscreteCdf::from_weights(weights)?,
        })
    }

    pub fn total(&self) -> f64 {
        self.cdf.total()
    }

    /// Number of indices with non-zero weight.
    pub fn len(&self) -> usize {
        self.cdf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cdf.is_empty()
    }
}

impl Sampler for WeightedIndex {
    type Output = usize;

    #[inline]
    fn sample<B: BitSource + ?Sized>(&self, src: &mut B) -> usize {
        self.cdf.sample(src)
    }
}
