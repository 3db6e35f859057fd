//! Cumulative weights scaled onto the full range of an unsigned word.

use crate::{
    BitSource,
    error::{SampleError, SampleResult},
    range::Word,
};
use multiversion::multiversion;
use tracing::debug;

/// A discretised CDF over non-negative weights.
///
/// Entry `j` owns the words in `(cumulative[j - 1], cumulative[j]]` (entry 0
/// also owns zero). Zero weights are dropped at build time and can never be
/// selected; the final entry is `W::MAX`, so every word has an owner.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteCdf<W> {
    cumulative: Vec<W>,
    index: Vec<usize>,
    total: f64,
}

#[multiversion(targets = "simd")]
fn build_prefix_sum(weights: &[f64], cumsum: &mut [f64]) {
    let mut sum = 0.0;
    for (w, c) in weights.iter().zip(cumsum.iter_mut()) {
        sum += w;
        *c = sum;
    }
}

impl<W: Word> DiscreteCdf<W> {
    pub fn from_weights(weights: &[f64]) -> SampleResult<Self> {
        if weights.is_empty() {
            return Err(SampleError::invalid("weights", "no weights given"));
        }
        if let Some(i) = weights.iter().position(|w| !(w.is_finite() && *w >= 0.0)) {
            return Err(SampleError::invalid(
                "weights",
                format!("weight {i} is {}, must be finite and non-negative", weights[i]),
            ));
        }

        let mut cumsum = vec![0.0; weights.len()];
        build_prefix_sum(weights, &mut cumsum);
        let total = cumsum[cumsum.len() - 1];
        if total <= 0.0 {
            return Err(SampleError::ZeroTotalWeight);
        }
        if !total.is_finite() {
            return Err(SampleError::invalid("weights", "sum overflows"));
        }

        // pad so that rounding can never push an entry past the word range
        let pad = total * 2f64.powi(-(W::BITS as i32)).max(f64::EPSILON);
        let scale = 2f64.powi(W::BITS as i32) / (total + pad);

        let mut cumulative = Vec::with_capacity(weights.len());
        let mut index = Vec::with_capacity(weights.len());
        for (i, (&w, &c)) in weights.iter().zip(&cumsum).enumerate() {
            if w > 0.0 {
                cumulative.push(W::from_f64(c * scale));
                index.push(i);
            }
        }
        if let Some(last) = cumulative.last_mut() {
            *last = W::MAX;
        }

        debug!(
            entries = index.len(),
            skipped = weights.len() - index.len(),
            bits = W::BITS,
            "built discrete cdf"
        );
        Ok(Self {
            cumulative,
            index,
            total,
        })
    }

    /// Sum of the weights before scaling.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Number of selectable (non-zero) entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn cumulative(&self) -> &[W] {
        &self.cumulative
    }

    /// Lower-bound search: first entry whose cumulative value is `>= r`.
    #[inline]
    fn position(&self, r: W) -> usize {
        self.cumulative.partition_point(|&c| c < r)
    }

    /// Original weight index owning `r`, and how far into its share `r` lies.
    #[inline]
    pub(crate) fn locate(&self, r: W) -> (usize, f64) {
        let j = self.position(r);
        let start = if j == 0 { W::ZERO } else { self.cumulative[j - 1] };
        let width = self.cumulative[j].wrapping_sub(start).to_f64();
        let fraction = if width > 0.0 {
            r.wrapping_sub(start).to_f64() / width
        } else {
            0.0
        };
        (self.index[j], fraction.min(1.0))
    }

    /// Index of the original weight selected by one draw.
    #[inline]
    pub fn sample<B: BitSource + ?Sized>(&self, src: &mut B) -> usize {
        self.index[self.position(W::draw(src))]
    }
}
