//! Sampling from piecewise densities through a discretised CDF.
//!
//! Segment areas become weights of a [`DiscreteCdf`]; one word picks the
//! segment and, through its position inside that segment's share, the
//! fraction of the segment's area to invert. A 32-bit or narrower CDF leaves
//! too few positions per share for that, so its fraction comes from a second,
//! 64-bit draw.

mod cdf;
mod curve;

pub use cdf::DiscreteCdf;
pub use curve::{Interp, Keyframe, PiecewiseCurve};

use crate::{
    BitSource,
    error::SampleResult,
    range::{Word, uniform01},
};
use curve::Segment;
use tracing::{debug, trace};

const HALLEY_STEPS: usize = 32;
const HALLEY_TOLERANCE: f64 = 1e-12;
// cubic and quadratic terms this small next to the rest are treated as zero
const DEGENERATE_RATIO: f64 = 1e-9;

/// A curve with its segment CDF, built once and sampled repeatedly.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseSampler<W: Word = u64> {
    curve: PiecewiseCurve,
    cdf: DiscreteCdf<W>,
}

impl<W: Word> PiecewiseSampler<W> {
    pub fn new(curve: PiecewiseCurve) -> SampleResult<Self> {
        let areas: Vec<f64> = curve.segments.iter().map(|s| s.area().max(0.0)).collect();
        let cdf = DiscreteCdf::from_weights(&areas)?;
        debug!(
            segments = areas.len(),
            zero_area = areas.len() - cdf.len(),
            area = cdf.total(),
            "built piecewise sampler"
        );
        Ok(Self { curve, cdf })
    }

    pub fn curve(&self) -> &PiecewiseCurve {
        &self.curve
    }

    pub fn cdf(&self) -> &DiscreteCdf<W> {
        &self.cdf
    }

    /// One draw of `W` for the segment; with `W` narrower than 64 bits, one
    /// more 64-bit draw for the position inside it.
    #[inline]
    pub fn sample<B: BitSource + ?Sized>(&self, src: &mut B) -> f64 {
        let (i, u) = self.cdf.locate(W::draw(src));
        let u = if W::BITS < 64 { uniform01(src) } else { u };
        let seg = &self.curve.segments[i];
        let t = match seg.kind {
            Interp::Uniform => u,
            Interp::Linear => linear_inverse(seg.y0, seg.y1, u),
            Interp::Hermite => hermite_inverse(seg, u),
        };
        (seg.x0 + t * seg.width()).clamp(seg.x0, seg.x1)
    }
}

/// Solves `y0 t + (y1 - y0) t^2 / 2 = u (y0 + y1) / 2` on `[0, 1]`.
///
/// Uses whichever of the two root forms avoids cancellation.
fn linear_inverse(y0: f64, y1: f64, u: f64) -> f64 {
    let total = 0.5 * (y0 + y1);
    if !(total > 0.0) {
        return u;
    }
    let a = 0.5 * (y1 - y0);
    let b = y0;
    let c = -u * total;
    if a.abs() <= DEGENERATE_RATIO * b.abs() {
        return (-c / b).clamp(0.0, 1.0);
    }
    let disc = (b * b - 4.0 * a * c).max(0.0);
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    if q == 0.0 {
        return 0.0;
    }
    let near = c / q;
    if (0.0..=1.0).contains(&near) {
        return near;
    }
    (q / a).clamp(0.0, 1.0)
}

/// Inverts the quartic segment CDF with safeguarded Halley steps.
fn hermite_inverse(seg: &Segment, u: f64) -> f64 {
    let [a0, a1, a2, a3] = seg.poly();
    let rest = a0.abs().max(a1.abs());
    if a3.abs() <= DEGENERATE_RATIO * rest && a2.abs() <= DEGENERATE_RATIO * rest {
        trace!(x0 = seg.x0, "hermite segment is linear, using the quadratic inverse");
        return linear_inverse(a0, a0 + a1, u);
    }

    let cdf = |t: f64| t * (a0 + t * (a1 / 2.0 + t * (a2 / 3.0 + t * a3 / 4.0)));
    let pdf = |t: f64| a0 + t * (a1 + t * (a2 + t * a3));
    let slope = |t: f64| a1 + t * (2.0 * a2 + t * 3.0 * a3);
    let target = u * cdf(1.0);

    let (mut lo, mut hi) = (0.0, 1.0);
    let mut t = linear_inverse(a0, pdf(1.0), u);
    for _ in 0..HALLEY_STEPS {
        let g = cdf(t) - target;
        if g == 0.0 {
            break;
        }
        if g > 0.0 {
            hi = t;
        } else {
            lo = t;
        }
        let d1 = pdf(t);
        let d2 = slope(t);
        let denom = 2.0 * d1 * d1 - g * d2;
        let step = if d1 > 0.0 && denom != 0.0 {
            2.0 * g * d1 / denom
        } else {
            f64::NAN
        };
        let next = t - step;
        let next = if next > lo && next < hi {
            next
        } else {
            0.5 * (lo + hi)
        };
        let moved = (next - t).abs();
        t = next;
        if moved < HALLEY_TOLERANCE {
            break;
        }
    }
    t.clamp(0.0, 1.0)
}
