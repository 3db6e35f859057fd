//! Equal-area layer decomposition of a decreasing density.
//!
//! Layout follows Marsaglia and Tsang: `x[0] = v / f(r)` is the virtual width
//! of the base strip (rectangle plus tail), `x[1] = r`, the widths shrink
//! towards `x[n] = 0` at the peak. Layer `i` spans `[0, x[i])` between heights
//! `f(x[i])` and `f(x[i + 1])`.

use super::ZigguratDensity;
use crate::error::{SampleError, SampleResult};
use tracing::debug;

// offset bits taken from each draw
pub(crate) const OFFSET_BITS: u32 = 53;
// layer counts up to 2^10 index straight from the draw
pub(crate) const MAX_INLINE_LAYER_BITS: u32 = 10;

/// Table construction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZigguratConfig {
    /// Number of layers, tail strip included.
    pub layers: usize,
    /// Relative tolerance on the base radius `r`.
    pub epsilon: f64,
    pub max_iterations: u32,
}

impl Default for ZigguratConfig {
    fn default() -> Self {
        Self {
            layers: 256,
            epsilon: 1e-15,
            max_iterations: 200,
        }
    }
}

impl ZigguratConfig {
    pub fn with_layers(layers: usize) -> Self {
        Self {
            layers,
            ..Self::default()
        }
    }
}

/// An immutable ziggurat, shareable across samplers and threads.
#[derive(Debug, Clone, PartialEq)]
pub struct ZigguratTable {
    pub(crate) x: Vec<f64>,
    pub(crate) f: Vec<f64>,
    /// `floor(2^53 * x[i + 1] / x[i])`: offsets below this sit under the rectangle.
    pub(crate) k: Vec<u64>,
    /// `x[i] / 2^53`: offset to abscissa.
    pub(crate) w: Vec<f64>,
    pub(crate) r: f64,
    pub(crate) v: f64,
    pub(crate) symmetric: bool,
    pub(crate) layer_mask: Option<u64>,
}

enum Stack {
    /// Layers passed the peak before the last one: `r` is too small.
    Overshoot,
    /// Strip area minus the area left for the top layer.
    Residual(f64),
}

fn stack<D: ZigguratDensity + ?Sized>(density: &D, layers: usize, r: f64, x: &mut Vec<f64>) -> Stack {
    let peak = density.pdf(0.0);
    let v = r * density.pdf(r) + density.tail_area(r);
    x.clear();
    x.push(v / density.pdf(r));
    x.push(r);
    for _ in 2..layers {
        let last = x[x.len() - 1];
        let y = density.pdf(last) + v / last;
        if y >= peak {
            return Stack::Overshoot;
        }
        x.push(density.inv_pdf(y));
    }
    let top = x[x.len() - 1];
    Stack::Residual(v - top * (peak - density.pdf(top)))
}

impl ZigguratTable {
    /// Solves for the base radius by bisection and lays out the table.
    pub fn build<D: ZigguratDensity + ?Sized>(
        density: &D,
        config: &ZigguratConfig,
    ) -> SampleResult<Self> {
        if config.layers < 2 {
            return Err(SampleError::invalid(
                "layers",
                format!("need at least 2, got {}", config.layers),
            ));
        }
        if !(config.epsilon > 0.0 && config.epsilon < 1.0) {
            return Err(SampleError::invalid(
                "epsilon",
                format!("must lie in (0, 1), got {}", config.epsilon),
            ));
        }
        let (lo, hi) = density.search_interval();
        if !(lo > 0.0 && hi > lo && hi.is_finite()) {
            return Err(SampleError::TableConstruction(format!(
                "bad search interval [{lo}, {hi}]"
            )));
        }
        let n = config.layers;
        let (mut lo, mut hi) = (lo, hi);
        let mut x = Vec::with_capacity(n + 1);
        let mut iterations = 0;
        while hi - lo > config.epsilon * hi && iterations < config.max_iterations {
            let mid = 0.5 * (lo + hi);
            match stack(density, n, mid, &mut x) {
                Stack::Overshoot => lo = mid,
                Stack::Residual(res) if res > 0.0 => lo = mid,
                Stack::Residual(_) => hi = mid,
            }
            iterations += 1;
        }

        let r = hi;
        let v = r * density.pdf(r) + density.tail_area(r);
        match stack(density, n, r, &mut x) {
            Stack::Residual(res) if res.abs() <= 1e-6 * v => {}
            Stack::Residual(res) => {
                return Err(SampleError::TableConstruction(format!(
                    "no convergence in [{lo}, {hi}] after {iterations} steps (residual {res})"
                )));
            }
            Stack::Overshoot => {
                return Err(SampleError::TableConstruction(format!(
                    "layers overshoot the peak at r = {r}"
                )));
            }
        }
        x.push(0.0);

        let f: Vec<f64> = x.iter().map(|&xi| density.pdf(xi)).collect();
        if x.iter().chain(&f).any(|v| !v.is_finite()) || !(v > 0.0) {
            return Err(SampleError::TableConstruction(format!(
                "density produced non-finite layers (r = {r}, v = {v})"
            )));
        }
        let scale = (1u64 << OFFSET_BITS) as f64;
        let k = (0..n)
            .map(|i| (scale * (x[i + 1] / x[i])) as u64)
            .collect();
        let w = x[..n].iter().map(|&xi| xi / scale).collect();
        let layer_mask = (n.is_power_of_two() && n.trailing_zeros() <= MAX_INLINE_LAYER_BITS)
            .then(|| n as u64 - 1);

        debug!(layers = n, r, v, iterations, "built ziggurat table");
        Ok(Self {
            x,
            f,
            k,
            w,
            r,
            v,
            symmetric: density.symmetric(),
            layer_mask,
        })
    }

    pub fn layers(&self) -> usize {
        self.k.len()
    }

    /// Start of the tail strip.
    pub fn r(&self) -> f64 {
        self.r
    }

    /// Area of each layer under the unnormalised density.
    pub fn layer_area(&self) -> f64 {
        self.v
    }

    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// Layer boundaries `x[0..=n]`.
    pub fn boundaries(&self) -> &[f64] {
        &self.x
    }
}
