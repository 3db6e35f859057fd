use crate::error::{SampleError, SampleResult};

/// How the density is interpolated across one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interp {
    /// Constant at the left breakpoint's value.
    Uniform,
    Linear,
    /// Cubic Hermite through both values with the given slopes.
    Hermite,
}

/// An animation-curve style key. Infinite tangents mean a stepped segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub time: f64,
    pub value: f64,
    pub in_tangent: f64,
    pub out_tangent: f64,
}

impl Keyframe {
    pub fn new(time: f64, value: f64, in_tangent: f64, out_tangent: f64) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Segment {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    /// End slopes in units of `y` per unit `x`.
    pub m0: f64,
    pub m1: f64,
    pub kind: Interp,
}

impl Segment {
    #[inline]
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Density as a polynomial in `t = (x - x0) / width`, lowest power first.
    pub fn poly(&self) -> [f64; 4] {
        match self.kind {
            Interp::Uniform => [self.y0, 0.0, 0.0, 0.0],
            Interp::Linear => [self.y0, self.y1 - self.y0, 0.0, 0.0],
            Interp::Hermite => {
                let h = self.width();
                let (y0, y1, s0, s1) = (self.y0, self.y1, h * self.m0, h * self.m1);
                [
                    y0,
                    s0,
                    -3.0 * y0 - 2.0 * s0 + 3.0 * y1 - s1,
                    2.0 * y0 + s0 - 2.0 * y1 + s1,
                ]
            }
        }
    }

    pub fn area(&self) -> f64 {
        let [a0, a1, a2, a3] = self.poly();
        self.width() * (a0 + a1 / 2.0 + a2 / 3.0 + a3 / 4.0)
    }

    /// Smallest density value over the segment.
    fn min_density(&self) -> f64 {
        let [a0, a1, a2, a3] = self.poly();
        let p = |t: f64| a0 + t * (a1 + t * (a2 + t * a3));
        let mut lowest = p(0.0).min(p(1.0));
        // stationary points of the cubic: 3 a3 t^2 + 2 a2 t + a1 = 0
        let (qa, qb, qc) = (3.0 * a3, 2.0 * a2, a1);
        let roots = if qa == 0.0 {
            [(qb != 0.0).then(|| -qc / qb), None]
        } else {
            let disc = qb * qb - 4.0 * qa * qc;
            if disc < 0.0 {
                [None, None]
            } else {
                let sq = disc.sqrt();
                [Some((-qb + sq) / (2.0 * qa)), Some((-qb - sq) / (2.0 * qa))]
            }
        };
        for t in roots.into_iter().flatten() {
            if t > 0.0 && t < 1.0 {
                lowest = lowest.min(p(t));
            }
        }
        lowest
    }
}

/// A density made of segments between ordered breakpoints; zero outside.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseCurve {
    pub(crate) segments: Vec<Segment>,
}

fn check_breakpoints(xs: &[f64]) -> SampleResult<()> {
    if xs.len() < 2 {
        return Err(SampleError::invalid(
            "xs",
            format!("need at least 2 breakpoints, got {}", xs.len()),
        ));
    }
    if let Some(i) = xs.iter().position(|x| !x.is_finite()) {
        return Err(SampleError::invalid("xs", format!("breakpoint {i} is {}", xs[i])));
    }
    if let Some(i) = xs.windows(2).position(|p| p[0] >= p[1]) {
        return Err(SampleError::NonIncreasing { index: i + 1 });
    }
    Ok(())
}

fn check_len(expected: usize, found: usize) -> SampleResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(SampleError::LengthMismatch { expected, found })
    }
}

fn check_densities(ys: &[f64]) -> SampleResult<()> {
    match ys.iter().position(|y| !(y.is_finite() && *y >= 0.0)) {
        Some(i) => Err(SampleError::invalid(
            "ys",
            format!("density {i} is {}, must be finite and non-negative", ys[i]),
        )),
        None => Ok(()),
    }
}

impl PiecewiseCurve {
    /// Constant density `densities[i]` on `[xs[i], xs[i + 1])`.
    pub fn uniform(xs: &[f64], densities: &[f64]) -> SampleResult<Self> {
        check_breakpoints(xs)?;
        check_len(xs.len() - 1, densities.len())?;
        check_densities(densities)?;
        let segments = xs
            .windows(2)
            .zip(densities)
            .map(|(x, &y)| Segment {
                x0: x[0],
                x1: x[1],
                y0: y,
                y1: y,
                m0: 0.0,
                m1: 0.0,
                kind: Interp::Uniform,
            })
            .collect();
        Ok(Self { segments })
    }

    /// Density interpolated linearly between `(xs[i], ys[i])`.
    pub fn linear(xs: &[f64], ys: &[f64]) -> SampleResult<Self> {
        check_breakpoints(xs)?;
        check_len(xs.len(), ys.len())?;
        check_densities(ys)?;
        Ok(Self::from_points(xs, ys, |_| (0.0, 0.0, Interp::Linear)))
    }

    /// Cubic Hermite density with slope `tangents[i]` at each breakpoint.
    pub fn hermite(xs: &[f64], ys: &[f64], tangents: &[f64]) -> SampleResult<Self> {
        check_breakpoints(xs)?;
        check_len(xs.len(), ys.len())?;
        check_len(xs.len(), tangents.len())?;
        check_densities(ys)?;
        if let Some(i) = tangents.iter().position(|m| !m.is_finite()) {
            return Err(SampleError::invalid(
                "tangents",
                format!("tangent {i} is {}", tangents[i]),
            ));
        }
        let curve = Self::from_points(xs, ys, |i| (tangents[i], tangents[i + 1], Interp::Hermite));
        curve.check_non_negative()?;
        Ok(curve)
    }

    /// Builds from animation keys: segment `i` runs from key `i`'s out
    /// tangent to key `i + 1`'s in tangent, and steps when either is infinite.
    pub fn from_keyframes(keys: &[Keyframe]) -> SampleResult<Self> {
        let xs: Vec<f64> = keys.iter().map(|k| k.time).collect();
        let ys: Vec<f64> = keys.iter().map(|k| k.value).collect();
        check_breakpoints(&xs)?;
        check_densities(&ys)?;
        if let Some(i) = keys
            .iter()
            .position(|k| k.in_tangent.is_nan() || k.out_tangent.is_nan())
        {
            return Err(SampleError::invalid("keys", format!("key {i} has a NaN tangent")));
        }
        let curve = Self::from_points(&xs, &ys, |i| {
            let (m0, m1) = (keys[i].out_tangent, keys[i + 1].in_tangent);
            if m0.is_finite() && m1.is_finite() {
                (m0, m1, Interp::Hermite)
            } else {
                (0.0, 0.0, Interp::Uniform)
            }
        });
        curve.check_non_negative()?;
        Ok(curve)
    }

    fn from_points<F>(xs: &[f64], ys: &[f64], mut shape: F) -> Self
    where
        F: FnMut(usize) -> (f64, f64, Interp),
    {
        let segments = (0..xs.len() - 1)
            .map(|i| {
                let (m0, m1, kind) = shape(i);
                let y1 = if kind == Interp::Uniform { ys[i] } else { ys[i + 1] };
                Segment {
                    x0: xs[i],
                    x1: xs[i + 1],
                    y0: ys[i],
                    y1,
                    m0,
                    m1,
                    kind,
                }
            })
            .collect();
        Self { segments }
    }

    fn check_non_negative(&self) -> SampleResult<()> {
        for (i, seg) in self.segments.iter().enumerate() {
            let [a0, a1, a2, a3] = seg.poly();
            let scale = a0.abs().max(a1.abs()).max(a2.abs()).max(a3.abs());
            if seg.min_density() < -1e-12 * scale {
                return Err(SampleError::invalid(
                    "tangents",
                    format!("segment {i} dips below zero density"),
                ));
            }
        }
        Ok(())
    }

    /// Density at `x`; zero outside `[x_0, x_n)`.
    pub fn pdf(&self, x: f64) -> f64 {
        let i = self.segments.partition_point(|s| s.x1 <= x);
        match self.segments.get(i) {
            Some(seg) if x >= seg.x0 => {
                let t = (x - seg.x0) / seg.width();
                let [a0, a1, a2, a3] = seg.poly();
                (a0 + t * (a1 + t * (a2 + t * a3))).max(0.0)
            }
            _ => 0.0,
        }
    }

    /// Total area under the density.
    pub fn area(&self) -> f64 {
        self.segments.iter().map(Segment::area).sum()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Support `[x_0, x_n]`.
    pub fn support(&self) -> (f64, f64) {
        (self.segments[0].x0, self.segments[self.segments.len() - 1].x1)
    }
}
