//! Uniform unit vectors and rotations by Marsaglia's method, in fixed point.
//!
//! All intermediate values are integers (Q2.30 coordinates, Q4.60 squares);
//! floats are assembled only for the output, so a given bit stream produces
//! the same vectors on every platform.

use crate::{
    BitSource,
    disk::{DiskPoint, disk_q30},
    error::{SampleError, SampleResult},
    fixed::{FixedFloat, Q60_ONE, fixed_sqrt},
    trig::sin_cos_turns,
};

// Both squared radii below 2^-20 would leave too few bits in the divisor.
const DEGENERATE_S: u64 = 1 << 40;

/// A rotation quaternion, scalar part `w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion<F> {
    pub x: F,
    pub y: F,
    pub z: F,
    pub w: F,
}

impl<F: FixedFloat> Quaternion<F> {
    /// Components in `[x, y, z, w]` order.
    pub fn as_array(&self) -> [F; 4] {
        [self.x, self.y, self.z, self.w]
    }

    pub fn norm(&self) -> f64 {
        self.as_array()
            .iter()
            .map(|c| c.to_f64() * c.to_f64())
            .sum::<f64>()
            .sqrt()
    }
}

/// Point on the unit circle: the double-angle map of a disk point.
fn circle_q60<B: BitSource + ?Sized>(src: &mut B) -> [i64; 2] {
    let DiskPoint { u, v, s } = disk_q30(src);
    let (u, v, s) = (u as i128, v as i128, s as i128);
    [
        (((u * u - v * v) << 60) / s) as i64,
        (((2 * u * v) << 60) / s) as i64,
    ]
}

/// Point on the unit sphere, Q4.60 components.
pub(crate) fn sphere_q60<B: BitSource + ?Sized>(src: &mut B) -> [i64; 3] {
    let DiskPoint { u, v, s } = disk_q30(src);
    let t = fixed_sqrt(Q60_ONE - s) as i64;
    [
        2 * u as i64 * t,
        2 * v as i64 * t,
        Q60_ONE as i64 - 2 * s as i64,
    ]
}

/// Point on the unit 3-sphere, Q4.60 components.
///
/// The pair with the larger squared radius is the one rescaled, by
/// `sqrt(1 - s_small) / sqrt(s_large)`, and it stays in its own slots, so
/// the first pair's squared norm remains uniform on `[0, 1]`.
fn hypersphere_q60<B: BitSource + ?Sized>(src: &mut B) -> [i64; 4] {
    loop {
        let a = disk_q30(src);
        let b = disk_q30(src);
        let (small, large) = if a.s > b.s { (b, a) } else { (a, b) };
        if large.s < DEGENERATE_S {
            continue;
        }
        let num = fixed_sqrt(Q60_ONE - small.s) as i128;
        let den = fixed_sqrt(large.s) as i128;
        let scale = |c: i32| (((c as i128 * num) << 30) / den) as i64;
        let keep = |c: i32| (c as i64) << 30;
        return if a.s > b.s {
            [scale(a.u), scale(a.v), keep(b.u), keep(b.v)]
        } else {
            [keep(a.u), keep(a.v), scale(b.u), scale(b.v)]
        };
    }
}

pub fn unit_vector2<F: FixedFloat, B: BitSource + ?Sized>(src: &mut B) -> [F; 2] {
    circle_q60(src).map(|c| F::from_q(c, 60))
}

pub fn unit_vector3<F: FixedFloat, B: BitSource + ?Sized>(src: &mut B) -> [F; 3] {
    sphere_q60(src).map(|c| F::from_q(c, 60))
}

pub fn unit_vector4<F: FixedFloat, B: BitSource + ?Sized>(src: &mut B) -> [F; 4] {
    hypersphere_q60(src).map(|c| F::from_q(c, 60))
}

/// Writes a unit vector of `out.len()` dimensions; false if unsupported.
pub(crate) fn write_unit_vector<F: FixedFloat, B: BitSource + ?Sized>(
    src: &mut B,
    out: &mut [F],
) -> bool {
    match out.len() {
        2 => out.copy_from_slice(&unit_vector2(src)),
        3 => out.copy_from_slice(&unit_vector3(src)),
        4 => out.copy_from_slice(&unit_vector4(src)),
        _ => return false,
    }
    true
}

/// Fills `out` (length 2, 3 or 4) with a uniform unit vector.
pub fn unit_vector_into<F: FixedFloat, B: BitSource + ?Sized>(
    src: &mut B,
    out: &mut [F],
) -> SampleResult<()> {
    if write_unit_vector(src, out) {
        Ok(())
    } else {
        Err(SampleError::UnsupportedDimension(out.len()))
    }
}

/// Uniformly distributed rotation (Haar measure on SO(3)).
///
/// The axis is a uniform unit vector. The rotation angle is drawn uniform on
/// `[0, pi)` as a binary angle and its half is kept with probability
/// `sin^2(half)`, which is the Haar density of the half-angle. A spare bit of
/// the angle draw picks between `q` and `-q`, so every component averages to
/// zero.
pub fn rotation<F: FixedFloat, B: BitSource + ?Sized>(src: &mut B) -> Quaternion<F> {
    let axis = sphere_q60(src);
    let (sin, cos, flip) = loop {
        let bits = src.next64();
        let half = (bits >> 34) as u32;
        let gate = (bits & ((1 << 30) - 1)) as i64;
        let (sin, cos) = sin_cos_turns(half);
        if gate < (sin as i64 * sin as i64) >> 30 {
            break (sin as i64, cos as i64, (bits >> 30) & 1 == 1);
        }
    };
    let sign = if flip { -1 } else { 1 };
    let [x, y, z] = axis.map(|c| F::from_q(sign * (c >> 30) * sin, 60));
    Quaternion {
        x,
        y,
        z,
        w: F::from_q(sign * cos, 30),
    }
}

/// Writes a rotation into `out` as `[x, y, z, w]`.
pub fn rotation_into<F: FixedFloat, B: BitSource + ?Sized>(
    src: &mut B,
    out: &mut [F],
) -> SampleResult<()> {
    if out.len() != 4 {
        return Err(SampleError::LengthMismatch {
            expected: 4,
            found: out.len(),
        });
    }
    out.copy_from_slice(&rotation(src).as_array());
    Ok(())
}
