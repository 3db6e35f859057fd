//! Fixed-point helpers.
//!
//! Coordinates are Q2.30 in an `i32` (one = `1 << 30`), squared radii are
//! Q4.60 in a 64-bit word (one = `1 << 60`). Results become floats only at the
//! output boundary, where the IEEE-754 word is assembled directly from the
//! fixed-point magnitude so small values keep every significant bit.

use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};

pub const Q30_ONE: i64 = 1 << 30;
pub const Q60_ONE: u64 = 1 << 60;

/// Float types that can be assembled from a fixed-point magnitude.
pub trait FixedFloat:
    Copy
    + Debug
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;

    /// `mag * 2^-frac_bits`, truncated toward zero.
    fn from_uq(mag: u64, frac_bits: u32) -> Self;

    /// Signed variant of [`FixedFloat::from_uq`].
    fn from_q(value: i64, frac_bits: u32) -> Self;

    fn to_f64(self) -> f64;
}

macro_rules! impl_fixed_float {
    ($t:ty, $bits:ty, $mant:expr, $bias:expr) => {
        impl FixedFloat for $t {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;

            #[inline]
            fn from_uq(mag: u64, frac_bits: u32) -> Self {
                if mag == 0 {
                    return 0.0;
                }
                let msb = 63 - mag.leading_zeros();
                let exponent = (msb as i32 - frac_bits as i32 + $bias) as $bits;
                let mantissa = if msb >= $mant {
                    mag >> (msb - $mant)
                } else {
                    mag << ($mant - msb)
                } & ((1u64 << $mant) - 1);
                <$t>::from_bits((exponent << $mant) | mantissa as $bits)
            }

            #[inline]
            fn from_q(value: i64, frac_bits: u32) -> Self {
                let mag = Self::from_uq(value.unsigned_abs(), frac_bits);
                if value < 0 {
                    <$t>::from_bits(mag.to_bits() | (1 << (<$bits>::BITS - 1)))
                } else {
                    mag
                }
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_fixed_float!(f32, u32, 23, 127);
impl_fixed_float!(f64, u64, 52, 1023);

/// Uniform on `[0, 1)` from a raw word, full precision near zero.
#[inline]
pub fn unit_f64(bits: u64) -> f64 {
    f64::from_uq(bits, 64)
}

/// Uniform on `[0, 1)` as `f32`.
#[inline]
pub fn unit_f32(bits: u64) -> f32 {
    f32::from_uq(bits, 64)
}

/// Uniform on the open interval `(0, 1)`; safe to take a logarithm of.
#[inline]
pub fn open01_f64(bits: u64) -> f64 {
    f64::from_uq(bits | 1, 64)
}

const LUT_BITS: u32 = 10;

// floor(sqrt(m) * 2^11) for 10-bit m
const SQRT_LUT: [u16; 1 << LUT_BITS] = build_sqrt_lut();

const fn isqrt_const(n: u64) -> u64 {
    let mut lo = 0u64;
    let mut hi = 1u64 << 32;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if mid * mid <= n {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

const fn build_sqrt_lut() -> [u16; 1 << LUT_BITS] {
    let mut table = [0u16; 1 << LUT_BITS];
    let mut m = 0;
    while m < table.len() {
        table[m] = isqrt_const((m as u64) << 22) as u16;
        m += 1;
    }
    table
}

/// Floor square root of a 64-bit word.
///
/// The leading-bit count picks an even shift that leaves a 9-10 bit mantissa,
/// the table supplies its root to about 11 bits, and two divide-and-average
/// steps bring the estimate within one unit. A final adjustment makes the
/// result the exact floor, so it is identical on every platform. Applied to a
/// Q4.60 value it yields a Q2.30 root.
pub fn fixed_sqrt(w: u64) -> u32 {
    if w == 0 {
        return 0;
    }
    let bits = 64 - w.leading_zeros();
    let shift = (bits.saturating_sub(LUT_BITS) + 1) & !1;
    let m = (w >> shift) as usize;
    let seed = SQRT_LUT[m] as u64 + 1;
    let half = shift / 2;
    let mut y = if half >= 11 {
        seed << (half - 11)
    } else {
        seed >> (11 - half)
    }
    .max(1);

    for _ in 0..2 {
        y = (y + w / y) / 2;
    }

    let (w, mut y) = (w as u128, y as u128);
    while y * y > w {
        y -= 1;
    }
    while (y + 1) * (y + 1) <= w {
        y += 1;
    }
    y as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::testing::rng;
    use rand::RngCore;

    #[test]
    fn test_from_q_matches_division() {
        let cases: [(i64, u32); 6] = [
            (1, 30),
            (-1, 30),
            (Q30_ONE, 30),
            (-(3 * Q30_ONE) / 4, 30),
            (123_456_789, 60),
            (i64::MAX, 62),
        ];
        for (v, frac) in cases {
            let expected = v as f64 / (1u128 << frac) as f64;
            let got = f64::from_q(v, frac);
            assert!(
                (got - expected).abs() <= expected.abs() * f64::EPSILON,
                "{v} >> {frac}: {got} vs {expected}"
            );
        }
        assert_eq!(f64::from_q(0, 30), 0.0);
        assert_eq!(f32::from_q(-(Q30_ONE), 30), -1.0);
    }

    #[test]
    fn test_tiny_values_keep_precision() {
        // a 2^-53 output lattice would flush this to zero
        let v = f64::from_uq((1 << 6) + 1, 70);
        assert_eq!(v, 2f64.powi(-64) + 2f64.powi(-70));
    }

    #[test]
    fn test_unit_range() {
        assert_eq!(unit_f64(0), 0.0);
        assert!(unit_f64(u64::MAX) < 1.0);
        assert!(unit_f32(u64::MAX) < 1.0);
        assert!(open01_f64(0) > 0.0);
        assert!(open01_f64(u64::MAX) < 1.0);
    }

    #[test]
    fn test_fixed_sqrt_exact_floor() {
        for w in 0u64..5000 {
            let y = fixed_sqrt(w) as u64;
            assert!(y * y <= w && (y + 1) * (y + 1) > w, "sqrt({w}) = {y}");
        }
        let mut rng = rng(7);
        for _ in 0..10000 {
            let w = rng.next_u64() >> (rng.next_u32() % 64);
            let y = fixed_sqrt(w) as u128;
            assert!(y * y <= w as u128 && (y + 1) * (y + 1) > w as u128);
        }
        assert_eq!(fixed_sqrt(u64::MAX), u32::MAX);
        assert_eq!(fixed_sqrt(Q60_ONE) as i64, Q30_ONE);
    }
}
