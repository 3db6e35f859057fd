//! Rejection-sampled points inside the unit disk and ball.
//!
//! Coordinates come from 31-bit fields of a 64-bit draw used like a float
//! mantissa: the field is offset so its lattice covers `(-1, 1]` in Q2.30. The
//! all-ones field is the exact boundary `+1`; an auxiliary bit gives it a
//! random sign, so `-1` and `+1` are equally likely and no direction is
//! favoured. Points outside the unit circle/sphere, and the origin, are
//! redrawn.

use crate::{
    BitSource,
    fixed::{FixedFloat, Q30_ONE, Q60_ONE},
    range::coin,
};

const FIELD_MAX: u64 = (1 << 31) - 1;

/// A disk point in Q2.30 with its Q4.60 squared radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DiskPoint {
    pub u: i32,
    pub v: i32,
    pub s: u64,
}

#[inline]
fn coordinate<B: BitSource + ?Sized>(field: u64, src: &mut B) -> i32 {
    if field == FIELD_MAX {
        return if coin(src) {
            Q30_ONE as i32
        } else {
            -(Q30_ONE as i32)
        };
    }
    (field as i64 - (Q30_ONE - 1)) as i32
}

#[inline]
fn square(c: i32) -> u64 {
    (c as i64 * c as i64) as u64
}

/// One 64-bit draw per attempt, about 1.27 attempts on average.
pub(crate) fn disk_q30<B: BitSource + ?Sized>(src: &mut B) -> DiskPoint {
    loop {
        let bits = src.next64();
        let u = coordinate(bits >> 33, src);
        let v = coordinate((bits >> 2) & FIELD_MAX, src);
        let s = square(u) + square(v);
        if s != 0 && s <= Q60_ONE {
            return DiskPoint { u, v, s };
        }
    }
}

/// Two 64-bit draws per attempt, about 1.91 attempts on average.
pub(crate) fn ball_q30<B: BitSource + ?Sized>(src: &mut B) -> ([i32; 3], u64) {
    loop {
        let a = src.next64();
        let b = src.next64();
        let p = [
            coordinate(a >> 33, src),
            coordinate((a >> 2) & FIELD_MAX, src),
            coordinate(b >> 33, src),
        ];
        let s = p.iter().map(|&c| square(c)).sum::<u64>();
        if s != 0 && s <= Q60_ONE {
            return (p, s);
        }
    }
}

/// Uniform point in the unit disk.
pub fn in_disk<F: FixedFloat, B: BitSource + ?Sized>(src: &mut B) -> [F; 2] {
    let p = disk_q30(src);
    [F::from_q(p.u as i64, 30), F::from_q(p.v as i64, 30)]
}

/// Uniform point in the unit ball.
pub fn in_ball<F: FixedFloat, B: BitSource + ?Sized>(src: &mut B) -> [F; 3] {
    let (p, _) = ball_q30(src);
    p.map(|c| F::from_q(c as i64, 30))
}
