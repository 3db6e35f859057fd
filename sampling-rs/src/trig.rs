//! Fixed-point sine and cosine of binary angles.
//!
//! Angles are `u32` turns (a full turn is `2^32`). One odd ninth-order
//! polynomial covers a quarter turn; the other quadrants come from reflecting
//! the argument, swapping sine and cosine, and negating. Max abs error is
//! about 7e-9 over the whole circle.

use crate::fixed::Q30_ONE;

pub const QUARTER_TURN: u32 = 1 << 30;
pub const HALF_TURN: u32 = 1 << 31;

// Minimax fit of sin(pi/2 * t) on [0, 1], odd powers t^1..t^9, Q2.30.
const SIN_COEFFS: [i64; 5] = [1_686_629_674, -693_597_876, 85_564_854, -5_016_766, 161_942];

/// `sin(pi/2 * t)` for `t` in `[0, 1]` given as Q2.30.
#[inline]
fn quarter_sin(t: i64) -> i64 {
    let t2 = (t * t) >> 30;
    let mut p = SIN_COEFFS[4];
    for &c in SIN_COEFFS[..4].iter().rev() {
        p = c + ((p * t2) >> 30);
    }
    ((p * t) >> 30).clamp(0, Q30_ONE)
}

/// Q2.30 `(sin, cos)` of `angle` turns.
pub fn sin_cos_turns(angle: u32) -> (i32, i32) {
    let r = (angle & (QUARTER_TURN - 1)) as i64;
    let near = quarter_sin(r);
    let far = quarter_sin(Q30_ONE - r);
    let (sin, cos) = match angle >> 30 {
        0 => (near, far),
        1 => (far, -near),
        2 => (-near, -far),
        _ => (-far, near),
    };
    (sin as i32, cos as i32)
}
