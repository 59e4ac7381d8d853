//! Math functions and utilities.

use core::f32::consts::{PI, TAU};

/// Linear interpolation between `a` and `b` with weight `t` in 0...1.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp `x` to 0...1.
#[inline]
pub fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Convert amplitude `amp` to decibels.
#[inline]
pub fn amp_db(amp: f32) -> f32 {
    amp.log10() * 20.0
}

/// Convert decibels `db` to amplitude.
///
/// ### Example
/// ```
/// use pvoc::math::db_amp;
/// assert!((db_amp(20.0) - 10.0).abs() < 1.0e-5);
/// ```
#[inline]
pub fn db_amp(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Wrap `phase` into (-π, π] by repeated addition or subtraction of 2π.
#[inline]
pub fn wrap_phase(mut phase: f32) -> f32 {
    while phase > PI {
        phase -= TAU;
    }
    while phase <= -PI {
        phase += TAU;
    }
    phase
}

/// Round `n` up to the next power of two. Zero rounds to one.
///
/// ### Example
/// ```
/// use pvoc::math::ceil_pow2;
/// assert_eq!(ceil_pow2(1000), 1024);
/// assert_eq!(ceil_pow2(3), 4);
/// assert_eq!(ceil_pow2(256), 256);
/// ```
#[inline]
pub fn ceil_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}
