//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

use crate::constants::{SCALAR_MAX, SCALAR_MIN};

/// Round a f64 and clamp it to the u32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).round();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Clamp a probability to `[0, 1]`, mapping NaN to 0.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Clamp a difficulty or quality scalar to the 1..=10 band.
#[must_use]
pub fn clamp_scalar(value: f64) -> f64 {
    if value.is_nan() {
        return SCALAR_MIN;
    }
    value.clamp(SCALAR_MIN, SCALAR_MAX)
}

/// Depth as a non-negative float; negative depths contribute nothing.
#[must_use]
pub fn depth_contribution(depth: i32) -> f64 {
    f64::from(depth.max(0))
}
