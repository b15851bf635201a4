//! Decibel/gain conversions with a fixed silence floor.
//!
//! Every conversion in the workbench goes through these helpers so that
//! silence maps to the same finite floor everywhere instead of `-inf`.

/// Level treated as silence, in dB
pub const MINUS_INFINITY_DB: f32 = -100.0;

/// Convert a linear gain to decibels, floored at [`MINUS_INFINITY_DB`]
///
/// Zero and negative gains map to the floor.
#[inline]
pub fn gain_to_decibels(gain: f32) -> f32 {
    if gain > 0.0 {
        (20.0 * gain.log10()).max(MINUS_INFINITY_DB)
    } else {
        MINUS_INFINITY_DB
    }
}

/// Convert decibels to a linear gain; anything at or below the floor is 0
#[inline]
pub fn decibels_to_gain(db: f32) -> f32 {
    if db > MINUS_INFINITY_DB {
        10.0_f32.powf(db * 0.05)
    } else {
        0.0
    }
}

/// Convert a power quantity (mean square) to decibels, floored at [`MINUS_INFINITY_DB`]
#[inline]
pub fn power_to_decibels(power: f64) -> f64 {
    if power > 0.0 {
        (10.0 * power.log10()).max(f64::from(MINUS_INFINITY_DB))
    } else {
        f64::from(MINUS_INFINITY_DB)
    }
}
