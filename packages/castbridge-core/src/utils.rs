//! General utilities shared across the crate.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock is before the Unix epoch (shouldn't happen in practice).
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Converts a UI volume percentage into the normalized `[0.0, 1.0]` range.
///
/// Out-of-range values are clamped; NaN maps to silence.
#[must_use]
pub fn normalize_volume(percent: f64) -> f32 {
    if percent.is_nan() {
        return 0.0;
    }
    (percent.clamp(0.0, 100.0) / 100.0) as f32
}
