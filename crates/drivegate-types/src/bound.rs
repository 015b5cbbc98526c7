// ─────────────────────────────────────────────────────────────────────
// Drivegate — Bound/Clip Utility
// ─────────────────────────────────────────────────────────────────────

/// Clamp `value` into `[low, high]`.
///
/// Requires `low <= high`; a violated precondition is a programming
/// error, not a runtime-recoverable condition, and panics. NaN inputs
/// are rejected upstream by the arbiter before any clipping happens.
#[inline]
pub fn clip(value: f64, low: f64, high: f64) -> f64 {
    assert!(low <= high, "clip: low {low} > high {high}");
    value.clamp(low, high)
}
