// Quantize - Grid snapping of playback offsets

/// Sixteenth note at 120 BPM
pub const DEFAULT_GRID_MS: f64 = 125.0;

/// Snap `ms` to the nearest multiple of `grid_ms`, floored at 0
///
/// Ties go to the even multiple. A non-positive grid leaves the value
/// unsnapped.
pub fn quantize_ms(ms: f64, grid_ms: f64) -> f64 {
    if grid_ms <= 0.0 || !grid_ms.is_finite() {
        return ms.max(0.0);
    }
    ((ms / grid_ms).round_ties_even() * grid_ms).max(0.0)
}
