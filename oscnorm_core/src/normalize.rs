//! Clamped linear remapping of a channel's window mean into its configured
//! output range.

use crate::calibration::DynamicRange;
use crate::registry::{Channel, ChannelRegistry};

/// Map `value` from `[in_min, in_max]` to `[out_min, out_max]`, clamped.
///
/// The position within the input domain is clamped to `[0, 1]` before
/// interpolating, so out-of-domain inputs land on the nearer output bound.
/// A degenerate domain (`in_min == in_max`) yields `out_min`.
#[inline]
pub fn map_range_clamped(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let span = in_max - in_min;
    if span == 0.0 || !span.is_finite() {
        return out_min;
    }
    let pct = ((value - in_min) / span).clamp(0.0, 1.0);
    if pct.is_nan() {
        return out_min;
    }
    out_min + (out_max - out_min) * pct
}

impl Channel {
    /// Window mean, with an empty window reading as 0.0.
    pub fn mean(&self) -> f32 {
        self.window.mean().unwrap_or(0.0)
    }

    /// Window mean remapped from the dynamic range into the static range.
    pub fn normalized(&self) -> f32 {
        let DynamicRange { min, max } = self.range;
        map_range_clamped(
            self.mean(),
            min,
            max,
            self.config.static_min,
            self.config.static_max,
        )
    }
}

impl ChannelRegistry {
    /// Raw window mean for `command`; 0.0 for unknown commands or empty windows.
    pub fn computed_data(&self, command: &str) -> f32 {
        self.get(command).map_or(0.0, Channel::mean)
    }

    /// Normalized output for `command`; 0.0 (with a warning) if unknown.
    pub fn normalized_computed_data(&self, command: &str) -> f32 {
        match self.get(command) {
            Some(ch) => ch.normalized(),
            None => {
                tracing::warn!(command, "normalize requested for unknown channel");
                0.0
            }
        }
    }
}
