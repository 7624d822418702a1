//! Dynamic min/max calibration.
//!
//! A calibration message snapshots the channel's current window mean as the new
//! lower or upper bound of the input domain. Inverted ranges are reported but
//! kept as-is.

use crate::registry::ChannelRegistry;

pub const DEFAULT_DYNAMIC_MIN: f32 = 0.0;
pub const DEFAULT_DYNAMIC_MAX: f32 = 4096.0;

/// Returned by min/max lookups for commands that are not registered.
pub const UNKNOWN_CHANNEL_SENTINEL: f32 = -1.0;

/// Observed input domain of a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicRange {
    pub min: f32,
    pub max: f32,
}

impl Default for DynamicRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_DYNAMIC_MIN,
            max: DEFAULT_DYNAMIC_MAX,
        }
    }
}

impl DynamicRange {
    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }
}

impl ChannelRegistry {
    /// Store the current mean as `command`'s dynamic minimum.
    ///
    /// Returns the stored value, or `None` if the command is unknown.
    pub fn set_min(&mut self, command: &str) -> Option<f32> {
        let ch = self.get_mut(command)?;
        let v = ch.mean();
        ch.range.min = v;
        tracing::info!(command, value = v, "setting minimum value");
        if v >= self.max_value(command) {
            tracing::warn!(command, value = v, "minimum value is greater than maximum value");
        }
        Some(v)
    }

    /// Store the current mean as `command`'s dynamic maximum.
    pub fn set_max(&mut self, command: &str) -> Option<f32> {
        let ch = self.get_mut(command)?;
        let v = ch.mean();
        ch.range.max = v;
        tracing::info!(command, value = v, "setting maximum value");
        if v <= self.min_value(command) {
            tracing::warn!(command, value = v, "maximum value is less than minimum value");
        }
        Some(v)
    }

    /// Dynamic minimum, or [`UNKNOWN_CHANNEL_SENTINEL`] with a warning.
    pub fn min_value(&self, command: &str) -> f32 {
        match self.get(command) {
            Some(ch) => ch.range.min,
            None => {
                tracing::warn!(command, "no data with base address found");
                UNKNOWN_CHANNEL_SENTINEL
            }
        }
    }

    /// Dynamic maximum, or [`UNKNOWN_CHANNEL_SENTINEL`] logged at error level.
    pub fn max_value(&self, command: &str) -> f32 {
        match self.get(command) {
            Some(ch) => ch.range.max,
            None => {
                tracing::error!(command, "no data with base address found");
                UNKNOWN_CHANNEL_SENTINEL
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ChannelConfig;

    fn registry() -> ChannelRegistry {
        let mut reg = ChannelRegistry::new(10);
        reg.insert(ChannelConfig::new(
            "Volume", "/vol/data", "/vol/min", "/vol/max", 0.0, 100.0,
        ));
        reg
    }

    #[test]
    fn defaults() {
        let reg = registry();
        assert_eq!(reg.min_value("Volume"), 0.0);
        assert_eq!(reg.max_value("Volume"), 4096.0);
    }

    #[test]
    fn set_min_uses_window_mean() {
        let mut reg = registry();
        for v in [400, 600] {
            reg.push_sample("Volume", v);
        }
        assert_eq!(reg.set_min("Volume"), Some(500.0));
        assert_eq!(reg.min_value("Volume"), 500.0);
        assert_eq!(reg.max_value("Volume"), 4096.0);
    }

    #[test]
    fn inverted_range_is_kept() {
        let mut reg = registry();
        reg.push_sample("Volume", 5000);
        assert_eq!(reg.set_min("Volume"), Some(5000.0));
        let r = reg.get("Volume").unwrap().range();
        assert!(r.is_inverted());
        assert_eq!(r.min, 5000.0);
    }

    #[test]
    fn empty_window_calibrates_to_zero() {
        let mut reg = registry();
        assert_eq!(reg.set_max("Volume"), Some(0.0));
        assert!(reg.get("Volume").unwrap().range().is_degenerate());
    }

    #[test]
    fn unknown_channel_sentinels() {
        let mut reg = registry();
        assert_eq!(reg.min_value("Unknown"), -1.0);
        assert_eq!(reg.max_value("Unknown"), -1.0);
        assert_eq!(reg.set_min("Unknown"), None);
        assert_eq!(reg.set_max("Unknown"), None);
    }
}
