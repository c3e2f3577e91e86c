//! Scroll mirroring timing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing of the per-window scroll agents the host runs on page reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Quiet time after the last local scroll event before a sample is
    /// reported (valid range: 10-500).
    pub debounce_ms: u32,
    /// How long local scroll events are ignored after applying a mirrored
    /// position (valid range: 20-1000).
    pub guard_ms: u32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            guard_ms: 150,
        }
    }
}

impl ScrollConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(u64::from(self.debounce_ms))
    }

    pub fn guard(&self) -> Duration {
        Duration::from_millis(u64::from(self.guard_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        let c = ScrollConfig::default();
        assert_eq!(c.debounce(), Duration::from_millis(50));
        assert_eq!(c.guard(), Duration::from_millis(150));
    }
}
