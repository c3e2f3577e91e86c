use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Native messaging bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Per-call timeout for requests sent to the extension (valid range: 100-60000).
    pub call_timeout_ms: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 5000,
        }
    }
}

impl HostConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.call_timeout_ms))
    }
}
