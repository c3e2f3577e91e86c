//! Sync preference defaults.

use serde::{Deserialize, Serialize};

/// Initial preference values used when persisted storage has no flag yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncDefaults {
    pub url_sync_default: bool,
    pub scroll_sync_default: bool,
}

impl Default for SyncDefaults {
    fn default() -> Self {
        Self {
            url_sync_default: true,
            scroll_sync_default: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_flags_default_on() {
        let d = SyncDefaults::default();
        assert!(d.url_sync_default);
        assert!(d.scroll_sync_default);
    }

    #[test]
    fn partial_toml() {
        let d: SyncDefaults = toml::from_str("scroll_sync_default = false").unwrap();
        assert!(d.url_sync_default);
        assert!(!d.scroll_sync_default);
    }
}
