//! SplitSync configuration system.
//!
//! TOML-based configuration for the native host: sync defaults, scroll
//! timing, host-call timeouts and logging. All sections use serde defaults
//! so a partial (or missing) config file works out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use splitsync_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! let json = config_to_json(&config);
//! println!("{json}");
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{SplitSyncConfig, CONFIG_SCHEMA_VERSION};

use splitsync_common::ConfigError;

/// Load config from the platform default path, creating a commented
/// default file if none exists, then validate it.
pub fn load_config() -> Result<SplitSyncConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &SplitSyncConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let config = SplitSyncConfig::default();
        let json = config_to_json(&config);
        assert!(json.contains("\"sync\""));
        assert!(json.contains("\"scroll\""));
        assert!(json.contains("\"host\""));
        assert!(json.contains("\"logging\""));
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let config = SplitSyncConfig::default();
        let json = config_to_json(&config);
        let parsed: SplitSyncConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.scroll.debounce_ms, 50);
        assert_eq!(parsed.scroll.guard_ms, 150);
        assert!(parsed.sync.url_sync_default);
    }
}
