//! Configuration validation.
//!
//! Checks every numeric range and collects all violations into a single
//! `ConfigError`.

mod helpers;


use crate::schema::SplitSyncConfig;
use splitsync_common::ConfigError;

use helpers::validate_range;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &SplitSyncConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_range(&mut errors, "scroll.debounce_ms", config.scroll.debounce_ms, 10, 500);
    validate_range(&mut errors, "scroll.guard_ms", config.scroll.guard_ms, 20, 1000);
    validate_range(
        &mut errors,
        "host.call_timeout_ms",
        config.host.call_timeout_ms,
        100,
        60_000,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
