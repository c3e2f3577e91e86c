//! Reading `config.toml` into a `SplitSyncConfig`.

use std::io;
use std::path::Path;

use splitsync_common::ConfigError;
use tracing::{debug, info, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::SplitSyncConfig;
use crate::validation;

/// Parse the file at `path`. Fields it leaves out keep their defaults.
///
/// Range problems are only logged here so a caller can still inspect what
/// the user wrote; `crate::load_config` rejects them.
pub fn load_from_path(path: &Path) -> Result<SplitSyncConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("{}: {e}", path.display())),
    })?;

    let config: SplitSyncConfig = toml::from_str(&text)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), error = %e, "config values out of range");
    }
    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Parse the config under the user's config directory. On first run the
/// commented template is written there and the defaults are returned.
pub fn load_default() -> Result<SplitSyncConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(&path)?;
            info!(path = %path.display(), "wrote default config");
            Ok(SplitSyncConfig::default())
        }
        loaded => loaded,
    }
}
