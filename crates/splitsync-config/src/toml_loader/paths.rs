//! Where the config file lives, and seeding it from the template.

use std::path::{Path, PathBuf};

use splitsync_common::ConfigError;

use super::template::default_config_toml;

const APP_DIR: &str = "splitsync";
const FILE_NAME: &str = "config.toml";

/// `<config dir>/splitsync/config.toml`, e.g. `~/.config/splitsync/config.toml`
/// on Linux.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
        .ok_or_else(|| ConfigError::ParseError("no user config directory on this platform".into()))
}

/// Write the commented template to `path`, creating parent directories.
/// An existing file is overwritten.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let write = || -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, default_config_toml())
    };
    write().map_err(|e| ConfigError::ParseError(format!("cannot write {}: {e}", path.display())))
}
