use std::path::PathBuf;

use crate::types::WindowId;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failure of a single call into the host browser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("host rejected call: {0}")]
    Rejected(String),

    #[error("host call {method} timed out after {after_ms}ms")]
    Timeout { method: String, after_ms: u64 },

    #[error("host disconnected")]
    Disconnected,

    #[error("malformed host reply: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("no display available")]
    NoDisplay,

    #[error("{0} closed while the split was in flight")]
    StaleWindow(WindowId),

    #[error("{0} is already paired")]
    AlreadyPaired(WindowId),

    #[error("request has no sender window")]
    MissingSender,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
