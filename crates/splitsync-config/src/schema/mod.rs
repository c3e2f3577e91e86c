//! Configuration schema types for SplitSync.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod host;
mod scroll;
mod sync;
mod system;

pub use host::*;
pub use scroll::*;
pub use sync::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for the SplitSync native host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct SplitSyncConfig {
    pub sync: SyncDefaults,
    pub scroll: ScrollConfig,
    pub host: HostConfig,
    pub logging: LoggingConfig,
}
