pub mod errors;
pub mod id;
pub mod scroll;
pub mod types;

pub use errors::{ConfigError, HostError, SyncError};
pub use id::new_correlation_id;
pub use scroll::ScrollSample;
pub use types::{Bounds, DisplayDescriptor, TabId, WindowId};

pub type Result<T> = std::result::Result<T, SyncError>;
