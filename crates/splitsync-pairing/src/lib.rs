//! Window pairing and synchronization core for SplitSync.
//!
//! Owns the state that decides which browser windows are paired and how a
//! change in one is mirrored to the other:
//! - `PairRegistry`: symmetric window-to-partner mapping
//! - `WindowPairingController`: side-by-side split creation and teardown
//! - `PropagationEngine`: URL and scroll mirroring with echo suppression
//! - `PreferencesStore` / `OverlayLayoutStore`: persisted user settings
//! - `EventRouter`: single dispatch point for page requests and host events
//!
//! The host browser is reached only through the `BrowserHost` and
//! `KeyValueStore` traits, so the same core runs behind the native
//! messaging bridge or against `MemoryBrowser` in tests (behind the
//! `testing` feature outside this crate).

pub mod context;
pub mod controller;
pub mod delivery;
pub mod display;
pub mod host;
pub mod overlay;
pub mod preferences;
pub mod propagation;
pub mod protocol;
pub mod registry;
pub mod router;

#[cfg(test)]
mod test_support;

pub use context::SyncContext;
pub use controller::{SplitOutcome, SplitTracker, WindowPairingController};
pub use display::{resolve_display, split_layout};
pub use host::{BrowserHost, KeyValueStore};
#[cfg(any(test, feature = "testing"))]
pub use host::{MemoryBrowser, MemoryStore};
pub use overlay::OverlayLayoutStore;
pub use preferences::PreferencesStore;
pub use propagation::{NavigationExpectations, PropagationEngine};
pub use protocol::{HostEvent, MessageSender, PageMessage, Request, Response, SyncState};
pub use registry::{PairRegistry, PairTable};
pub use router::EventRouter;
