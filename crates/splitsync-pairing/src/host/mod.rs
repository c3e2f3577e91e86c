//! Host browser abstraction.
//!
//! Every browser API the core needs is a suspension point: the caller
//! yields until the host answers, and other events may be processed in the
//! meantime. Implementations must never panic on host failure; they return
//! `HostError` and let the caller decide whether the failure matters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use splitsync_common::{Bounds, DisplayDescriptor, HostError, TabId, WindowId};

use crate::protocol::PageMessage;

#[cfg(any(test, feature = "testing"))]
mod memory;

#[cfg(any(test, feature = "testing"))]
pub use memory::{MemoryBrowser, MemoryStore};

// Host method names, as used on the native messaging wire.
pub const METHOD_CURRENT_WINDOW: &str = "windows.getCurrent";
pub const METHOD_DISPLAYS: &str = "system.display.getInfo";
pub const METHOD_UPDATE_WINDOW: &str = "windows.update";
pub const METHOD_CREATE_WINDOW: &str = "windows.create";
pub const METHOD_QUERY_TABS: &str = "tabs.query";
pub const METHOD_NAVIGATE_TAB: &str = "tabs.update";
pub const METHOD_SEND_TO_TAB: &str = "tabs.sendMessage";
pub const METHOD_STORAGE_GET: &str = "storage.get";
pub const METHOD_STORAGE_SET: &str = "storage.set";

pub type HostResult<T> = std::result::Result<T, HostError>;

/// Key/value map as stored by the host.
pub type StorageMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum WindowType {
    #[default]
    Normal,
    Popup,
}

/// A browser window as reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    #[serde(flatten)]
    pub bounds: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<WindowState>,
}

/// Geometry update for an existing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowUpdate {
    #[serde(flatten)]
    pub bounds: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<WindowState>,
}

/// Parameters for opening a new window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowCreate {
    pub url: String,
    #[serde(flatten)]
    pub bounds: Bounds,
    pub focused: bool,
    #[serde(rename = "type", default)]
    pub kind: WindowType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    pub window_id: WindowId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub active: bool,
}

/// Tab filter. The default (all `None`) matches every tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl TabQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_window(window_id: WindowId) -> Self {
        Self {
            window_id: Some(window_id),
            active: None,
        }
    }

    pub fn active_in(window_id: WindowId) -> Self {
        Self {
            window_id: Some(window_id),
            active: Some(true),
        }
    }

    pub fn matches(&self, tab: &TabInfo) -> bool {
        self.window_id.map_or(true, |w| w == tab.window_id)
            && self.active.map_or(true, |a| a == tab.active)
    }
}

/// Window, display and tab operations of the host browser.
#[async_trait]
pub trait BrowserHost: Send + Sync {
    /// The window the user is currently working in.
    async fn current_window(&self) -> HostResult<WindowInfo>;

    async fn displays(&self) -> HostResult<Vec<DisplayDescriptor>>;

    async fn update_window(&self, id: WindowId, update: WindowUpdate) -> HostResult<WindowInfo>;

    async fn create_window(&self, create: WindowCreate) -> HostResult<WindowInfo>;

    async fn query_tabs(&self, query: TabQuery) -> HostResult<Vec<TabInfo>>;

    /// Point an existing tab at a new URL.
    async fn navigate_tab(&self, tab: TabId, url: &str) -> HostResult<()>;

    /// Deliver a message to the page running in `tab`. Fails when the page
    /// has no listener.
    async fn send_to_tab(&self, tab: TabId, message: &PageMessage) -> HostResult<()>;
}

/// Persistent key/value storage that survives browser restarts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the given keys. Absent keys are omitted from the result.
    async fn get(&self, keys: &[&str]) -> HostResult<StorageMap>;

    async fn set(&self, items: StorageMap) -> HostResult<()>;
}
