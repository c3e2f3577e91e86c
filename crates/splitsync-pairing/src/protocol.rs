//! Message types exchanged with page and popup contexts.
//!
//! Messages flow in both directions:
//! - **Page -> core**: `Request`, tagged by `action`, answered with a `Response`.
//! - **Core -> page**: `PageMessage`, fire-and-forget, also tagged by `action`.
//!
//! Host lifecycle notifications arrive separately as `HostEvent`.

use serde::{Deserialize, Serialize};
use splitsync_common::{ScrollSample, TabId, WindowId};

/// The two user-controlled sync flags, as broadcast to pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub url_sync_enabled: bool,
    pub scroll_sync_enabled: bool,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            url_sync_enabled: true,
            scroll_sync_enabled: true,
        }
    }
}

/// Answer to `getUrlSyncState` for one requesting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStateReport {
    pub url_sync_enabled: bool,
    pub scroll_sync_enabled: bool,
    pub is_connected: bool,
    pub show_overlay: bool,
}

/// Saved CSS position of one overlay element. Values are raw CSS lengths
/// such as `"120px"`; `None` means the element was never moved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementPosition {
    #[serde(default)]
    pub left: Option<String>,
    #[serde(default)]
    pub top: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPositions {
    #[serde(default)]
    pub overlay_position: ElementPosition,
    #[serde(default)]
    pub toggle_position: ElementPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayLayout {
    pub overlay_hidden: bool,
    #[serde(default)]
    pub element_positions: Option<ElementPositions>,
}

/// Requests from page, overlay and popup contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    CreateSplitWindows { url: String },
    Scroll { data: ScrollSample },
    ToggleUrlSync { enabled: bool },
    ToggleScrollSync { enabled: bool },
    GetUrlSyncState,
    CloseSyncConnection,
    SetOverlayHidden { hidden: bool },
    SaveElementPositions { positions: ElementPositions },
    GetOverlayLayout,
}

impl Request {
    /// Wire name of the request, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            Request::CreateSplitWindows { .. } => "createSplitWindows",
            Request::Scroll { .. } => "scroll",
            Request::ToggleUrlSync { .. } => "toggleUrlSync",
            Request::ToggleScrollSync { .. } => "toggleScrollSync",
            Request::GetUrlSyncState => "getUrlSyncState",
            Request::CloseSyncConnection => "closeSyncConnection",
            Request::SetOverlayHidden { .. } => "setOverlayHidden",
            Request::SaveElementPositions { .. } => "saveElementPositions",
            Request::GetOverlayLayout => "getOverlayLayout",
        }
    }
}

/// Who sent a request. Popup pages have no tab and no window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSender {
    #[serde(default)]
    pub tab_id: Option<TabId>,
    #[serde(default)]
    pub window_id: Option<WindowId>,
}

impl MessageSender {
    pub fn page(tab_id: TabId, window_id: WindowId) -> Self {
        Self {
            tab_id: Some(tab_id),
            window_id: Some(window_id),
        }
    }

    pub fn popup() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Every request gets exactly one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    State(SyncStateReport),
    Layout(OverlayLayout),
    Ack(Ack),
}

impl Response {
    pub fn ok() -> Self {
        Response::Ack(Ack {
            success: true,
            error: None,
        })
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Response::Ack(Ack {
            success: false,
            error: Some(error.into()),
        })
    }

    pub fn is_success(&self) -> bool {
        match self {
            Response::Ack(ack) => ack.success,
            Response::State(_) | Response::Layout(_) => true,
        }
    }
}

/// Commands and notifications pushed to a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageMessage {
    ScrollTo { data: ScrollSample },
    StateChanged { state: SyncState },
    WindowClosed,
    UpdateOverlayVisibility { show: bool },
    UrlSyncStateChanged { enabled: bool },
}

/// Browser lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HostEvent {
    #[serde(rename_all = "camelCase")]
    WindowRemoved { window_id: WindowId },
    /// A tab committed a change. `url` is present only when the URL changed.
    #[serde(rename_all = "camelCase")]
    TabUpdated {
        tab_id: TabId,
        window_id: WindowId,
        #[serde(default)]
        url: Option<String>,
    },
}
