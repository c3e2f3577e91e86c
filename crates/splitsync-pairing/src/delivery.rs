//! Best-effort message delivery to page contexts.
//!
//! A page that has not loaded its content script (or has navigated to a
//! page where it cannot run) rejects messages. Those failures are expected
//! and are isolated per recipient.

use futures_util::future::join_all;
use splitsync_common::WindowId;
use tracing::{debug, warn};

use crate::host::{BrowserHost, HostResult, TabInfo, TabQuery};
use crate::protocol::PageMessage;

/// The active tab of `window`, if it has one.
pub async fn active_tab(host: &dyn BrowserHost, window: WindowId) -> HostResult<Option<TabInfo>> {
    let tabs = host.query_tabs(TabQuery::active_in(window)).await?;
    Ok(tabs.into_iter().next())
}

/// Send `message` to each tab, concurrently. Returns how many were delivered.
pub async fn deliver_all(host: &dyn BrowserHost, tabs: &[TabInfo], message: &PageMessage) -> usize {
    let results = join_all(tabs.iter().map(|tab| host.send_to_tab(tab.id, message))).await;
    tabs.iter()
        .zip(results)
        .filter(|(tab, result)| match result {
            Ok(()) => true,
            Err(e) => {
                debug!(tab_id = tab.id.0, error = %e, "page message not delivered");
                false
            }
        })
        .count()
}

/// Send `message` to every tab of `window`.
pub async fn notify_window(host: &dyn BrowserHost, window: WindowId, message: &PageMessage) -> usize {
    match host.query_tabs(TabQuery::in_window(window)).await {
        Ok(tabs) => deliver_all(host, &tabs, message).await,
        Err(e) => {
            warn!(window_id = window.0, error = %e, "failed to list tabs for notification");
            0
        }
    }
}

/// Send `message` to the active tab of every window in `windows`.
pub async fn notify_active_tabs(
    host: &dyn BrowserHost,
    windows: &[WindowId],
    message: &PageMessage,
) -> usize {
    let mut tabs = Vec::with_capacity(windows.len());
    for window in windows {
        match active_tab(host, *window).await {
            Ok(Some(tab)) => tabs.push(tab),
            Ok(None) => {}
            Err(e) => debug!(window_id = window.0, error = %e, "no active tab to notify"),
        }
    }
    deliver_all(host, &tabs, message).await
}

/// Send `message` to every open tab.
pub async fn broadcast(host: &dyn BrowserHost, message: &PageMessage) -> usize {
    match host.query_tabs(TabQuery::all()).await {
        Ok(tabs) => deliver_all(host, &tabs, message).await,
        Err(e) => {
            warn!(error = %e, "failed to list tabs for broadcast");
            0
        }
    }
}
