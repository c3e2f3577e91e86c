//! Event router: the single entry point for page requests and host events.
//!
//! Every request gets exactly one `Response`. Handler errors are logged
//! and turned into `{success: false, error}`; they never escape the router.

use std::sync::Arc;

use splitsync_common::{Result, SyncError, WindowId};

use crate::context::SyncContext;
use crate::controller::WindowPairingController;
use crate::delivery;
use crate::propagation::PropagationEngine;
use crate::protocol::{HostEvent, MessageSender, PageMessage, Request, Response, SyncStateReport};


#[derive(Clone)]
pub struct EventRouter {
    ctx: Arc<SyncContext>,
    controller: WindowPairingController,
    propagation: PropagationEngine,
}

impl EventRouter {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self {
            controller: WindowPairingController::new(ctx.clone()),
            propagation: PropagationEngine::new(ctx.clone()),
            ctx,
        }
    }

    pub fn context(&self) -> &Arc<SyncContext> {
        &self.ctx
    }

    // =========================================================================
    // REQUESTS
    // =========================================================================

    /// Handle one request from a page, overlay or popup context.
    pub async fn handle_request(&self, sender: &MessageSender, request: Request) -> Response {
        let action = request.action();
        tracing::debug!(
            action,
            window_id = sender.window_id.map(|w| w.0),
            tab_id = sender.tab_id.map(|t| t.0),
            "request dispatched"
        );

        match self.dispatch(sender, request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(action, error = %e, "request failed");
                Response::failed(e.to_string())
            }
        }
    }

    async fn dispatch(&self, sender: &MessageSender, request: Request) -> Result<Response> {
        match request {
            Request::CreateSplitWindows { url } => {
                self.controller.create_split_windows(&url).await?;
                Ok(Response::ok())
            }
            Request::Scroll { data } => {
                let window = sender_window(sender)?;
                self.propagation.synchronize_scroll(window, data).await;
                Ok(Response::ok())
            }
            Request::ToggleUrlSync { enabled } => {
                self.ctx.prefs.set_url_sync(enabled).await?;
                let paired = self.ctx.registry.paired_windows();
                delivery::notify_active_tabs(
                    self.ctx.host.as_ref(),
                    &paired,
                    &PageMessage::UrlSyncStateChanged { enabled },
                )
                .await;
                Ok(Response::ok())
            }
            Request::ToggleScrollSync { enabled } => {
                self.ctx.prefs.set_scroll_sync(enabled).await?;
                Ok(Response::ok())
            }
            Request::GetUrlSyncState => Ok(Response::State(self.state_report(sender))),
            Request::CloseSyncConnection => {
                let window = sender_window(sender)?;
                self.controller.close_sync_connection(window).await;
                Ok(Response::ok())
            }
            Request::SetOverlayHidden { hidden } => {
                self.ctx.layout.set_hidden(hidden).await?;
                Ok(Response::ok())
            }
            Request::SaveElementPositions { positions } => {
                self.ctx.layout.save_positions(positions).await?;
                Ok(Response::ok())
            }
            Request::GetOverlayLayout => Ok(Response::Layout(self.ctx.layout.layout().await?)),
        }
    }

    /// Flags plus pairing status of the requesting window. A sender with no
    /// window (the popup) is never connected.
    fn state_report(&self, sender: &MessageSender) -> SyncStateReport {
        let prefs = self.ctx.prefs.snapshot();
        let (is_connected, show_overlay) = match sender.window_id {
            Some(w) => (
                self.ctx.registry.is_paired(w),
                self.ctx.registry.shows_overlay(w),
            ),
            None => (false, false),
        };
        SyncStateReport {
            url_sync_enabled: prefs.url_sync_enabled,
            scroll_sync_enabled: prefs.scroll_sync_enabled,
            is_connected,
            show_overlay,
        }
    }

    // =========================================================================
    // HOST EVENTS
    // =========================================================================

    pub async fn handle_host_event(&self, event: HostEvent) {
        match event {
            HostEvent::WindowRemoved { window_id } => {
                self.controller.handle_window_removed(window_id).await;
            }
            HostEvent::TabUpdated {
                tab_id,
                window_id,
                url: Some(url),
            } => {
                if let Err(e) = self.propagation.handle_url_change(window_id, &url).await {
                    tracing::warn!(
                        window_id = window_id.0,
                        tab_id = tab_id.0,
                        error = %e,
                        "url propagation failed"
                    );
                }
            }
            HostEvent::TabUpdated { url: None, .. } => {}
        }
    }
}

fn sender_window(sender: &MessageSender) -> Result<WindowId> {
    sender.window_id.ok_or(SyncError::MissingSender)
}
