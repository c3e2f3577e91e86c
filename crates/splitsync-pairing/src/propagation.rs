//! Propagation engine: mirrors URL changes and scroll positions from a
//! window to its partner.
//!
//! URL echo is suppressed by tagging: before the engine navigates a partner
//! it queues the expected URL for that window, and a change report from the
//! partner that matches a queued URL is consumed instead of propagated back.
//! A navigation whose target already shows the URL is skipped outright, so
//! even an untagged echo converges.
//!
//! Every lookup made before an `.await` is re-checked after it; a pair torn
//! down mid-flight turns the operation into a no-op.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use splitsync_common::{Result, ScrollSample, WindowId};
use tracing::{debug, info};

use crate::context::SyncContext;
use crate::delivery;
use crate::protocol::PageMessage;

// =============================================================================
// NAVIGATION EXPECTATIONS
// =============================================================================

/// Expectations kept per window. The oldest is dropped beyond this.
const MAX_PENDING: usize = 16;

type Pending = HashMap<WindowId, VecDeque<String>>;

/// Navigations the engine itself issued and whose commit has not been
/// reported yet, oldest first per target window.
#[derive(Debug, Default)]
pub struct NavigationExpectations {
    pending: Mutex<Pending>,
}

impl NavigationExpectations {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record that `window` is about to be navigated to `url`.
    pub fn expect(&self, window: WindowId, url: &str) {
        let mut pending = self.lock();
        let queue = pending.entry(window).or_default();
        if queue.len() == MAX_PENDING {
            queue.pop_front();
        }
        queue.push_back(url.to_string());
    }

    /// Returns true when a change report from `window` to `url` is the
    /// result of our own navigation. The matching entry is used up along
    /// with every older one, since those commits were superseded. A report
    /// matching nothing leaves the queue untouched.
    pub fn consume(&self, window: WindowId, url: &str) -> bool {
        let mut pending = self.lock();
        let Some(queue) = pending.get_mut(&window) else {
            return false;
        };
        let Some(pos) = queue.iter().position(|expected| expected == url) else {
            return false;
        };
        queue.drain(..=pos);
        if queue.is_empty() {
            pending.remove(&window);
        }
        true
    }

    /// Drop the newest expectation of `url` for `window`, after the
    /// navigation that recorded it failed.
    pub fn withdraw(&self, window: WindowId, url: &str) {
        let mut pending = self.lock();
        let Some(queue) = pending.get_mut(&window) else {
            return;
        };
        if let Some(pos) = queue.iter().rposition(|expected| expected == url) {
            queue.remove(pos);
        }
        if queue.is_empty() {
            pending.remove(&window);
        }
    }

    pub fn forget(&self, window: WindowId) {
        self.lock().remove(&window);
    }

    pub fn is_expecting(&self, window: WindowId) -> bool {
        self.lock().contains_key(&window)
    }
}

// =============================================================================
// ENGINE
// =============================================================================

#[derive(Clone)]
pub struct PropagationEngine {
    ctx: Arc<SyncContext>,
}

impl PropagationEngine {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self { ctx }
    }

    /// A tab in `source` committed `url`. Navigates the partner's active
    /// tab when URL sync is on and `source` is paired.
    ///
    /// Returns whether a navigation was issued. A failed navigation is an
    /// error; a missing partner or page is not.
    pub async fn handle_url_change(&self, source: WindowId, url: &str) -> Result<bool> {
        if self.ctx.navigations.consume(source, url) {
            debug!(window_id = source.0, url, "own navigation reported back, not propagated");
            return Ok(false);
        }
        if !self.ctx.prefs.is_url_sync_enabled() {
            return Ok(false);
        }
        let Some(partner) = self.ctx.registry.partner_of(source) else {
            return Ok(false);
        };

        let Some(tab) = delivery::active_tab(self.ctx.host.as_ref(), partner).await? else {
            debug!(window_id = source.0, partner = partner.0, "partner has no active tab");
            return Ok(false);
        };

        if self.ctx.registry.partner_of(source) != Some(partner) {
            debug!(window_id = source.0, partner = partner.0, "pair dissolved during lookup");
            return Ok(false);
        }
        if tab.url.as_deref() == Some(url) {
            debug!(window_id = source.0, partner = partner.0, "partner already at url");
            return Ok(false);
        }

        self.ctx.navigations.expect(partner, url);
        if let Err(e) = self.ctx.host.navigate_tab(tab.id, url).await {
            self.ctx.navigations.withdraw(partner, url);
            return Err(e.into());
        }

        info!(
            window_id = source.0,
            partner = partner.0,
            tab_id = tab.id.0,
            url,
            "url propagated"
        );
        Ok(true)
    }

    /// Forward a scroll report from `source` to the partner's active page.
    /// Best-effort: every failure is logged at debug and reported as `false`.
    pub async fn synchronize_scroll(&self, source: WindowId, sample: ScrollSample) -> bool {
        if !self.ctx.prefs.is_scroll_sync_enabled() {
            return false;
        }
        let Some(partner) = self.ctx.registry.partner_of(source) else {
            return false;
        };

        let tab = match delivery::active_tab(self.ctx.host.as_ref(), partner).await {
            Ok(Some(tab)) => tab,
            Ok(None) => return false,
            Err(e) => {
                debug!(partner = partner.0, error = %e, "scroll target lookup failed");
                return false;
            }
        };

        if self.ctx.registry.partner_of(source) != Some(partner) {
            return false;
        }

        match self
            .ctx
            .host
            .send_to_tab(tab.id, &PageMessage::ScrollTo { data: sample })
            .await
        {
            Ok(()) => true,
            Err(e) => {
                debug!(partner = partner.0, tab_id = tab.id.0, error = %e, "scroll not delivered");
                false
            }
        }
    }
}
