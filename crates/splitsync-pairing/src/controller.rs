//! Window pairing controller: creates side-by-side pairs and tears them down.
//!
//! A split is a chain of host calls (current window, displays, resize,
//! create). Any of them may be answered after one of the windows involved
//! has closed, so the controller never trusts state read before an
//! `.await`: window-removed events seen while a split is in flight are
//! recorded by `SplitTracker` and checked before the pair is registered.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use splitsync_common::{new_correlation_id, Result, SyncError, WindowId};
use tracing::{debug, info, warn};

use crate::context::SyncContext;
use crate::delivery;
use crate::display::{resolve_display, split_layout};
use crate::host::{WindowCreate, WindowState, WindowType, WindowUpdate};
use crate::protocol::PageMessage;

// =============================================================================
// SPLIT TRACKER
// =============================================================================

#[derive(Debug, Default)]
struct TrackerState {
    in_flight: usize,
    closed: HashSet<WindowId>,
}

/// Records windows closed while at least one split is in flight.
#[derive(Debug, Default)]
pub struct SplitTracker {
    state: Mutex<TrackerState>,
}

impl SplitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark a split as started. The split ends when the guard drops.
    pub fn begin(&self) -> SplitGuard<'_> {
        self.lock().in_flight += 1;
        SplitGuard { tracker: self }
    }

    /// Note that `window` closed. Ignored when no split is running.
    pub fn record_closed(&self, window: WindowId) {
        let mut state = self.lock();
        if state.in_flight > 0 {
            state.closed.insert(window);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }
}

pub struct SplitGuard<'a> {
    tracker: &'a SplitTracker,
}

impl SplitGuard<'_> {
    /// The first of `windows` that closed since the split began, if any.
    pub fn closed_among(&self, windows: &[WindowId]) -> Option<WindowId> {
        let state = self.tracker.lock();
        windows.iter().copied().find(|w| state.closed.contains(w))
    }
}

impl Drop for SplitGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.tracker.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.in_flight == 0 {
            state.closed.clear();
        }
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// The two windows of a freshly registered pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOutcome {
    pub left: WindowId,
    pub right: WindowId,
}

#[derive(Clone)]
pub struct WindowPairingController {
    ctx: Arc<SyncContext>,
}

impl WindowPairingController {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self { ctx }
    }

    /// Move the current window to the left half of its display and open
    /// `url` in a new focused window on the right half, then pair them.
    ///
    /// If the current window is still paired, that pair is closed first.
    /// Nothing is registered unless both windows exist when the host
    /// answers the create call. A window created before a later failure
    /// stays open.
    pub async fn create_split_windows(&self, url: &str) -> Result<SplitOutcome> {
        let split_id = new_correlation_id();
        let guard = self.ctx.splits.begin();
        let host = self.ctx.host.as_ref();

        let current = host.current_window().await?;
        debug!(split_id = %split_id, window_id = current.id.0, url, "split started");

        if self.ctx.registry.is_paired(current.id) {
            info!(
                split_id = %split_id,
                window_id = current.id.0,
                "reconnecting, closing previous pair"
            );
            self.close_sync_connection(current.id).await;
        }

        let displays = host.displays().await?;
        let display = resolve_display(&displays, &current.bounds)?;
        let (left, right) = split_layout(&display.work_area);

        host.update_window(
            current.id,
            WindowUpdate {
                bounds: left,
                state: Some(WindowState::Normal),
            },
        )
        .await?;

        let created = host
            .create_window(WindowCreate {
                url: url.to_string(),
                bounds: right,
                focused: true,
                kind: WindowType::Normal,
            })
            .await?;

        if let Some(closed) = guard.closed_among(&[current.id, created.id]) {
            warn!(
                split_id = %split_id,
                window_id = closed.0,
                "window closed during split, pair not registered"
            );
            return Err(SyncError::StaleWindow(closed));
        }

        if !self.ctx.registry.link(current.id, created.id) {
            let taken = if self.ctx.registry.is_paired(current.id) {
                current.id
            } else {
                created.id
            };
            warn!(
                split_id = %split_id,
                window_id = taken.0,
                "window paired concurrently, split abandoned"
            );
            return Err(SyncError::AlreadyPaired(taken));
        }
        drop(guard);

        let show = PageMessage::UpdateOverlayVisibility { show: true };
        tokio::join!(
            delivery::notify_window(host, current.id, &show),
            delivery::notify_window(host, created.id, &show),
        );

        info!(
            split_id = %split_id,
            window_id = current.id.0,
            partner = created.id.0,
            "split windows paired"
        );
        Ok(SplitOutcome {
            left: current.id,
            right: created.id,
        })
    }

    /// Dissolve the pair containing `window` and tell both sides. Returns
    /// false (and sends nothing) when `window` is not paired.
    pub async fn close_sync_connection(&self, window: WindowId) -> bool {
        let Some((window, partner)) = self.ctx.registry.unlink(window) else {
            debug!(window_id = window.0, "close requested for unpaired window");
            return false;
        };
        self.ctx.navigations.forget(window);
        self.ctx.navigations.forget(partner);

        let host = self.ctx.host.as_ref();
        let (own, other) = tokio::join!(
            delivery::notify_window(host, window, &PageMessage::WindowClosed),
            delivery::notify_window(host, partner, &PageMessage::WindowClosed),
        );
        info!(
            window_id = window.0,
            partner = partner.0,
            delivered = own + other,
            "sync connection closed"
        );
        true
    }

    /// A window closed. Dissolves its pair and notifies only the partner.
    pub async fn handle_window_removed(&self, window: WindowId) -> bool {
        self.ctx.splits.record_closed(window);

        let Some((_, partner)) = self.ctx.registry.unlink(window) else {
            return false;
        };
        self.ctx.navigations.forget(window);
        self.ctx.navigations.forget(partner);

        let delivered =
            delivery::notify_window(self.ctx.host.as_ref(), partner, &PageMessage::WindowClosed)
                .await;
        info!(
            window_id = window.0,
            partner = partner.0,
            delivered,
            "paired window closed"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{METHOD_CREATE_WINDOW, METHOD_DISPLAYS, METHOD_UPDATE_WINDOW};
    use crate::test_support::Fixture;
    use splitsync_common::{Bounds, HostError};

    #[test]
    fn tracker_records_only_while_in_flight() {
        let tracker = SplitTracker::new();
        tracker.record_closed(WindowId(1));
        let guard = tracker.begin();
        assert!(guard.closed_among(&[WindowId(1)]).is_none());
        tracker.record_closed(WindowId(2));
        assert_eq!(guard.closed_among(&[WindowId(1), WindowId(2)]), Some(WindowId(2)));
        drop(guard);
        assert_eq!(tracker.in_flight(), 0);
        let guard = tracker.begin();
        assert!(guard.closed_among(&[WindowId(2)]).is_none());
    }

    #[tokio::test]
    async fn split_lays_out_halves_and_registers_pair() {
        let f = Fixture::new().await;
        let outcome = f.controller().create_split_windows("https://x/").await.unwrap();

        assert_eq!(outcome.left, f.window);
        let left = f.browser.window(outcome.left).unwrap();
        let right = f.browser.window(outcome.right).unwrap();
        assert_eq!(left.bounds, Bounds::new(0, 25, 960, 1055));
        assert_eq!(left.state, Some(WindowState::Normal));
        assert_eq!(right.bounds, Bounds::new(960, 25, 960, 1055));

        assert_eq!(f.ctx.registry.partner_of(outcome.left), Some(outcome.right));
        assert_eq!(f.ctx.registry.partner_of(outcome.right), Some(outcome.left));
        assert_eq!(f.ctx.registry.pairs(), vec![(outcome.left, outcome.right)]);
    }

    #[tokio::test]
    async fn split_shows_overlay_on_both_sides() {
        let f = Fixture::new().await;
        let outcome = f.controller().create_split_windows("https://x/").await.unwrap();
        let right_tab = f.browser.active_tab(outcome.right).unwrap();

        let show = PageMessage::UpdateOverlayVisibility { show: true };
        assert_eq!(f.browser.deliveries_to(f.tab), vec![show.clone()]);
        assert_eq!(f.browser.deliveries_to(right_tab), vec![show]);
        assert!(f.ctx.registry.shows_overlay(outcome.left));
        assert!(f.ctx.registry.shows_overlay(outcome.right));
    }

    #[tokio::test]
    async fn split_uses_display_under_window_center() {
        let f = Fixture::new().await;
        f.browser.add_display(Fixture::display(1920, 0, 1366, 768));
        let moved = f.browser.open_window(Bounds::new(2100, 100, 800, 500), "https://m/").0;
        f.browser.set_current(moved);

        let outcome = f.controller().create_split_windows("https://x/").await.unwrap();
        let right = f.browser.window(outcome.right).unwrap();
        assert_eq!(right.bounds, Bounds::new(1920 + 683, 25, 683, 743));
    }

    #[tokio::test]
    async fn no_display_aborts_before_any_window_change() {
        let f = Fixture::without_displays().await;
        let err = f.controller().create_split_windows("https://x/").await.unwrap_err();
        assert!(matches!(err, SyncError::NoDisplay));
        assert_eq!(f.browser.call_count(METHOD_UPDATE_WINDOW), 0);
        assert_eq!(f.browser.call_count(METHOD_CREATE_WINDOW), 0);
        assert_eq!(f.ctx.registry.pair_count(), 0);
    }

    #[tokio::test]
    async fn host_rejection_leaves_registry_empty() {
        let f = Fixture::new().await;
        f.browser.fail(METHOD_CREATE_WINDOW);
        let err = f.controller().create_split_windows("https://x/").await.unwrap_err();
        assert!(matches!(err, SyncError::Host(HostError::Rejected(_))));
        assert_eq!(f.ctx.registry.pair_count(), 0);
        assert!(!f.ctx.registry.is_paired(f.window));

        let f = Fixture::new().await;
        f.browser.fail(METHOD_DISPLAYS);
        assert!(f.controller().create_split_windows("https://x/").await.is_err());
        assert_eq!(f.ctx.registry.pair_count(), 0);
    }

    #[tokio::test]
    async fn window_closed_mid_split_is_not_registered() {
        let f = Fixture::new().await;
        let release = f.browser.hold_next_create();

        let controller = f.controller();
        let split = tokio::spawn(async move { controller.create_split_windows("https://x/").await });

        while f.browser.call_count(METHOD_CREATE_WINDOW) == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(f.ctx.splits.in_flight(), 1);
        f.browser.close_window(f.window);
        f.controller().handle_window_removed(f.window).await;
        let _ = release.send(());

        let err = split.await.unwrap().unwrap_err();
        assert!(matches!(err, SyncError::StaleWindow(w) if w == f.window));
        assert_eq!(f.ctx.registry.pair_count(), 0);
        assert_eq!(f.ctx.splits.in_flight(), 0);
    }

    #[tokio::test]
    async fn reconnect_replaces_existing_pair() {
        let f = Fixture::new().await;
        let first = f.controller().create_split_windows("https://x/").await.unwrap();
        let old_right_tab = f.browser.active_tab(first.right).unwrap();
        f.browser.set_current(first.left);
        f.browser.clear_log();

        let second = f.controller().create_split_windows("https://x/").await.unwrap();
        assert_eq!(second.left, first.left);
        assert_ne!(second.right, first.right);
        assert!(!f.ctx.registry.is_paired(first.right));
        assert_eq!(f.ctx.registry.pair_count(), 1);
        assert_eq!(
            f.browser.deliveries_to(old_right_tab),
            vec![PageMessage::WindowClosed]
        );
    }

    #[tokio::test]
    async fn close_notifies_both_and_removes_both_directions() {
        let f = Fixture::new().await;
        let outcome = f.controller().create_split_windows("https://x/").await.unwrap();
        let right_tab = f.browser.active_tab(outcome.right).unwrap();
        f.browser.clear_log();

        assert!(f.controller().close_sync_connection(outcome.right).await);
        assert!(!f.ctx.registry.is_paired(outcome.left));
        assert!(!f.ctx.registry.is_paired(outcome.right));
        assert!(!f.ctx.registry.shows_overlay(outcome.left));
        assert_eq!(f.browser.deliveries_to(f.tab), vec![PageMessage::WindowClosed]);
        assert_eq!(f.browser.deliveries_to(right_tab), vec![PageMessage::WindowClosed]);
    }

    #[tokio::test]
    async fn close_on_unpaired_window_is_noop() {
        let f = Fixture::new().await;
        assert!(!f.controller().close_sync_connection(f.window).await);
        assert!(f.browser.deliveries().is_empty());
        assert_eq!(f.ctx.registry.pair_count(), 0);
    }

    #[tokio::test]
    async fn close_survives_unreachable_side() {
        let f = Fixture::new().await;
        let outcome = f.controller().create_split_windows("https://x/").await.unwrap();
        let right_tab = f.browser.active_tab(outcome.right).unwrap();
        f.browser.make_unreachable(f.tab);
        f.browser.clear_log();

        assert!(f.controller().close_sync_connection(outcome.left).await);
        assert_eq!(f.ctx.registry.pair_count(), 0);
        assert_eq!(f.browser.deliveries_to(right_tab), vec![PageMessage::WindowClosed]);
    }

    #[tokio::test]
    async fn removed_window_is_not_messaged() {
        let f = Fixture::new().await;
        let outcome = f.controller().create_split_windows("https://x/").await.unwrap();
        let right_tab = f.browser.active_tab(outcome.right).unwrap();
        f.browser.clear_log();

        assert!(f.controller().handle_window_removed(outcome.left).await);
        assert!(f.browser.deliveries_to(f.tab).is_empty());
        assert_eq!(f.browser.deliveries_to(right_tab), vec![PageMessage::WindowClosed]);
        assert!(!f.ctx.registry.is_paired(outcome.right));
    }
}
