//! Shared test fixture: one display, one open window, fresh context.

use std::sync::Arc;

use splitsync_common::{Bounds, DisplayDescriptor, TabId, WindowId};
use splitsync_config::schema::SyncDefaults;

use crate::context::SyncContext;
use crate::controller::WindowPairingController;
use crate::host::{MemoryBrowser, MemoryStore};
use crate::propagation::PropagationEngine;
use crate::router::EventRouter;

pub struct Fixture {
    pub browser: Arc<MemoryBrowser>,
    pub store: Arc<MemoryStore>,
    pub ctx: Arc<SyncContext>,
    /// The window open at start, current.
    pub window: WindowId,
    /// Its active tab.
    pub tab: TabId,
}

impl Fixture {
    /// 1920x1080 display with a 25px menu bar.
    pub fn display(left: i32, top: i32, width: i32, height: i32) -> DisplayDescriptor {
        DisplayDescriptor {
            bounds: Bounds::new(left, top, width, height),
            work_area: Bounds::new(left, top + 25, width, height - 25),
        }
    }

    pub async fn new() -> Self {
        let browser = MemoryBrowser::new();
        browser.add_display(Self::display(0, 0, 1920, 1080));
        Self::with_browser(browser).await
    }

    pub async fn without_displays() -> Self {
        Self::with_browser(MemoryBrowser::new()).await
    }

    async fn with_browser(browser: MemoryBrowser) -> Self {
        let (window, tab) = browser.open_window(Bounds::new(200, 100, 1200, 800), "https://x/");
        let browser = Arc::new(browser);
        let store = Arc::new(MemoryStore::new());
        let ctx = SyncContext::new(browser.clone(), store.clone(), &SyncDefaults::default()).await;
        Self {
            browser,
            store,
            ctx: Arc::new(ctx),
            window,
            tab,
        }
    }

    pub fn controller(&self) -> WindowPairingController {
        WindowPairingController::new(self.ctx.clone())
    }

    pub fn engine(&self) -> PropagationEngine {
        PropagationEngine::new(self.ctx.clone())
    }

    pub fn router(&self) -> EventRouter {
        EventRouter::new(self.ctx.clone())
    }

    /// Split the fixture window and return `(left, right)` with their
    /// active tabs, with the call log cleared.
    pub async fn paired(&self) -> ((WindowId, TabId), (WindowId, TabId)) {
        let outcome = self
            .controller()
            .create_split_windows("https://x/")
            .await
            .expect("split");
        let right_tab = self.browser.active_tab(outcome.right).expect("right tab");
        self.browser.clear_log();
        ((outcome.left, self.tab), (outcome.right, right_tab))
    }
}
