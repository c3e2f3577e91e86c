//! In-memory host implementations.
//!
//! `MemoryBrowser` keeps a small model of windows, tabs and displays and
//! records every call made against it, so callers can assert on exactly
//! which navigations and page messages were issued. Individual methods can
//! be made to fail, and window creation can be held open to interleave
//! other events with an in-flight split.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use splitsync_common::{Bounds, DisplayDescriptor, HostError, TabId, WindowId};
use tokio::sync::oneshot;

use super::{
    BrowserHost, HostResult, KeyValueStore, StorageMap, TabInfo, TabQuery, WindowCreate,
    WindowInfo, WindowState, WindowUpdate, METHOD_CREATE_WINDOW, METHOD_CURRENT_WINDOW,
    METHOD_DISPLAYS, METHOD_NAVIGATE_TAB, METHOD_QUERY_TABS, METHOD_SEND_TO_TAB,
    METHOD_STORAGE_SET, METHOD_UPDATE_WINDOW,
};
use crate::protocol::PageMessage;

#[derive(Default)]
struct BrowserState {
    windows: BTreeMap<WindowId, WindowInfo>,
    tabs: Vec<TabInfo>,
    displays: Vec<DisplayDescriptor>,
    current: Option<WindowId>,
    next_window: i64,
    next_tab: i64,
    calls: Vec<&'static str>,
    navigations: Vec<(TabId, String)>,
    deliveries: Vec<(TabId, PageMessage)>,
    failing: HashSet<&'static str>,
    unreachable: HashSet<TabId>,
    create_gate: Option<oneshot::Receiver<()>>,
}

pub struct MemoryBrowser {
    state: Mutex<BrowserState>,
}

impl Default for MemoryBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBrowser {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BrowserState {
                next_window: 1,
                next_tab: 100,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BrowserState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_display(&self, display: DisplayDescriptor) {
        self.lock().displays.push(display);
    }

    /// Open a window with a single active tab at `url`. The first window
    /// opened becomes the current one.
    pub fn open_window(&self, bounds: Bounds, url: &str) -> (WindowId, TabId) {
        let mut state = self.lock();
        let (window, tab) = state.open(bounds, url);
        if state.current.is_none() {
            state.current = Some(window);
        }
        (window, tab)
    }

    /// Add a background tab to an existing window.
    pub fn open_tab(&self, window: WindowId, url: &str) -> TabId {
        let mut state = self.lock();
        let tab = TabId(state.next_tab);
        state.next_tab += 1;
        state.tabs.push(TabInfo {
            id: tab,
            window_id: window,
            url: Some(url.to_string()),
            active: false,
        });
        tab
    }

    pub fn set_current(&self, window: WindowId) {
        self.lock().current = Some(window);
    }

    /// Remove a window and its tabs, as if the user closed it.
    pub fn close_window(&self, window: WindowId) {
        let mut state = self.lock();
        state.windows.remove(&window);
        state.tabs.retain(|t| t.window_id != window);
        if state.current == Some(window) {
            state.current = None;
        }
    }

    /// Make every call to `method` fail with `HostError::Rejected`.
    pub fn fail(&self, method: &'static str) {
        self.lock().failing.insert(method);
    }

    /// Make messages to `tab` fail as if the page had no listener.
    pub fn make_unreachable(&self, tab: TabId) {
        self.lock().unreachable.insert(tab);
    }

    /// Hold the next `create_window` call until the returned sender fires
    /// (or is dropped).
    pub fn hold_next_create(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().create_gate = Some(rx);
        tx
    }

    pub fn window(&self, window: WindowId) -> Option<WindowInfo> {
        self.lock().windows.get(&window).cloned()
    }

    pub fn tab(&self, tab: TabId) -> Option<TabInfo> {
        self.lock().tabs.iter().find(|t| t.id == tab).cloned()
    }

    pub fn active_tab(&self, window: WindowId) -> Option<TabId> {
        self.lock()
            .tabs
            .iter()
            .find(|t| t.window_id == window && t.active)
            .map(|t| t.id)
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.lock().calls.iter().filter(|m| **m == method).count()
    }

    pub fn navigations(&self) -> Vec<(TabId, String)> {
        self.lock().navigations.clone()
    }

    pub fn deliveries(&self) -> Vec<(TabId, PageMessage)> {
        self.lock().deliveries.clone()
    }

    pub fn deliveries_to(&self, tab: TabId) -> Vec<PageMessage> {
        self.lock()
            .deliveries
            .iter()
            .filter(|(t, _)| *t == tab)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Forget recorded calls, navigations and deliveries.
    pub fn clear_log(&self) {
        let mut state = self.lock();
        state.calls.clear();
        state.navigations.clear();
        state.deliveries.clear();
    }

    fn enter(&self, method: &'static str) -> HostResult<MutexGuard<'_, BrowserState>> {
        let mut state = self.lock();
        state.calls.push(method);
        if state.failing.contains(method) {
            return Err(HostError::Rejected(format!("{method} failed")));
        }
        Ok(state)
    }
}

impl BrowserState {
    fn open(&mut self, bounds: Bounds, url: &str) -> (WindowId, TabId) {
        let window = WindowId(self.next_window);
        self.next_window += 1;
        let tab = TabId(self.next_tab);
        self.next_tab += 1;
        self.windows.insert(
            window,
            WindowInfo {
                id: window,
                bounds,
                state: Some(WindowState::Normal),
            },
        );
        self.tabs.push(TabInfo {
            id: tab,
            window_id: window,
            url: Some(url.to_string()),
            active: true,
        });
        (window, tab)
    }
}

fn no_window(window: WindowId) -> HostError {
    HostError::Rejected(format!("No window with id: {}.", window.0))
}

fn no_tab(tab: TabId) -> HostError {
    HostError::Rejected(format!("No tab with id: {}.", tab.0))
}

#[async_trait]
impl BrowserHost for MemoryBrowser {
    async fn current_window(&self) -> HostResult<WindowInfo> {
        let state = self.enter(METHOD_CURRENT_WINDOW)?;
        state
            .current
            .and_then(|w| state.windows.get(&w).cloned())
            .ok_or_else(|| HostError::Rejected("No current window".into()))
    }

    async fn displays(&self) -> HostResult<Vec<DisplayDescriptor>> {
        Ok(self.enter(METHOD_DISPLAYS)?.displays.clone())
    }

    async fn update_window(&self, id: WindowId, update: WindowUpdate) -> HostResult<WindowInfo> {
        let mut state = self.enter(METHOD_UPDATE_WINDOW)?;
        let info = state.windows.get_mut(&id).ok_or_else(|| no_window(id))?;
        info.bounds = update.bounds;
        if update.state.is_some() {
            info.state = update.state;
        }
        Ok(info.clone())
    }

    async fn create_window(&self, create: WindowCreate) -> HostResult<WindowInfo> {
        let gate = {
            let mut state = self.enter(METHOD_CREATE_WINDOW)?;
            state.create_gate.take()
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let mut state = self.lock();
        let (window, _) = state.open(create.bounds, &create.url);
        if create.focused {
            state.current = Some(window);
        }
        state
            .windows
            .get(&window)
            .cloned()
            .ok_or_else(|| no_window(window))
    }

    async fn query_tabs(&self, query: TabQuery) -> HostResult<Vec<TabInfo>> {
        let state = self.enter(METHOD_QUERY_TABS)?;
        Ok(state
            .tabs
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn navigate_tab(&self, tab: TabId, url: &str) -> HostResult<()> {
        let mut state = self.enter(METHOD_NAVIGATE_TAB)?;
        let info = state
            .tabs
            .iter_mut()
            .find(|t| t.id == tab)
            .ok_or_else(|| no_tab(tab))?;
        info.url = Some(url.to_string());
        state.navigations.push((tab, url.to_string()));
        Ok(())
    }

    async fn send_to_tab(&self, tab: TabId, message: &PageMessage) -> HostResult<()> {
        let mut state = self.enter(METHOD_SEND_TO_TAB)?;
        if state.unreachable.contains(&tab) || !state.tabs.iter().any(|t| t.id == tab) {
            return Err(HostError::Rejected(
                "Could not establish connection. Receiving end does not exist.".into(),
            ));
        }
        state.deliveries.push((tab, message.clone()));
        Ok(())
    }
}

/// In-memory `KeyValueStore`.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<StorageMap>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: StorageMap) -> Self {
        Self {
            items: Mutex::new(items),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn value(&self, key: &str) -> Option<serde_json::Value> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> HostResult<StorageMap> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        Ok(keys
            .iter()
            .filter_map(|k| items.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, new_items: StorageMap) -> HostResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HostError::Rejected(format!("{METHOD_STORAGE_SET} failed")));
        }
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.extend(new_items);
        Ok(())
    }
}
