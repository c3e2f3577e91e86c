//! Sync preferences: the URL-sync and scroll-sync flags.
//!
//! Process-wide, shared by every pair. Loaded once at startup, persisted
//! on every change and broadcast to all open pages.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use splitsync_common::Result;
use splitsync_config::schema::SyncDefaults;
use tracing::{info, warn};

use crate::delivery;
use crate::host::{BrowserHost, KeyValueStore, StorageMap};
use crate::protocol::{PageMessage, SyncState};

pub const KEY_URL_SYNC: &str = "urlSyncEnabled";
pub const KEY_SCROLL_SYNC: &str = "scrollSyncEnabled";

pub struct PreferencesStore {
    state: Mutex<SyncState>,
    store: Arc<dyn KeyValueStore>,
    host: Arc<dyn BrowserHost>,
}

impl PreferencesStore {
    /// Read persisted flags, falling back to `defaults` for absent keys or
    /// when storage cannot be read.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        host: Arc<dyn BrowserHost>,
        defaults: &SyncDefaults,
    ) -> Self {
        let mut state = SyncState {
            url_sync_enabled: defaults.url_sync_default,
            scroll_sync_enabled: defaults.scroll_sync_default,
        };

        match store.get(&[KEY_URL_SYNC, KEY_SCROLL_SYNC]).await {
            Ok(items) => {
                if let Some(v) = items.get(KEY_URL_SYNC).and_then(Value::as_bool) {
                    state.url_sync_enabled = v;
                }
                if let Some(v) = items.get(KEY_SCROLL_SYNC).and_then(Value::as_bool) {
                    state.scroll_sync_enabled = v;
                }
            }
            Err(e) => warn!(error = %e, "failed to read sync preferences, using defaults"),
        }

        info!(
            url_sync = state.url_sync_enabled,
            scroll_sync = state.scroll_sync_enabled,
            "sync preferences loaded"
        );

        Self {
            state: Mutex::new(state),
            store,
            host,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> SyncState {
        *self.lock()
    }

    pub fn is_url_sync_enabled(&self) -> bool {
        self.lock().url_sync_enabled
    }

    pub fn is_scroll_sync_enabled(&self) -> bool {
        self.lock().scroll_sync_enabled
    }

    pub async fn set_url_sync(&self, enabled: bool) -> Result<SyncState> {
        self.lock().url_sync_enabled = enabled;
        self.persist_and_broadcast(KEY_URL_SYNC, enabled).await
    }

    pub async fn set_scroll_sync(&self, enabled: bool) -> Result<SyncState> {
        self.lock().scroll_sync_enabled = enabled;
        self.persist_and_broadcast(KEY_SCROLL_SYNC, enabled).await
    }

    /// The in-memory flag takes effect immediately; a failed write leaves it
    /// in place for this session and is reported to the caller.
    async fn persist_and_broadcast(&self, key: &str, enabled: bool) -> Result<SyncState> {
        let mut items = StorageMap::new();
        items.insert(key.to_string(), Value::Bool(enabled));
        self.store.set(items).await?;

        let state = self.snapshot();
        let delivered =
            delivery::broadcast(self.host.as_ref(), &PageMessage::StateChanged { state }).await;
        info!(key, enabled, delivered, "sync preference changed");
        Ok(state)
    }
}
