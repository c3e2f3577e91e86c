//! Shared state handed to every handler.

use std::sync::Arc;

use splitsync_config::schema::SyncDefaults;

use crate::controller::SplitTracker;
use crate::host::{BrowserHost, KeyValueStore};
use crate::overlay::OverlayLayoutStore;
use crate::preferences::PreferencesStore;
use crate::propagation::NavigationExpectations;
use crate::registry::PairRegistry;

/// Everything the controller, propagation engine and router share. One
/// instance lives for the whole process; pairs are never persisted.
pub struct SyncContext {
    pub host: Arc<dyn BrowserHost>,
    pub registry: PairRegistry,
    pub prefs: PreferencesStore,
    pub layout: OverlayLayoutStore,
    pub splits: SplitTracker,
    pub navigations: NavigationExpectations,
}

impl SyncContext {
    /// Build a fresh context, loading persisted preferences from `store`.
    pub async fn new(
        host: Arc<dyn BrowserHost>,
        store: Arc<dyn KeyValueStore>,
        defaults: &SyncDefaults,
    ) -> Self {
        let prefs = PreferencesStore::load(store.clone(), host.clone(), defaults).await;
        Self {
            host,
            registry: PairRegistry::new(),
            prefs,
            layout: OverlayLayoutStore::new(store),
            splits: SplitTracker::new(),
            navigations: NavigationExpectations::new(),
        }
    }
}
