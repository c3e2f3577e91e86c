//! Overlay layout persistence: whether the on-page control is hidden and
//! where the user dragged its elements.

use std::sync::Arc;

use serde_json::Value;
use splitsync_common::{Result, SyncError};
use tracing::{debug, warn};

use crate::host::{KeyValueStore, StorageMap};
use crate::protocol::{ElementPositions, OverlayLayout};

pub const KEY_OVERLAY_HIDDEN: &str = "overlayHidden";
pub const KEY_ELEMENT_POSITIONS: &str = "elementPositions";

pub struct OverlayLayoutStore {
    store: Arc<dyn KeyValueStore>,
}

impl OverlayLayoutStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current layout. A missing or malformed `elementPositions` entry reads
    /// as `None` so the page falls back to its default placement.
    pub async fn layout(&self) -> Result<OverlayLayout> {
        let items = self
            .store
            .get(&[KEY_OVERLAY_HIDDEN, KEY_ELEMENT_POSITIONS])
            .await?;

        let overlay_hidden = items
            .get(KEY_OVERLAY_HIDDEN)
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let element_positions = match items.get(KEY_ELEMENT_POSITIONS) {
            Some(raw) => match serde_json::from_value(raw.clone()) {
                Ok(positions) => Some(positions),
                Err(e) => {
                    warn!(error = %e, "ignoring malformed saved element positions");
                    None
                }
            },
            None => None,
        };

        Ok(OverlayLayout {
            overlay_hidden,
            element_positions,
        })
    }

    pub async fn set_hidden(&self, hidden: bool) -> Result<()> {
        let mut items = StorageMap::new();
        items.insert(KEY_OVERLAY_HIDDEN.to_string(), Value::Bool(hidden));
        self.store.set(items).await?;
        debug!(hidden, "overlay visibility saved");
        Ok(())
    }

    pub async fn save_positions(&self, positions: ElementPositions) -> Result<()> {
        let value =
            serde_json::to_value(&positions).map_err(|e| SyncError::Protocol(e.to_string()))?;
        let mut items = StorageMap::new();
        items.insert(KEY_ELEMENT_POSITIONS.to_string(), value);
        self.store.set(items).await?;
        debug!("overlay element positions saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryStore;
    use crate::protocol::ElementPosition;

    #[tokio::test]
    async fn empty_store_reads_visible_with_default_positions() {
        let layouts = OverlayLayoutStore::new(Arc::new(MemoryStore::new()));
        let layout = layouts.layout().await.unwrap();
        assert!(!layout.overlay_hidden);
        assert!(layout.element_positions.is_none());
    }

    #[tokio::test]
    async fn hidden_flag_and_positions_persist() {
        let store = Arc::new(MemoryStore::new());
        let layouts = OverlayLayoutStore::new(store.clone());

        layouts.set_hidden(true).await.unwrap();
        let positions = ElementPositions {
            overlay_position: ElementPosition {
                left: Some("40px".into()),
                top: Some("12px".into()),
            },
            toggle_position: ElementPosition::default(),
        };
        layouts.save_positions(positions.clone()).await.unwrap();

        assert_eq!(store.value(KEY_OVERLAY_HIDDEN), Some(Value::Bool(true)));
        let layout = layouts.layout().await.unwrap();
        assert!(layout.overlay_hidden);
        assert_eq!(layout.element_positions, Some(positions));
    }

    #[tokio::test]
    async fn malformed_positions_read_as_none() {
        let mut items = StorageMap::new();
        items.insert(KEY_ELEMENT_POSITIONS.into(), Value::String("oops".into()));
        let layouts = OverlayLayoutStore::new(Arc::new(MemoryStore::with_items(items)));
        assert!(layouts.layout().await.unwrap().element_positions.is_none());
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(true);
        let layouts = OverlayLayoutStore::new(store);
        assert!(layouts.set_hidden(true).await.is_err());
    }
}
