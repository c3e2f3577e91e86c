//! `BrowserHost` and `KeyValueStore` over the native messaging channel.
//!
//! Each trait call becomes a `call` frame with a fresh id. The caller
//! parks on a oneshot until the shim's matching `reply` arrives, the call
//! times out, or the channel closes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use splitsync_common::{DisplayDescriptor, HostError, TabId, WindowId};
use splitsync_pairing::host::{
    BrowserHost, HostResult, KeyValueStore, StorageMap, TabInfo, TabQuery, WindowCreate,
    WindowInfo, WindowUpdate, METHOD_CREATE_WINDOW, METHOD_CURRENT_WINDOW, METHOD_DISPLAYS,
    METHOD_NAVIGATE_TAB, METHOD_QUERY_TABS, METHOD_SEND_TO_TAB, METHOD_STORAGE_GET,
    METHOD_STORAGE_SET, METHOD_UPDATE_WINDOW,
};
use splitsync_pairing::PageMessage;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::wire::OutboundFrame;

type Pending = HashMap<u64, oneshot::Sender<HostResult<Value>>>;

pub struct NativeHost {
    outbound: mpsc::Sender<OutboundFrame>,
    pending: Mutex<Pending>,
    next_id: AtomicU64,
    timeout: Duration,
    /// Set once the inbound side closed; later calls fail immediately.
    closed: AtomicBool,
}

impl NativeHost {
    pub fn new(outbound: mpsc::Sender<OutboundFrame>, timeout: Duration) -> Self {
        Self {
            outbound,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            timeout,
            closed: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of calls waiting for a reply.
    #[cfg(test)]
    pub fn pending_calls(&self) -> usize {
        self.lock().len()
    }

    /// Complete the call `id` with the shim's reply. Returns false for an
    /// unknown id (already timed out, or never issued).
    pub fn resolve(&self, id: u64, ok: bool, result: Value, error: Option<String>) -> bool {
        let Some(waiter) = self.lock().remove(&id) else {
            debug!(call_id = id, "reply for unknown call dropped");
            return false;
        };
        let outcome = if ok {
            Ok(result)
        } else {
            Err(HostError::Rejected(
                error.unwrap_or_else(|| "unknown host error".to_string()),
            ))
        };
        // The caller may have given up in the meantime.
        let _ = waiter.send(outcome);
        true
    }

    /// Fail every pending call and refuse new ones.
    pub fn disconnect(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let drained: Vec<_> = self.lock().drain().collect();
        if !drained.is_empty() {
            warn!(pending = drained.len(), "host channel closed with calls in flight");
        }
        for (_, waiter) in drained {
            let _ = waiter.send(Err(HostError::Disconnected));
        }
    }

    async fn call_raw(&self, method: &'static str, params: Value) -> HostResult<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(HostError::Disconnected);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.lock().insert(id, tx);
        if self.closed.load(Ordering::SeqCst) {
            self.lock().remove(&id);
            return Err(HostError::Disconnected);
        }

        let frame = OutboundFrame::Call { id, method, params };
        if self.outbound.send(frame).await.is_err() {
            self.lock().remove(&id);
            return Err(HostError::Disconnected);
        }
        debug!(call_id = id, method, "host call issued");

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(HostError::Disconnected),
            Err(_) => {
                self.lock().remove(&id);
                Err(HostError::Timeout {
                    method: method.to_string(),
                    after_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &'static str, params: Value) -> HostResult<T> {
        let value = self.call_raw(method, params).await?;
        serde_json::from_value(value).map_err(|e| HostError::Decode(format!("{method}: {e}")))
    }
}

fn params<T: serde::Serialize>(value: &T) -> HostResult<Value> {
    serde_json::to_value(value).map_err(|e| HostError::Decode(e.to_string()))
}

#[async_trait]
impl BrowserHost for NativeHost {
    async fn current_window(&self) -> HostResult<WindowInfo> {
        self.call(METHOD_CURRENT_WINDOW, json!({})).await
    }

    async fn displays(&self) -> HostResult<Vec<DisplayDescriptor>> {
        self.call(METHOD_DISPLAYS, json!({})).await
    }

    async fn update_window(&self, id: WindowId, update: WindowUpdate) -> HostResult<WindowInfo> {
        let update = params(&update)?;
        self.call(METHOD_UPDATE_WINDOW, json!({ "windowId": id, "update": update }))
            .await
    }

    async fn create_window(&self, create: WindowCreate) -> HostResult<WindowInfo> {
        self.call(METHOD_CREATE_WINDOW, params(&create)?).await
    }

    async fn query_tabs(&self, query: TabQuery) -> HostResult<Vec<TabInfo>> {
        self.call(METHOD_QUERY_TABS, params(&query)?).await
    }

    async fn navigate_tab(&self, tab: TabId, url: &str) -> HostResult<()> {
        self.call_raw(METHOD_NAVIGATE_TAB, json!({ "tabId": tab, "url": url }))
            .await
            .map(drop)
    }

    async fn send_to_tab(&self, tab: TabId, message: &PageMessage) -> HostResult<()> {
        let message = params(message)?;
        self.call_raw(METHOD_SEND_TO_TAB, json!({ "tabId": tab, "message": message }))
            .await
            .map(drop)
    }
}

#[async_trait]
impl KeyValueStore for NativeHost {
    async fn get(&self, keys: &[&str]) -> HostResult<StorageMap> {
        self.call(METHOD_STORAGE_GET, json!({ "keys": keys })).await
    }

    async fn set(&self, items: StorageMap) -> HostResult<()> {
        self.call_raw(METHOD_STORAGE_SET, json!({ "items": items }))
            .await
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn host(timeout_ms: u64) -> (Arc<NativeHost>, mpsc::Receiver<OutboundFrame>) {
        let (tx, rx) = mpsc::channel(8);
        (
            Arc::new(NativeHost::new(tx, Duration::from_millis(timeout_ms))),
            rx,
        )
    }

    fn call_id(frame: OutboundFrame) -> (u64, &'static str, Value) {
        match frame {
            OutboundFrame::Call { id, method, params } => (id, method, params),
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[tokio::test]
    async fn reply_completes_call() {
        let (host, mut rx) = host(1000);
        let caller = {
            let host = host.clone();
            tokio::spawn(async move { host.current_window().await })
        };

        let (id, method, _) = call_id(rx.recv().await.unwrap());
        assert_eq!(method, METHOD_CURRENT_WINDOW);
        assert!(host.resolve(
            id,
            true,
            json!({"id": 3, "left": 0, "top": 0, "width": 800, "height": 600}),
            None
        ));

        let info = caller.await.unwrap().unwrap();
        assert_eq!(info.id, WindowId(3));
        assert_eq!(host.pending_calls(), 0);
    }

    #[tokio::test]
    async fn rejected_reply_carries_message() {
        let (host, mut rx) = host(1000);
        let caller = {
            let host = host.clone();
            tokio::spawn(async move { host.navigate_tab(TabId(5), "https://x/").await })
        };

        let (id, method, params) = call_id(rx.recv().await.unwrap());
        assert_eq!(method, METHOD_NAVIGATE_TAB);
        assert_eq!(params, json!({"tabId": 5, "url": "https://x/"}));
        host.resolve(id, false, Value::Null, Some("No tab with id: 5.".into()));

        let err = caller.await.unwrap().unwrap_err();
        assert_eq!(err, HostError::Rejected("No tab with id: 5.".into()));
    }

    #[tokio::test]
    async fn malformed_result_is_a_decode_error() {
        let (host, mut rx) = host(1000);
        let caller = {
            let host = host.clone();
            tokio::spawn(async move { host.displays().await })
        };
        let (id, _, _) = call_id(rx.recv().await.unwrap());
        host.resolve(id, true, json!("not a list"), None);
        assert!(matches!(
            caller.await.unwrap().unwrap_err(),
            HostError::Decode(_)
        ));
    }

    #[tokio::test]
    async fn unanswered_call_times_out() {
        let (host, mut rx) = host(50);
        let err = host.query_tabs(TabQuery::all()).await.unwrap_err();
        assert_eq!(
            err,
            HostError::Timeout {
                method: METHOD_QUERY_TABS.to_string(),
                after_ms: 50,
            }
        );
        assert_eq!(host.pending_calls(), 0);

        // A late reply is ignored.
        let (id, _, _) = call_id(rx.recv().await.unwrap());
        assert!(!host.resolve(id, true, json!([]), None));
    }

    #[tokio::test]
    async fn disconnect_fails_pending_and_future_calls() {
        let (host, mut rx) = host(5000);
        let caller = {
            let host = host.clone();
            tokio::spawn(async move { host.get(&["urlSyncEnabled"]).await })
        };
        let (_, method, params) = call_id(rx.recv().await.unwrap());
        assert_eq!(method, METHOD_STORAGE_GET);
        assert_eq!(params, json!({"keys": ["urlSyncEnabled"]}));

        host.disconnect();
        assert_eq!(caller.await.unwrap().unwrap_err(), HostError::Disconnected);
        assert_eq!(
            host.current_window().await.unwrap_err(),
            HostError::Disconnected
        );
    }
}
