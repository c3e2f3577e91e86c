//! Bridge event loop.
//!
//! Three parts run concurrently:
//! - the reader decodes inbound frames, resolves `reply` frames directly
//!   and hands requests and events to the dispatcher;
//! - the dispatcher runs each request on its own task, so a handler parked
//!   on a host call never blocks the next frame. Host events go to one
//!   ordered lane per window, and scroll reports to that window's agent;
//! - the writer serializes every outbound frame onto the output stream.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use splitsync_common::{SyncError, WindowId};
use splitsync_config::SplitSyncConfig;
use splitsync_pairing::{EventRouter, HostEvent, MessageSender, Request, Response, SyncContext};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::codec::{read_frame, write_frame};
use super::native_host::NativeHost;
use super::wire::{InboundFrame, OutboundFrame};
use crate::scroll_relay::ScrollRelay;

const OUTBOUND_QUEUE: usize = 256;
const DISPATCH_QUEUE: usize = 256;

/// Work for the dispatcher.
enum Dispatch {
    Request {
        id: u64,
        sender: MessageSender,
        /// The parse error text when the message is not a known request.
        request: Result<Request, String>,
    },
    Event(HostEvent),
}

type EventLanes = HashMap<WindowId, mpsc::UnboundedSender<HostEvent>>;

/// Serve the native messaging protocol until `input` reaches EOF.
pub async fn serve<R, W>(input: R, output: W, config: SplitSyncConfig) -> Result<(), SyncError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::channel::<OutboundFrame>(OUTBOUND_QUEUE);
    let (work_tx, mut work_rx) = mpsc::channel::<Dispatch>(DISPATCH_QUEUE);

    let writer = tokio::spawn(write_loop(output, out_rx));

    let host = Arc::new(NativeHost::new(out_tx.clone(), config.host.call_timeout()));
    let reader = tokio::spawn(read_loop(input, host.clone(), work_tx));

    // Loading preferences issues host calls, answered through the reader.
    let ctx = SyncContext::new(host.clone(), host.clone(), &config.sync).await;
    let router = EventRouter::new(Arc::new(ctx));
    let relay = ScrollRelay::new(router.context().clone(), config.scroll.clone());
    info!("bridge ready");

    let mut tasks = JoinSet::new();
    let mut lanes = EventLanes::new();
    loop {
        tokio::select! {
            work = work_rx.recv() => {
                let Some(work) = work else { break };
                match work {
                    Dispatch::Request {
                        id,
                        sender: MessageSender { window_id: Some(window), .. },
                        request: Ok(Request::Scroll { data }),
                    } => {
                        relay.report(window, data);
                        respond(&out_tx, id, Response::ok()).await;
                    }
                    Dispatch::Request { id, sender, request } => {
                        tasks.spawn(answer(router.clone(), out_tx.clone(), id, sender, request));
                    }
                    Dispatch::Event(event) => {
                        route_event(&mut lanes, &mut tasks, &router, &relay, event);
                    }
                }
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, "handler task failed");
                }
            }
        }
    }

    // Input is done. Handlers still parked on host calls were failed by the
    // reader's disconnect and finish promptly; lanes end once drained.
    drop(lanes);
    while tasks.join_next().await.is_some() {}
    relay.shutdown().await;

    let read_result = reader
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    drop(relay);
    drop(router);
    drop(host);
    drop(out_tx);
    if let Err(e) = writer.await {
        warn!(error = %e, "writer task failed");
    }

    read_result.map_err(SyncError::from)
}

/// Queue `event` on its window's lane, starting the lane on first use.
/// Events of one window are handled in arrival order.
fn route_event(
    lanes: &mut EventLanes,
    tasks: &mut JoinSet<()>,
    router: &EventRouter,
    relay: &ScrollRelay,
    event: HostEvent,
) {
    let (window, closing) = match &event {
        HostEvent::WindowRemoved { window_id } => (*window_id, true),
        HostEvent::TabUpdated { window_id, .. } => (*window_id, false),
    };
    if closing {
        relay.forget(window);
    }

    let lane = lanes.entry(window).or_insert_with(|| {
        let (tx, rx) = mpsc::unbounded_channel();
        tasks.spawn(run_lane(router.clone(), window, rx));
        tx
    });
    if lane.send(event).is_err() {
        warn!(window_id = window.0, "event lane gone, event dropped");
    }
    if closing {
        lanes.remove(&window);
    }
}

async fn run_lane(
    router: EventRouter,
    window: WindowId,
    mut events: mpsc::UnboundedReceiver<HostEvent>,
) {
    while let Some(event) = events.recv().await {
        router.handle_host_event(event).await;
    }
    debug!(window_id = window.0, "event lane closed");
}

async fn answer(
    router: EventRouter,
    out_tx: mpsc::Sender<OutboundFrame>,
    id: u64,
    sender: MessageSender,
    request: Result<Request, String>,
) {
    let response = match request {
        Ok(request) => router.handle_request(&sender, request).await,
        Err(e) => Response::failed(SyncError::Protocol(e).to_string()),
    };
    respond(&out_tx, id, response).await;
}

async fn respond(out_tx: &mpsc::Sender<OutboundFrame>, id: u64, response: Response) {
    if out_tx
        .send(OutboundFrame::Response { id, response })
        .await
        .is_err()
    {
        debug!(request_id = id, "output closed before response was sent");
    }
}

async fn read_loop<R>(
    mut input: R,
    host: Arc<NativeHost>,
    work: mpsc::Sender<Dispatch>,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let result = loop {
        let payload = match read_frame(&mut input).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                info!("input closed");
                break Ok(());
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!(error = %e, "inbound frame rejected");
                continue;
            }
            Err(e) => break Err(e),
        };

        let frame: InboundFrame = match serde_json::from_slice(&payload) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, len = payload.len(), "malformed inbound frame dropped");
                continue;
            }
        };

        let job = match frame {
            InboundFrame::Reply {
                id,
                ok,
                result,
                error,
            } => {
                host.resolve(id, ok, result, error);
                continue;
            }
            InboundFrame::Request {
                id,
                sender,
                message,
            } => {
                let request = serde_json::from_value::<Request>(message).map_err(|e| {
                    warn!(request_id = id, error = %e, "unrecognized request");
                    e.to_string()
                });
                Dispatch::Request {
                    id,
                    sender,
                    request,
                }
            }
            InboundFrame::Event { event } => Dispatch::Event(event),
        };

        if work.send(job).await.is_err() {
            break Ok(());
        }
    };

    host.disconnect();
    result
}

async fn write_loop<W>(mut output: W, mut frames: mpsc::Receiver<OutboundFrame>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = frames.recv().await {
        let payload = match serde_json::to_vec(&frame) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "failed to encode outbound frame");
                continue;
            }
        };
        if let Err(e) = write_frame(&mut output, &payload).await {
            match e.kind() {
                io::ErrorKind::InvalidInput => {
                    warn!(error = %e, "outbound frame dropped");
                }
                _ => {
                    warn!(error = %e, "output closed");
                    break;
                }
            }
        }
    }
}
