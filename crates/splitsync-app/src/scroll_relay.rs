//! Host-side scroll agents, one per reporting window.
//!
//! The shim forwards every scroll report a page makes. Each window's
//! `ScrollAgent` debounces them with the configured timing before the
//! position is mirrored, and drops the reports a page makes while it is
//! still settling on a position mirrored into it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use splitsync_common::{ScrollSample, WindowId};
use splitsync_config::schema::ScrollConfig;
use splitsync_pairing::{PropagationEngine, SyncContext};
use splitsync_scroll::{run_agent, PageInput, PageMetrics, PageSurface, ScrollAgent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const AGENT_QUEUE: usize = 64;

/// Last metrics a page reported. The agent measures and jumps against it.
#[derive(Clone)]
struct ReportedPage(Arc<Mutex<PageMetrics>>);

impl ReportedPage {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(PageMetrics::new(0.0, 0.0, 0.0))))
    }

    fn lock(&self) -> MutexGuard<'_, PageMetrics> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, metrics: PageMetrics) {
        *self.lock() = metrics;
    }
}

impl PageSurface for ReportedPage {
    fn metrics(&self) -> PageMetrics {
        *self.lock()
    }

    // The page itself jumps on the `scrollTo` message; only the model moves.
    fn scroll_to(&mut self, top: f64) {
        self.lock().scroll_top = top;
    }
}

struct AgentLane {
    page: ReportedPage,
    inputs: mpsc::Sender<PageInput>,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Lanes {
    agents: HashMap<WindowId, AgentLane>,
    closed: bool,
}

struct Inner {
    ctx: Arc<SyncContext>,
    engine: PropagationEngine,
    config: ScrollConfig,
    lanes: Mutex<Lanes>,
}

#[derive(Clone)]
pub struct ScrollRelay {
    inner: Arc<Inner>,
}

impl ScrollRelay {
    pub fn new(ctx: Arc<SyncContext>, config: ScrollConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine: PropagationEngine::new(ctx.clone()),
                ctx,
                config,
                lanes: Mutex::new(Lanes::default()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Lanes> {
        self.inner.lanes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A page in `window` scrolled and measured itself as `sample`.
    pub fn report(&self, window: WindowId, sample: ScrollSample) {
        let metrics = PageMetrics::new(
            sample.scroll_top,
            sample.scroll_height,
            sample.client_height,
        );
        self.feed(window, Some(metrics), PageInput::LocalScroll);
    }

    /// Stop the agent of a window that went away.
    pub fn forget(&self, window: WindowId) {
        if self.lock().agents.remove(&window).is_some() {
            debug!(window_id = window.0, "scroll agent stopped");
        }
    }

    /// Number of windows with a running agent.
    pub fn agent_count(&self) -> usize {
        self.lock().agents.len()
    }

    /// Stop every agent and wait for them to finish. Later reports are
    /// ignored.
    pub async fn shutdown(&self) {
        let lanes: Vec<AgentLane> = {
            let mut lanes = self.lock();
            lanes.closed = true;
            lanes.agents.drain().map(|(_, lane)| lane).collect()
        };
        let tasks: Vec<JoinHandle<()>> = lanes.into_iter().map(|lane| lane.task).collect();
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "scroll agent task failed");
            }
        }
    }

    fn feed(&self, window: WindowId, metrics: Option<PageMetrics>, input: PageInput) {
        let mut lanes = self.lock();
        if lanes.closed {
            return;
        }
        let lane = lanes
            .agents
            .entry(window)
            .or_insert_with(|| self.spawn_lane(window));
        if let Some(metrics) = metrics {
            lane.page.set(metrics);
        }
        if lane.inputs.try_send(input).is_err() {
            debug!(window_id = window.0, "scroll agent busy, input dropped");
        }
    }

    fn spawn_lane(&self, window: WindowId) -> AgentLane {
        let page = ReportedPage::new();
        let (inputs, input_rx) = mpsc::channel(AGENT_QUEUE);
        let (report_tx, report_rx) = mpsc::channel(AGENT_QUEUE);
        let agent = ScrollAgent::new(&self.inner.config);
        let surface = page.clone();
        let relay = self.clone();
        let task = tokio::spawn(async move {
            tokio::join!(
                run_agent(agent, surface, input_rx, report_tx),
                relay.forward(window, report_rx),
            );
        });
        debug!(window_id = window.0, "scroll agent started");
        AgentLane { page, inputs, task }
    }

    /// Mirror each settled position of `window` to its partner. The
    /// partner's agent starts suppressing before the page is told to jump.
    async fn forward(&self, window: WindowId, mut reports: mpsc::Receiver<ScrollSample>) {
        while let Some(sample) = reports.recv().await {
            let ctx = &self.inner.ctx;
            if !ctx.prefs.is_scroll_sync_enabled() {
                continue;
            }
            if let Some(partner) = ctx.registry.partner_of(window) {
                self.feed(partner, None, PageInput::Remote(sample));
            }
            self.inner.engine.synchronize_scroll(window, sample).await;
        }
    }
}
