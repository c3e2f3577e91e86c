//! Runs a `ScrollAgent` against a page on tokio timers.

use std::time::Instant;

use splitsync_common::ScrollSample;
use tokio::sync::mpsc;
use tokio::time::sleep_until;
use tracing::debug;

use crate::agent::{PageMetrics, ScrollAgent};

/// What the page feeds into the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum PageInput {
    /// The page fired a scroll event.
    LocalScroll,
    /// The partner scrolled; mirror it here.
    Remote(ScrollSample),
}

/// The local page as seen by the agent.
pub trait PageSurface: Send {
    fn metrics(&self) -> PageMetrics;

    /// Jump (no animation) to an absolute offset.
    fn scroll_to(&mut self, top: f64);
}

/// Drive `agent` until `inputs` closes or the report channel is dropped.
/// Debounced samples are sent on `reports`.
pub async fn run_agent<S: PageSurface>(
    mut agent: ScrollAgent,
    mut surface: S,
    mut inputs: mpsc::Receiver<PageInput>,
    reports: mpsc::Sender<ScrollSample>,
) {
    loop {
        let deadline = agent.next_deadline();
        let wake_at = deadline
            .map(tokio::time::Instant::from_std)
            .unwrap_or_else(far_future);
        tokio::select! {
            input = inputs.recv() => {
                let Some(input) = input else { break };
                let now = Instant::now();
                match input {
                    PageInput::LocalScroll => {
                        agent.on_local_scroll(now);
                    }
                    PageInput::Remote(sample) => {
                        let target = agent.apply_remote(&sample, surface.metrics(), now);
                        surface.scroll_to(target);
                    }
                }
            }
            _ = sleep_until(wake_at), if deadline.is_some() => {
                if let Some(sample) = agent.poll(Instant::now(), surface.metrics()) {
                    if reports.send(sample).await.is_err() {
                        debug!("scroll report receiver dropped");
                        break;
                    }
                }
            }
        }
    }
}

fn far_future() -> tokio::time::Instant {
    tokio::time::Instant::now() + std::time::Duration::from_secs(86_400)
}
