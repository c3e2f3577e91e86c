//! Echo-suppressing scroll state machine.
//!
//! ```text
//!            apply_remote
//!   Idle ──────────────────▶ Suppressing { until }
//!    ▲                              │
//!    └──────── now >= until ────────┘
//! ```
//!
//! In `Idle` a local scroll (re)arms the debounce timer and the sample is
//! reported once it fires. In `Suppressing` local scrolls are discarded:
//! they are the page reacting to the position we just applied. Time is
//! always passed in, so every transition is deterministic.

use std::time::{Duration, Instant};

use splitsync_common::ScrollSample;
use splitsync_config::schema::ScrollConfig;
use tracing::{debug, trace};

/// Scroll metrics of the local page at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl PageMetrics {
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Suppressing { until: Instant },
}

#[derive(Debug)]
pub struct ScrollAgent {
    debounce: Duration,
    guard: Duration,
    state: AgentState,
    /// When the debounced report is due, if one is armed.
    pending: Option<Instant>,
    last_top: f64,
}

impl ScrollAgent {
    pub fn new(config: &ScrollConfig) -> Self {
        Self::with_timing(config.debounce(), config.guard())
    }

    pub fn with_timing(debounce: Duration, guard: Duration) -> Self {
        Self {
            debounce,
            guard,
            state: AgentState::Idle,
            pending: None,
            last_top: 0.0,
        }
    }

    /// Current state, after expiring a finished guard window.
    pub fn state(&mut self, now: Instant) -> AgentState {
        self.expire(now);
        self.state
    }

    fn expire(&mut self, now: Instant) {
        if let AgentState::Suppressing { until } = self.state {
            if now >= until {
                trace!("guard window over");
                self.state = AgentState::Idle;
            }
        }
    }

    /// A scroll event fired on the local page. Returns false when it was
    /// discarded as an echo of an applied position.
    pub fn on_local_scroll(&mut self, now: Instant) -> bool {
        self.expire(now);
        match self.state {
            AgentState::Suppressing { .. } => {
                trace!("local scroll suppressed");
                false
            }
            AgentState::Idle => {
                self.pending = Some(now + self.debounce);
                true
            }
        }
    }

    /// Emit the debounced sample if its timer has fired. Pages with nothing
    /// to scroll produce no sample.
    pub fn poll(&mut self, now: Instant, metrics: PageMetrics) -> Option<ScrollSample> {
        self.expire(now);
        let due = self.pending?;
        if now < due {
            return None;
        }
        self.pending = None;

        let is_scrolling_up = metrics.scroll_top < self.last_top;
        self.last_top = metrics.scroll_top;

        let sample = ScrollSample::measure(
            metrics.scroll_top,
            metrics.scroll_height,
            metrics.client_height,
        )?;
        Some(sample.with_direction(is_scrolling_up))
    }

    /// Apply a mirrored position from the partner. Enters (or extends)
    /// `Suppressing`, drops any armed report, and returns the absolute
    /// offset to jump to on this page.
    pub fn apply_remote(&mut self, sample: &ScrollSample, metrics: PageMetrics, now: Instant) -> f64 {
        let target = sample.target_offset(metrics.scroll_height, metrics.client_height);
        self.state = AgentState::Suppressing {
            until: now + self.guard,
        };
        self.pending = None;
        self.last_top = target;
        debug!(percentage = sample.percentage, target, "mirrored scroll applied");
        target
    }

    /// The next instant at which `poll` or the guard expiry has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.pending, self.state) {
            (Some(due), AgentState::Suppressing { until }) => Some(due.min(until)),
            (Some(due), AgentState::Idle) => Some(due),
            (None, AgentState::Suppressing { until }) => Some(until),
            (None, AgentState::Idle) => None,
        }
    }

    pub fn is_report_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(50);
    const GUARD: Duration = Duration::from_millis(150);

    fn agent() -> ScrollAgent {
        ScrollAgent::with_timing(DEBOUNCE, GUARD)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn page(top: f64) -> PageMetrics {
        PageMetrics::new(top, 2000.0, 1000.0)
    }

    #[test]
    fn report_waits_for_debounce() {
        let t0 = Instant::now();
        let mut a = agent();
        assert!(a.on_local_scroll(t0));
        assert!(a.poll(t0 + ms(49), page(500.0)).is_none());
        let sample = a.poll(t0 + ms(50), page(500.0)).unwrap();
        assert!((sample.percentage - 50.0).abs() < f64::EPSILON);
        assert!(!a.is_report_pending());
    }

    #[test]
    fn later_scroll_rearms_debounce() {
        let t0 = Instant::now();
        let mut a = agent();
        a.on_local_scroll(t0);
        a.on_local_scroll(t0 + ms(40));
        assert!(a.poll(t0 + ms(60), page(100.0)).is_none());
        assert!(a.poll(t0 + ms(90), page(100.0)).is_some());
    }

    #[test]
    fn direction_is_relative_to_last_report() {
        let t0 = Instant::now();
        let mut a = agent();
        a.on_local_scroll(t0);
        let down = a.poll(t0 + DEBOUNCE, page(600.0)).unwrap();
        assert_eq!(down.is_scrolling_up, Some(false));

        let t1 = t0 + ms(200);
        a.on_local_scroll(t1);
        let up = a.poll(t1 + DEBOUNCE, page(200.0)).unwrap();
        assert_eq!(up.is_scrolling_up, Some(true));
    }

    #[test]
    fn applied_scroll_does_not_echo() {
        let t0 = Instant::now();
        let mut a = agent();
        let incoming = ScrollSample::measure(500.0, 2000.0, 1000.0).unwrap();

        let target = a.apply_remote(&incoming, PageMetrics::new(0.0, 3000.0, 1000.0), t0);
        assert!((target - 1000.0).abs() < f64::EPSILON);
        assert!(matches!(a.state(t0), AgentState::Suppressing { .. }));

        // The jump itself fires a scroll event shortly after.
        assert!(!a.on_local_scroll(t0 + ms(5)));
        assert!(a.poll(t0 + ms(100), page(1000.0)).is_none());
        assert!(!a.is_report_pending());
    }

    #[test]
    fn guard_expires_back_to_idle() {
        let t0 = Instant::now();
        let mut a = agent();
        let incoming = ScrollSample::measure(100.0, 2000.0, 1000.0).unwrap();
        a.apply_remote(&incoming, page(0.0), t0);
        assert_eq!(a.next_deadline(), Some(t0 + GUARD));

        assert_eq!(a.state(t0 + GUARD), AgentState::Idle);
        assert!(a.on_local_scroll(t0 + GUARD));
        assert!(a.poll(t0 + GUARD + DEBOUNCE, page(300.0)).is_some());
    }

    #[test]
    fn remote_command_cancels_armed_report() {
        let t0 = Instant::now();
        let mut a = agent();
        a.on_local_scroll(t0);
        let incoming = ScrollSample::measure(100.0, 2000.0, 1000.0).unwrap();
        a.apply_remote(&incoming, page(0.0), t0 + ms(10));
        assert!(a.poll(t0 + ms(60), page(100.0)).is_none());
    }

    #[test]
    fn second_remote_command_extends_guard() {
        let t0 = Instant::now();
        let mut a = agent();
        let incoming = ScrollSample::measure(100.0, 2000.0, 1000.0).unwrap();
        a.apply_remote(&incoming, page(0.0), t0);
        a.apply_remote(&incoming, page(0.0), t0 + ms(100));
        assert!(!a.on_local_scroll(t0 + ms(200)));
        assert!(a.on_local_scroll(t0 + ms(250)));
    }

    #[test]
    fn page_without_scroll_range_reports_nothing() {
        let t0 = Instant::now();
        let mut a = agent();
        a.on_local_scroll(t0);
        assert!(a.poll(t0 + DEBOUNCE, PageMetrics::new(0.0, 800.0, 800.0)).is_none());
        assert!(!a.is_report_pending());
    }

    #[test]
    fn next_deadline_prefers_earliest() {
        let t0 = Instant::now();
        let mut a = agent();
        assert_eq!(a.next_deadline(), None);
        a.on_local_scroll(t0);
        assert_eq!(a.next_deadline(), Some(t0 + DEBOUNCE));
    }
}
