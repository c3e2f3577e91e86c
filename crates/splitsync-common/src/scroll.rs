//! Scroll position samples exchanged between paired pages.
//!
//! A sample carries the absolute metrics of the page that produced it, but
//! only `percentage` is meaningful to the receiver: pages of different
//! length map the same percentage onto their own scrollable range.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollSample {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
    /// `scroll_top / (scroll_height - client_height) * 100`.
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_scrolling_up: Option<bool>,
}

impl ScrollSample {
    /// Measure a page. Returns `None` when the page has no scrollable range
    /// (content no taller than the viewport), since there is no position
    /// worth mirroring.
    pub fn measure(scroll_top: f64, scroll_height: f64, client_height: f64) -> Option<Self> {
        let range = scroll_height - client_height;
        if !range.is_finite() || range <= 0.0 || !scroll_top.is_finite() {
            return None;
        }
        Some(Self {
            scroll_top,
            scroll_height,
            client_height,
            percentage: scroll_top / range * 100.0,
            is_scrolling_up: None,
        })
    }

    pub fn with_direction(mut self, is_scrolling_up: bool) -> Self {
        self.is_scrolling_up = Some(is_scrolling_up);
        self
    }

    /// Absolute offset on a receiving page with its own metrics. The
    /// percentage is clamped to `[0, 100]`; a receiver without a scrollable
    /// range always lands on 0.
    pub fn target_offset(&self, scroll_height: f64, client_height: f64) -> f64 {
        let range = (scroll_height - client_height).max(0.0);
        let pct = if self.percentage.is_finite() {
            self.percentage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        pct / 100.0 * range
    }
}
