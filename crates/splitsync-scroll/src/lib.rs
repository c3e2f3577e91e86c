//! Page-side scroll agent for SplitSync.
//!
//! Each paired page runs one agent. It reports local scrolling (debounced)
//! and applies mirrored positions from the partner, ignoring the scroll
//! events its own mirrored jumps cause. `ScrollAgent` is the clock-driven
//! state machine; `driver` runs it on tokio timers.

pub mod agent;
pub mod driver;

pub use agent::{AgentState, PageMetrics, ScrollAgent};
pub use driver::{run_agent, PageInput, PageSurface};
