//! Native messaging bridge between the browser extension and the sync core.
//!
//! The extension side is a thin shim: it forwards page requests and browser
//! events as frames, and executes the browser API calls the core issues.

pub mod codec;
pub mod native_host;
pub mod server;
pub mod wire;


pub use server::serve;
