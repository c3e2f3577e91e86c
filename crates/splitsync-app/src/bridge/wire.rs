//! Frames exchanged with the extension shim.
//!
//! The shim forwards page requests and browser events to the host and runs
//! browser API calls on its behalf. Every frame is a JSON object tagged by
//! `type`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use splitsync_pairing::{HostEvent, MessageSender, Response};

/// Shim -> host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundFrame {
    /// A page or popup request. `message` stays raw so an unknown action
    /// can still be answered under its id.
    Request {
        id: u64,
        #[serde(default)]
        sender: MessageSender,
        message: Value,
    },
    Event {
        event: HostEvent,
    },
    /// Result of a `call` frame.
    Reply {
        id: u64,
        ok: bool,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        error: Option<String>,
    },
}

/// Host -> shim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundFrame {
    Response {
        id: u64,
        response: Response,
    },
    Call {
        id: u64,
        method: &'static str,
        params: Value,
    },
}
