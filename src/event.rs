//! Inbound stream-message decoding.
//!
//! Clients send either `{"event": ...}` objects or channel-command arrays
//! (`[chanId, op, ...]`). Frames are decoded once here into a tagged
//! variant; the stream adapter only ever switches on the variant.

use serde_json::Value;

/// An order-channel command, keyed to its replay bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOp {
    Place,
    Cancel,
    CancelMulti,
    MultiOp,
}

impl OrderOp {
    /// Response-table key for the confirmation bundle of this command.
    pub fn response_key(self) -> &'static str {
        match self {
            OrderOp::Place => "on.res",
            OrderOp::Cancel => "oc.res",
            OrderOp::CancelMulti => "oc_multi.res",
            OrderOp::MultiOp => "ox_multi.res",
        }
    }
}

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Auth,
    /// Subscription request; the raw message is echoed back confirmed.
    Subscribe { raw: Value },
    Order(OrderOp),
    Calc,
    /// Anything unrecognized is ignored, never an error.
    Unknown,
}

/// Decode one text frame. Returns an error only for invalid JSON.
pub fn decode(text: &str) -> Result<ClientEvent, serde_json::Error> {
    let msg: Value = serde_json::from_str(text)?;
    Ok(classify(msg))
}

fn classify(msg: Value) -> ClientEvent {
    match &msg {
        Value::Object(fields) => match fields.get("event").and_then(Value::as_str) {
            Some("auth") => ClientEvent::Auth,
            Some("subscribe") => ClientEvent::Subscribe { raw: msg },
            _ => ClientEvent::Unknown,
        },
        Value::Array(items) => classify_command(items),
        _ => ClientEvent::Unknown,
    }
}

/// Channel commands are only honored on channel 0.
fn classify_command(items: &[Value]) -> ClientEvent {
    if items.first().and_then(Value::as_i64) != Some(0) {
        return ClientEvent::Unknown;
    }

    match items.get(1).and_then(Value::as_str) {
        Some("on") => ClientEvent::Order(OrderOp::Place),
        Some("oc") => ClientEvent::Order(OrderOp::Cancel),
        Some("oc_multi") => ClientEvent::Order(OrderOp::CancelMulti),
        Some("ox_multi") => ClientEvent::Order(OrderOp::MultiOp),
        Some("calc") => ClientEvent::Calc,
        _ => ClientEvent::Unknown,
    }
}
