//! WebSocket event-stream adapter.
//!
//! Clients connect and receive the `connect.res` bundle, then drive the
//! session with auth/subscribe/command frames. Every reply is looked up in
//! the response table and expanded through the packet engine, so tests can
//! rewire the whole conversation at runtime through the control plane.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::dispatch::Dispatcher;
use crate::event::{self, ClientEvent};
use crate::table::ResponseTable;

/// Key replayed to every client on connect.
const CONNECT_KEY: &str = "connect.res";

/// Key replayed on auth.
const AUTH_KEY: &str = "auth.res";

/// Key replayed on a calc request.
const CALC_KEY: &str = "calc.res";

/// Snapshot bundles replayed after auth, in order: positions, wallets,
/// orders, then funding offers/credits/loans and active trades.
const SNAPSHOT_KEYS: &[&str] = &["ps", "ws", "os", "fos", "fcs", "fls", "ats"];

/// Shared state for the stream server and its control plane.
pub struct StreamState {
    dispatcher: Dispatcher,
    sync_on_connect: Arc<AtomicBool>,
    broadcast: broadcast::Sender<String>,
}

impl StreamState {
    pub fn new(table: Arc<ResponseTable>, sync_on_connect: bool) -> Arc<Self> {
        let (broadcast, _) = broadcast::channel(64);
        Arc::new(Self {
            dispatcher: Dispatcher::new(table),
            sync_on_connect: Arc::new(AtomicBool::new(sync_on_connect)),
            broadcast,
        })
    }

    /// Sender used by the control plane to inject packets.
    pub fn broadcast(&self) -> broadcast::Sender<String> {
        self.broadcast.clone()
    }

    /// Runtime snapshot-replay toggle, shared with the control plane.
    pub fn sync_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.sync_on_connect)
    }
}

/// Router accepting stream clients at the server root.
pub fn router(state: Arc<StreamState>) -> Router {
    Router::new().route("/", get(upgrade)).with_state(state)
}

async fn upgrade(
    State(state): State<Arc<StreamState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_client(socket, state))
}

async fn handle_client(socket: WebSocket, state: Arc<StreamState>) {
    let (mut tx, mut rx) = socket.split();
    let mut injected = state.broadcast.subscribe();

    debug!("stream client connected");

    if replay(&state, &mut tx, CONNECT_KEY).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            frame = rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if handle_frame(&state, &mut tx, text.as_str()).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Pings are answered by the transport layer.
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(%err, "stream client receive error");
                    break;
                }
            },
            packet = injected.recv() => match packet {
                Ok(text) => {
                    if tx.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "stream client lagged behind injected packets");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    debug!("stream client disconnected");
}

type StreamSink = SplitSink<WebSocket, Message>;

async fn handle_frame(
    state: &StreamState,
    tx: &mut StreamSink,
    text: &str,
) -> Result<(), axum::Error> {
    let event = match event::decode(text) {
        Ok(event) => event,
        Err(err) => {
            debug!(%err, "ignoring undecodable frame");
            return Ok(());
        }
    };

    match event {
        ClientEvent::Auth => {
            replay(state, tx, AUTH_KEY).await?;
            if state.sync_on_connect.load(Ordering::Relaxed) {
                for key in SNAPSHOT_KEYS {
                    replay(state, tx, key).await?;
                }
            }
        }
        ClientEvent::Subscribe { raw } => {
            let confirmation = confirm_subscription(raw);
            tx.send(Message::Text(confirmation.to_string().into()))
                .await?;
        }
        ClientEvent::Order(op) => replay(state, tx, op.response_key()).await?,
        ClientEvent::Calc => replay(state, tx, CALC_KEY).await?,
        ClientEvent::Unknown => {}
    }

    Ok(())
}

/// Echo a subscribe request back as confirmed, with a random channel id.
fn confirm_subscription(mut raw: Value) -> Value {
    let chan_id: u64 = rand::thread_rng().gen_range(0..10_000);

    if let Some(fields) = raw.as_object_mut() {
        fields.insert("event".to_string(), json!("subscribed"));
        fields.insert("chanId".to_string(), json!(chan_id));
    }

    raw
}

/// Send every packet of the bundle stored under `key` as one text frame.
///
/// An unknown key sends a diagnostic error frame. An expansion failure
/// (corrupt entry, reference cycle) is logged and sends nothing; the
/// connection stays up.
async fn replay(state: &StreamState, tx: &mut StreamSink, key: &str) -> Result<(), axum::Error> {
    if !state.dispatcher.table().contains(key) {
        let diag = json!({ "error": "no response configured" });
        return tx.send(Message::Text(diag.to_string().into())).await;
    }

    match state.dispatcher.expand(key) {
        Ok(packets) => {
            for packet in packets {
                tx.send(Message::Text(packet.to_string().into())).await?;
            }
            Ok(())
        }
        Err(err) => {
            warn!(%key, %err, "cannot expand response bundle");
            Ok(())
        }
    }
}
