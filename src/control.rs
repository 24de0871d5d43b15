//! Control-plane HTTP adapter.
//!
//! The command API test harnesses use to inspect and alter the response
//! table at runtime: exact-key get/set, plus (for the stream server)
//! arbitrary packet injection and runtime settings.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::table::ResponseTable;

/// Stream-server extras exposed through its control plane.
#[derive(Clone)]
pub struct StreamControl {
    /// Fan-out to every connected stream client.
    pub broadcast: tokio::sync::broadcast::Sender<String>,
    /// Runtime toggle for snapshot replay after auth.
    pub sync_on_connect: Arc<AtomicBool>,
}

#[derive(Clone)]
struct ControlState {
    table: Arc<ResponseTable>,
    stream: Option<StreamControl>,
}

/// Control-plane router for a request/response table.
pub fn router(table: Arc<ResponseTable>) -> Router {
    build(ControlState {
        table,
        stream: None,
    })
}

/// Control-plane router with stream extras (`POST /send`, `POST /config`).
pub fn stream_router(table: Arc<ResponseTable>, stream: StreamControl) -> Router {
    build(ControlState {
        table,
        stream: Some(stream),
    })
}

fn build(state: ControlState) -> Router {
    let mut app = Router::new();

    if state.stream.is_some() {
        app = app
            .route("/send", post(send_packet))
            .route("/config", post(set_runtime_config));
    }

    app.route("/{key}", get(get_response).post(set_response))
        .with_state(state)
}

async fn get_response(State(state): State<ControlState>, Path(key): Path<String>) -> Response {
    match state.table.get(&key) {
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unknown key" })),
        )
            .into_response(),
        Some(stored) => match stored.materialize(&key) {
            Ok(value) => Json(value).into_response(),
            Err(err) => {
                warn!(%key, %err, "stored response is unusable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "bad response json" })),
                )
                    .into_response()
            }
        },
    }
}

async fn set_response(
    State(state): State<ControlState>,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> StatusCode {
    debug!(%key, "control-plane set");
    state.table.set(key, value);
    StatusCode::OK
}

async fn send_packet(State(state): State<ControlState>, body: String) -> Response {
    let Some(stream) = state.stream.as_ref() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match serde_json::from_str::<Value>(&body) {
        Err(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid json data" })),
        )
            .into_response(),
        Ok(packet) => {
            debug!("injecting packet into stream");
            // A send error just means no clients are connected.
            let _ = stream.broadcast.send(packet.to_string());
            StatusCode::OK.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct RuntimeConfig {
    sync_on_connect: Option<bool>,
}

async fn set_runtime_config(State(state): State<ControlState>, body: String) -> Response {
    let Some(stream) = state.stream.as_ref() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let config: RuntimeConfig = match serde_json::from_str(&body) {
        Ok(config) => config,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid json config" })),
            )
                .into_response()
        }
    };

    if let Some(flag) = config.sync_on_connect {
        stream.sync_on_connect.store(flag, Ordering::Relaxed);
    }

    StatusCode::OK.into_response()
}
